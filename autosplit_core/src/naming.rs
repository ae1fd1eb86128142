use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// How chunk files are named relative to the source file.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum NamingPolicy {
    /// Leave the source untouched and write `<source>_part<N>.mp3`, N from 1.
    #[default]
    AppendSuffix,
    /// Move the source to `<base>_part1.mp3` and write chunks from
    /// `<base>_part2.mp3` onwards, so the original name is freed.
    PreserveAndRenumber,
}

impl NamingPolicy {
    /// Path of the chunk with 1-based `number` in the plan.
    pub fn chunk_path(self, source: &Path, number: usize) -> PathBuf {
        match self {
            NamingPolicy::AppendSuffix => {
                let mut name = OsString::from(source.as_os_str());
                name.push(format!("_part{number}.mp3"));
                PathBuf::from(name)
            }
            NamingPolicy::PreserveAndRenumber => renumbered(source, number + 1),
        }
    }

    /// Where the source file ends up once a split completes.
    pub fn preserved_source_path(self, source: &Path) -> Option<PathBuf> {
        match self {
            NamingPolicy::AppendSuffix => None,
            NamingPolicy::PreserveAndRenumber => Some(renumbered(source, 1)),
        }
    }
}

fn renumbered(source: &Path, part: usize) -> PathBuf {
    let mut name = source
        .file_stem()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(format!("_part{part}.mp3"));
    source.with_file_name(name)
}
