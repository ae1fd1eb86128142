use std::fmt;

/// Parse a human-friendly size such as `8MB`, `7.5 MiB` or `500KB` into bytes.
///
/// # Grammar
///
/// ```text
/// size       = separators? number separators? unit separators? ;
/// number     = digits [ "." digits ] ;
/// digits     = digit , { digit } ;
/// unit       = "b" | "k" | "kb" | "kib" | "m" | "mb" | "mib" | "g" | "gb" | "gib" ;
/// separators = { whitespace | "_" } ;
/// ```
///
/// Units are case-insensitive and all binary: `MB` and `MiB` both mean
/// 1 048 576 bytes, the convention upload caps are quoted in. Fractional
/// values are truncated to whole bytes. A unit is required and the result
/// must be greater than zero.
pub fn parse_size(value: &str) -> Result<u64, SizeParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SizeParseError::Empty);
    }

    if let Some((offset, ch)) = trimmed.char_indices().find(|(_, c)| !c.is_ascii()) {
        return Err(SizeParseError::UnexpectedChar {
            index: offset,
            found: ch,
        });
    }

    let bytes = trimmed.as_bytes();
    let len = bytes.len();
    let mut index = 0usize;

    let (mantissa, scale, number_len) = parse_number(bytes, index)?;
    index += number_len;

    skip_separators(bytes, &mut index);
    if index >= len {
        return Err(SizeParseError::ExpectedUnit { index, found: None });
    }

    let (unit, unit_len) = parse_unit(trimmed, bytes, index)?;
    index += unit_len;

    skip_separators(bytes, &mut index);
    if index < len {
        return Err(SizeParseError::UnexpectedChar {
            index,
            found: bytes[index] as char,
        });
    }

    let pow10 = 10u128
        .checked_pow(scale)
        .ok_or(SizeParseError::Overflow)?;
    let total = mantissa
        .checked_mul(unit.bytes())
        .ok_or(SizeParseError::Overflow)?
        / pow10;

    if total == 0 {
        return Err(SizeParseError::Zero);
    }

    u64::try_from(total).map_err(|_| SizeParseError::TooLarge)
}

fn parse_number(bytes: &[u8], mut index: usize) -> Result<(u128, u32, usize), SizeParseError> {
    if index >= bytes.len() {
        return Err(SizeParseError::ExpectedNumber { index, found: None });
    }

    if !bytes[index].is_ascii_digit() {
        return Err(SizeParseError::ExpectedNumber {
            index,
            found: Some(bytes[index] as char),
        });
    }

    let mut mantissa: u128 = 0;
    let mut scale: u32 = 0;
    let mut seen_decimal = false;
    let mut decimal_index = None;
    let mut consumed = 0usize;

    while index < bytes.len() {
        let byte = bytes[index];
        match byte {
            b'0'..=b'9' => {
                mantissa = mantissa
                    .checked_mul(10)
                    .and_then(|value| value.checked_add((byte - b'0') as u128))
                    .ok_or(SizeParseError::Overflow)?;
                if seen_decimal {
                    scale = scale.checked_add(1).ok_or(SizeParseError::Overflow)?;
                }
            }
            b'.' if !seen_decimal => {
                seen_decimal = true;
                decimal_index = Some(index);
            }
            b'.' => {
                return Err(SizeParseError::UnexpectedChar { index, found: '.' });
            }
            _ => break,
        }
        index += 1;
        consumed += 1;
    }

    if seen_decimal && scale == 0 {
        let dot_index = decimal_index.unwrap_or(index);
        return Err(SizeParseError::MissingFractionDigits { index: dot_index });
    }

    Ok((mantissa, scale, consumed))
}

fn parse_unit(original: &str, bytes: &[u8], index: usize) -> Result<(Unit, usize), SizeParseError> {
    let mut end = index;
    while end < bytes.len() && bytes[end].is_ascii_alphabetic() {
        end += 1;
    }

    if end == index {
        return Err(SizeParseError::ExpectedUnit {
            index,
            found: Some(bytes[index] as char),
        });
    }

    let symbol = &original[index..end];
    let unit = match symbol.to_ascii_lowercase().as_str() {
        "b" => Unit::Byte,
        "k" | "kb" | "kib" => Unit::Kibibyte,
        "m" | "mb" | "mib" => Unit::Mebibyte,
        "g" | "gb" | "gib" => Unit::Gibibyte,
        _ => {
            return Err(SizeParseError::UnknownUnit {
                index,
                found: symbol.to_string(),
            })
        }
    };

    Ok((unit, end - index))
}

fn skip_separators(bytes: &[u8], index: &mut usize) {
    while *index < bytes.len() {
        match bytes[*index] {
            b'_' => *index += 1,
            b if b.is_ascii_whitespace() => *index += 1,
            _ => break,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeParseError {
    Empty,
    ExpectedNumber { index: usize, found: Option<char> },
    ExpectedUnit { index: usize, found: Option<char> },
    UnknownUnit { index: usize, found: String },
    MissingFractionDigits { index: usize },
    UnexpectedChar { index: usize, found: char },
    Zero,
    Overflow,
    TooLarge,
}

impl std::error::Error for SizeParseError {}

impl fmt::Display for SizeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeParseError::Empty => write!(f, "size cannot be empty"),
            SizeParseError::ExpectedNumber { index, found } => match found {
                Some(ch) => write!(
                    f,
                    "expected a number at position {} but found '{}'",
                    index + 1,
                    ch
                ),
                None => write!(f, "expected a number at position {}", index + 1),
            },
            SizeParseError::ExpectedUnit { index, found } => match found {
                Some(ch) => write!(
                    f,
                    "expected a unit (B, KB, MB, GB) at position {} but found '{}'",
                    index + 1,
                    ch
                ),
                None => write!(
                    f,
                    "expected a unit (B, KB, MB, GB) at position {}",
                    index + 1
                ),
            },
            SizeParseError::UnknownUnit { index, found } => {
                write!(f, "unknown unit '{}' at position {}", found, index + 1)
            }
            SizeParseError::MissingFractionDigits { index } => write!(
                f,
                "expected digits after decimal point at position {}",
                index + 1
            ),
            SizeParseError::UnexpectedChar { index, found } => write!(
                f,
                "unexpected character '{}' at position {}",
                found,
                index + 1
            ),
            SizeParseError::Zero => write!(f, "size must be greater than zero"),
            SizeParseError::Overflow => write!(f, "size is too large"),
            SizeParseError::TooLarge => {
                write!(f, "size exceeds the maximum of {} bytes", u64::MAX)
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Unit {
    Byte,
    Kibibyte,
    Mebibyte,
    Gibibyte,
}

impl Unit {
    fn bytes(self) -> u128 {
        match self {
            Unit::Byte => 1,
            Unit::Kibibyte => 1 << 10,
            Unit::Mebibyte => 1 << 20,
            Unit::Gibibyte => 1 << 30,
        }
    }
}
