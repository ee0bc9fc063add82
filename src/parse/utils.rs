//! Some useful functions.

use crate::error::{ParseDataError, ParseError};

use std::str::{self, FromStr};

pub(super) type Cursor<'a> = &'a [u8];

/// Read exactly `count` bytes and reduce remaining data
pub(super) fn read_exact<'a>(cursor: &mut Cursor<'a>, count: usize) -> Result<&'a [u8], ParseDataError> {
    if count > cursor.len() {
        return Err(ParseDataError::UnexpectedEof);
    }

    let (result, tail) = cursor.split_at(count);
    *cursor = tail;
    Ok(result)
}

/// Read bytes if the remaining data is prefixed by the provided tag
pub(super) fn read_optional_tag(cursor: &mut Cursor<'_>, tag: &[u8]) -> Result<bool, ParseDataError> {
    if cursor.starts_with(tag) {
        read_exact(cursor, tag.len())?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Read bytes as long as the provided predicate is true
pub(super) fn read_while<'a, F: Fn(&u8) -> bool>(cursor: &mut Cursor<'a>, f: F) -> Result<&'a [u8], ParseDataError> {
    read_exact(cursor, cursor.iter().position(|x| !f(x)).unwrap_or(cursor.len()))
}

/// Parse integer from a slice of bytes
pub(super) fn parse_int<T: FromStr<Err = std::num::ParseIntError>>(bytes: &[u8]) -> Result<T, ParseError> {
    let text = str::from_utf8(bytes).map_err(|_| ParseDataError::InvalidData)?;
    Ok(text.parse()?)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cursor() -> Result<(), ParseError> {
        let mut cursor: Cursor<'_> = b"-12:30s";
        assert!(read_optional_tag(&mut cursor, b"-")?);
        assert!(!read_optional_tag(&mut cursor, b"-")?);
        assert_eq!(parse_int::<i32>(read_while(&mut cursor, u8::is_ascii_digit)?)?, 12);
        assert_eq!(read_exact(&mut cursor, 1)?, b":");
        assert_eq!(read_while(&mut cursor, u8::is_ascii_digit)?, b"30");
        assert_eq!(read_exact(&mut cursor, 2), Err(ParseDataError::UnexpectedEof));
        assert_eq!(cursor, b"s");
        assert!(parse_int::<i32>(b"").is_err());
        Ok(())
    }
}
