//! XML Entity Decoding
//!
//! Handles decoding of XML entities:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//!
//! Uses Cow for zero-copy when no entities are present. There is no DTD
//! support, so any other named reference is an error.

use memchr::memchr;
use std::borrow::Cow;

/// Decode text content, handling entity references
///
/// Returns Borrowed if no entities present (zero-copy),
/// returns Owned if entities were decoded.
#[inline]
pub fn decode_text(input: &[u8]) -> Result<Cow<'_, [u8]>, &'static str> {
    if memchr(b'&', input).is_none() {
        return Ok(Cow::Borrowed(input));
    }
    decode_entities(input).map(Cow::Owned)
}

fn decode_entities(input: &[u8]) -> Result<Vec<u8>, &'static str> {
    let mut result = Vec::with_capacity(input.len());
    let mut pos = 0;

    while let Some(amp_offset) = memchr(b'&', &input[pos..]) {
        result.extend_from_slice(&input[pos..pos + amp_offset]);
        pos += amp_offset;

        let semi_offset = memchr(b';', &input[pos..]).ok_or("Bare '&' in character data")?;
        let entity = &input[pos + 1..pos + semi_offset];

        let mut utf8 = [0u8; 4];
        let decoded = decode_entity(entity)?;
        result.extend_from_slice(decoded.encode_utf8(&mut utf8).as_bytes());
        pos += semi_offset + 1;
    }

    result.extend_from_slice(&input[pos..]);
    Ok(result)
}

/// Decode a single entity (without & and ;)
fn decode_entity(entity: &[u8]) -> Result<char, &'static str> {
    match entity {
        b"lt" => Ok('<'),
        b"gt" => Ok('>'),
        b"amp" => Ok('&'),
        b"quot" => Ok('"'),
        b"apos" => Ok('\''),
        [b'#', digits @ ..] => decode_numeric_entity(digits).ok_or("Invalid character reference"),
        [] => Err("Empty entity reference"),
        _ => Err("Undefined entity reference"),
    }
}

/// Decode a numeric character reference, rejecting code points that are
/// not XML 1.0 characters
fn decode_numeric_entity(digits: &[u8]) -> Option<char> {
    let codepoint = match digits {
        [b'x', hex @ ..] if !hex.is_empty() => {
            u32::from_str_radix(std::str::from_utf8(hex).ok()?, 16).ok()?
        }
        [] => return None,
        dec => std::str::from_utf8(dec).ok()?.parse::<u32>().ok()?,
    };

    if !is_valid_xml_char(codepoint) {
        return None;
    }
    char::from_u32(codepoint)
}

/// Check if a code point is a valid XML 1.0 Char
/// Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub fn is_valid_xml_char(codepoint: u32) -> bool {
    matches!(codepoint,
        0x9 | 0xA | 0xD |
        0x20..=0xD7FF |
        0xE000..=0xFFFD |
        0x10000..=0x10FFFF
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities() {
        let result = decode_text(b"Where's the beef?").unwrap();
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result.as_ref(), b"Where's the beef?");
    }

    #[test]
    fn test_basic_entities() {
        let result = decode_text(b"llSay(0, &quot;Hello, Avatar!&quot;) &amp;&amp; x &lt; 1").unwrap();
        assert_eq!(result.as_ref(), b"llSay(0, \"Hello, Avatar!\") && x < 1");
    }

    #[test]
    fn test_numeric_references() {
        assert_eq!(decode_text(b"&#65;&#x42;&#x1F600;").unwrap().as_ref(), "AB😀".as_bytes());
    }

    #[test]
    fn test_undefined_entity() {
        assert!(decode_text(b"&nbsp;").is_err());
    }

    #[test]
    fn test_bare_ampersand() {
        assert!(decode_text(b"fish & chips").is_err());
    }

    #[test]
    fn test_invalid_char_reference() {
        assert!(decode_text(b"&#0;").is_err());
        assert!(decode_text(b"&#x;").is_err());
    }
}
