//! Binary payload codecs
//!
//! `<binary>` carries its bytes as base64 (the default), base85 or base16
//! text, selected by the `encoding` attribute. ASCII whitespace inside the
//! payload is ignored by all three codecs.

use super::error::{DecodeError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Payload encoding named by `<binary encoding="...">`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinaryEncoding {
    #[default]
    Base64,
    Base85,
    Base16,
}

impl BinaryEncoding {
    /// Resolve the attribute value; a missing attribute means base64
    pub fn from_attribute(value: Option<&str>) -> Result<Self> {
        match value {
            None | Some("") | Some("base64") => Ok(BinaryEncoding::Base64),
            Some("base85") => Ok(BinaryEncoding::Base85),
            Some("base16") => Ok(BinaryEncoding::Base16),
            Some(other) => Err(DecodeError::UnknownEncoding(other.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BinaryEncoding::Base64 => "base64",
            BinaryEncoding::Base85 => "base85",
            BinaryEncoding::Base16 => "base16",
        }
    }

    /// Decode the element's character data
    pub fn decode(self, text: &[u8]) -> Result<Vec<u8>> {
        let compact: Vec<u8> = text.iter().copied().filter(|b| !b.is_ascii_whitespace()).collect();
        let decoded = match self {
            BinaryEncoding::Base64 => STANDARD.decode(&compact).map_err(|e| e.to_string()),
            BinaryEncoding::Base85 => decode_base85(&compact),
            BinaryEncoding::Base16 => hex::decode(&compact).map_err(|e| e.to_string()),
        };
        decoded.map_err(|reason| DecodeError::Binary {
            encoding: self.name(),
            reason,
        })
    }
}

/// Ascii85 (btoa) decoding with optional `<~ ~>` delimiters and the `z`
/// shorthand for four zero bytes
fn decode_base85(input: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let input = input.strip_prefix(b"<~").unwrap_or(input);
    let input = input.strip_suffix(b"~>").unwrap_or(input);

    // Every input byte expands to at most four output bytes ('z')
    let mut out = vec![0u8; input.len() * 4];
    let mut written = 0;
    let mut group = [0u8; 5];
    let mut filled = 0;

    for (offset, &b) in input.iter().enumerate() {
        match b {
            b'z' if filled == 0 => {
                out[written..written + 4].fill(0);
                written += 4;
            }
            b'!'..=b'u' => {
                group[filled] = b - b'!';
                filled += 1;
                if filled == 5 {
                    let word = base85_word(&group).ok_or_else(|| format!("group overflow at byte {offset}"))?;
                    out[written..written + 4].copy_from_slice(&word.to_be_bytes());
                    written += 4;
                    filled = 0;
                }
            }
            _ => return Err(format!("illegal character {:?} at byte {offset}", b as char)),
        }
    }

    match filled {
        0 => {}
        1 => return Err("truncated final group".to_string()),
        n => {
            // Pad with the highest digit, keep n - 1 bytes
            group[n..].fill(84);
            let word = base85_word(&group).ok_or_else(|| "final group overflow".to_string())?;
            out[written..written + n - 1].copy_from_slice(&word.to_be_bytes()[..n - 1]);
            written += n - 1;
        }
    }

    out.truncate(written);
    Ok(out)
}

fn base85_word(digits: &[u8; 5]) -> Option<u32> {
    let value = digits.iter().fold(0u64, |acc, &d| acc * 85 + u64::from(d));
    u32::try_from(value).ok()
}
