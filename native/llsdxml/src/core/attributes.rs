//! XML Attribute Parsing
//!
//! Parses XML attributes from tag content.

use super::entities::decode_text;
use super::scanner::{is_name_char, is_name_start_char, is_whitespace};
use memchr::memchr;
use std::borrow::Cow;

/// A parsed XML attribute
#[derive(Debug, Clone)]
pub struct Attribute<'a> {
    /// Attribute name (may include namespace prefix)
    pub name: Cow<'a, [u8]>,
    /// Attribute value (entities decoded)
    pub value: Cow<'a, [u8]>,
    /// Local name (after colon, if namespaced)
    pub local_name: Cow<'a, [u8]>,
}

impl<'a> Attribute<'a> {
    pub fn new(name: &'a [u8], value: Cow<'a, [u8]>) -> Self {
        let local_name = match memchr(b':', name) {
            Some(colon_pos) => &name[colon_pos + 1..],
            None => name,
        };
        Attribute {
            name: Cow::Borrowed(name),
            value,
            local_name: Cow::Borrowed(local_name),
        }
    }

    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(self.name.as_ref()).ok()
    }

    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(self.value.as_ref()).ok()
    }

    pub fn local_name_str(&self) -> Option<&str> {
        std::str::from_utf8(self.local_name.as_ref()).ok()
    }
}

/// Parse attributes from raw tag content (after the element name)
///
/// Input should be the content between element name and '>' or '/>'.
/// Any deviation from `name="value"` / `name='value'` is an error.
pub fn parse_attributes(input: &[u8]) -> Result<Vec<Attribute<'_>>, &'static str> {
    let mut attrs: Vec<Attribute<'_>> = Vec::new();
    let mut pos = 0;

    loop {
        let ws_start = pos;
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }

        if pos >= input.len() {
            break;
        }

        // Attributes must be separated from the name and from each other
        if pos == ws_start {
            return Err("Whitespace required before attribute");
        }

        let name_start = pos;
        if !is_name_start_char(input[pos]) {
            return Err("Attribute name must start with letter, underscore, or colon");
        }
        while pos < input.len() && is_name_char(input[pos]) {
            pos += 1;
        }
        let name = &input[name_start..pos];

        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if input.get(pos) != Some(&b'=') {
            return Err("Attribute value required");
        }
        pos += 1;
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }

        let quote = match input.get(pos) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => return Err("Attribute value must be quoted"),
        };
        pos += 1;

        let value_start = pos;
        let value_len = memchr(quote, &input[value_start..]).ok_or("Attribute value has mismatched quotes")?;
        let value_bytes = &input[value_start..value_start + value_len];
        if memchr(b'<', value_bytes).is_some() {
            return Err("Attribute value cannot contain '<'");
        }
        pos = value_start + value_len + 1;

        if attrs.iter().any(|a| a.name.as_ref() == name) {
            return Err("Duplicate attribute");
        }

        attrs.push(Attribute::new(name, decode_text(value_bytes)?));
    }

    Ok(attrs)
}
