//! LLSD XML Decoder
//!
//! Single-pass recursive descent over the `SliceReader` event stream.
//! Each element name maps to one parsing routine through `Tag`; map values,
//! array items and the document root all go through `parse_value`, so a
//! value is decoded the same way wherever it appears.
//!
//! Structural problems abort the whole decode. Scalar payloads that do not
//! parse fall back to the default of their kind:
//!
//! | element     | malformed / empty                 |
//! |-------------|-----------------------------------|
//! | `boolean`   | `false`                           |
//! | `integer`   | `0`                               |
//! | `real`      | `0.0`                             |
//! | `string`    | (never malformed) / `""`          |
//! | `uuid`      | nil UUID                          |
//! | `date`      | Unix epoch                        |
//! | `uri`       | (never malformed) / `""`          |
//! | `binary`    | (codec errors are fatal) / empty  |

use super::binary::BinaryEncoding;
use super::error::{DecodeError, Result};
use super::value::{Array, Map, Value};
use crate::reader::{SliceReader, StartElement, XmlEvent};
use std::borrow::Cow;
use std::fmt;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::{debug, trace};
use uuid::Uuid;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");
const DATE_FORMAT_FRACTIONAL: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]Z");

/// What the caller expects the document root to be.
///
/// Only matters for an `<undef/>` root, which is coerced to an empty
/// container of the expected kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// An array; `<undef/>` becomes `[]`
    Sequence,
    /// A map; `<undef/>` becomes `{}`
    Mapping,
    /// Anything; `<undef/>` stays `Undefined`
    Any,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Shape::Sequence => "an array",
            Shape::Mapping => "a map",
            Shape::Any => "any value",
        })
    }
}

/// LLSD element names that carry a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Boolean,
    Integer,
    Real,
    String,
    Uuid,
    Date,
    Uri,
    Binary,
    Map,
    Array,
    Undef,
}

impl Tag {
    fn from_name(name: &[u8]) -> Option<Tag> {
        Some(match name {
            b"boolean" => Tag::Boolean,
            b"integer" => Tag::Integer,
            b"real" => Tag::Real,
            b"string" => Tag::String,
            b"uuid" => Tag::Uuid,
            b"date" => Tag::Date,
            b"uri" => Tag::Uri,
            b"binary" => Tag::Binary,
            b"map" => Tag::Map,
            b"array" => Tag::Array,
            b"undef" => Tag::Undef,
            _ => return None,
        })
    }

    fn name(self) -> &'static str {
        match self {
            Tag::Boolean => "boolean",
            Tag::Integer => "integer",
            Tag::Real => "real",
            Tag::String => "string",
            Tag::Uuid => "uuid",
            Tag::Date => "date",
            Tag::Uri => "uri",
            Tag::Binary => "binary",
            Tag::Map => "map",
            Tag::Array => "array",
            Tag::Undef => "undef",
        }
    }
}

/// Map parser state; the pending key travels with `ExpectingValue`
enum MapState {
    ExpectingKey,
    ExpectingValue(String),
}

/// Decode an LLSD XML document, binding an `<undef/>` root to `shape`
pub fn decode(input: &[u8], shape: Shape) -> Result<Value> {
    debug!(bytes = input.len(), %shape, "decoding LLSD XML");
    let result = Decoder::new(input).decode(shape);
    match &result {
        Ok(value) => debug!(root = value.kind(), len = value.len(), "decoded LLSD XML"),
        Err(e) => debug!(error = %e, "LLSD XML decode failed"),
    }
    result
}

/// Decode a document whose root must be an array (or `<undef/>`)
pub fn decode_array(input: &[u8]) -> Result<Array> {
    match decode(input, Shape::Sequence)? {
        Value::Array(items) => Ok(items),
        other => Err(DecodeError::ShapeMismatch {
            expected: Shape::Sequence,
            found: other.kind(),
        }),
    }
}

/// Decode a document whose root must be a map (or `<undef/>`)
pub fn decode_map(input: &[u8]) -> Result<Map> {
    match decode(input, Shape::Mapping)? {
        Value::Map(map) => Ok(map),
        other => Err(DecodeError::ShapeMismatch {
            expected: Shape::Mapping,
            found: other.kind(),
        }),
    }
}

/// Apply the caller's shape hint to the decoded root
fn bind(root: Value, shape: Shape) -> Result<Value> {
    match (root, shape) {
        (root @ (Value::Map(_) | Value::Array(_)), _) => Ok(root),
        (Value::Undefined, Shape::Sequence) => Ok(Value::Array(Array::new())),
        (Value::Undefined, Shape::Mapping) => Ok(Value::Map(Map::new())),
        (Value::Undefined, Shape::Any) => Ok(Value::Undefined),
        (other, expected) => Err(DecodeError::ShapeMismatch {
            expected,
            found: other.kind(),
        }),
    }
}

/// Recursive-descent decoder owning the event reader for one document
pub struct Decoder<'a> {
    reader: SliceReader<'a>,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Decoder {
            reader: SliceReader::new(input),
        }
    }

    /// Decode the document and bind its root to `shape`
    pub fn decode(mut self, shape: Shape) -> Result<Value> {
        let root = self.parse_llsd()?;
        bind(root, shape)
    }

    fn next_event(&mut self) -> Result<XmlEvent<'a>> {
        Ok(self.reader.next_event()?)
    }

    /// Find `<llsd>` and decode its single child
    fn parse_llsd(&mut self) -> Result<Value> {
        loop {
            match self.next_event()? {
                XmlEvent::StartElement(e) if e.local_name == b"llsd" => break,
                XmlEvent::StartElement(e) => {
                    trace!(element = %e.local_name_lossy(), "skipping element before <llsd>");
                    self.reader.skip_element()?;
                }
                XmlEvent::EndDocument => return Err(DecodeError::MissingRoot),
                _ => {}
            }
        }

        loop {
            match self.next_event()? {
                XmlEvent::EndElement(e) if e.local_name == b"llsd" => return Ok(Value::Undefined),
                XmlEvent::EndElement(e) => {
                    return Err(DecodeError::MismatchedClose {
                        container: "llsd",
                        found: e.local_name_lossy(),
                    })
                }
                XmlEvent::StartElement(e) => {
                    return match Tag::from_name(e.local_name) {
                        Some(Tag::Map | Tag::Array | Tag::Undef) => self.parse_value(&e),
                        _ => Err(DecodeError::UnexpectedRoot(e.local_name_lossy())),
                    }
                }
                _ => {}
            }
        }
    }

    /// Decode the element that `start` opened
    fn parse_value(&mut self, start: &StartElement<'a>) -> Result<Value> {
        let Some(tag) = Tag::from_name(start.local_name) else {
            return Err(DecodeError::UnexpectedElement(start.local_name_lossy()));
        };

        match tag {
            Tag::Boolean => self.parse_boolean().map(Value::Boolean),
            Tag::Integer => self.parse_integer().map(Value::Integer),
            Tag::Real => self.parse_real().map(Value::Real),
            Tag::String => self.parse_string(Tag::String.name()).map(Value::String),
            Tag::Uuid => self.parse_uuid().map(Value::Uuid),
            Tag::Date => self.parse_date().map(Value::Date),
            Tag::Uri => self.parse_string(Tag::Uri.name()).map(Value::Uri),
            Tag::Binary => {
                let encoding = BinaryEncoding::from_attribute(start.get_attribute_value("encoding"))?;
                self.parse_binary(encoding).map(Value::Binary)
            }
            Tag::Map => self.parse_map().map(Value::Map),
            Tag::Array => self.parse_array().map(Value::Array),
            Tag::Undef => self.parse_undef(),
        }
    }

    /// Collect the character data of a leaf element up to its end tag.
    ///
    /// `None` when the element has no character data at all.
    fn read_text(&mut self, element: &'static str) -> Result<Option<Cow<'a, [u8]>>> {
        let mut text: Option<Cow<'a, [u8]>> = None;
        loop {
            match self.next_event()? {
                XmlEvent::Text(chunk) | XmlEvent::CData(chunk) => match text.as_mut() {
                    None => text = Some(chunk),
                    Some(acc) => acc.to_mut().extend_from_slice(&chunk),
                },
                XmlEvent::StartElement(e) => {
                    return Err(DecodeError::NestedElement {
                        parent: element,
                        child: e.local_name_lossy(),
                    })
                }
                XmlEvent::EndElement(_) => return Ok(text),
                _ => {}
            }
        }
    }

    /// Character data as an owned string
    fn read_str(&mut self, element: &'static str) -> Result<Option<String>> {
        self.read_text(element)?
            .map(|text| String::from_utf8(text.into_owned()).map_err(|_| DecodeError::InvalidUtf8(element)))
            .transpose()
    }

    /// Read a non-string scalar. The text goes to `parse` untouched, so
    /// surrounding whitespace makes it malformed; empty and malformed
    /// payloads both yield `default`
    fn parse_scalar<T>(&mut self, tag: Tag, default: T, parse: impl FnOnce(&str) -> Option<T>) -> Result<T> {
        let Some(text) = self.read_str(tag.name())? else {
            return Ok(default);
        };
        Ok(parse(text.as_str()).unwrap_or_else(|| {
            trace!(element = tag.name(), text = %text, "malformed scalar, using default");
            default
        }))
    }

    fn parse_boolean(&mut self) -> Result<bool> {
        self.parse_scalar(Tag::Boolean, false, parse_bool)
    }

    fn parse_integer(&mut self) -> Result<i32> {
        self.parse_scalar(Tag::Integer, 0, |s| s.parse().ok())
    }

    fn parse_real(&mut self) -> Result<f64> {
        self.parse_scalar(Tag::Real, 0.0, |s| s.parse().ok())
    }

    fn parse_uuid(&mut self) -> Result<Uuid> {
        self.parse_scalar(Tag::Uuid, Uuid::nil(), parse_uuid_text)
    }

    fn parse_date(&mut self) -> Result<OffsetDateTime> {
        self.parse_scalar(Tag::Date, OffsetDateTime::UNIX_EPOCH, |s| {
            PrimitiveDateTime::parse(s, DATE_FORMAT)
                .or_else(|_| PrimitiveDateTime::parse(s, DATE_FORMAT_FRACTIONAL))
                .ok()
                .map(PrimitiveDateTime::assume_utc)
        })
    }

    /// String content is taken verbatim, whitespace included
    fn parse_string(&mut self, element: &'static str) -> Result<String> {
        Ok(self.read_str(element)?.unwrap_or_default())
    }

    fn parse_binary(&mut self, encoding: BinaryEncoding) -> Result<Vec<u8>> {
        match self.read_text(Tag::Binary.name())? {
            Some(text) => encoding.decode(&text),
            None => Ok(Vec::new()),
        }
    }

    fn parse_undef(&mut self) -> Result<Value> {
        self.reader.skip_element()?;
        Ok(Value::Undefined)
    }

    fn parse_map(&mut self) -> Result<Map> {
        let mut map = Map::new();
        let mut state = MapState::ExpectingKey;

        loop {
            match self.next_event()? {
                XmlEvent::StartElement(e) => {
                    state = match state {
                        MapState::ExpectingKey if e.local_name == b"key" => {
                            MapState::ExpectingValue(self.parse_string("key")?)
                        }
                        MapState::ExpectingKey => return Err(DecodeError::ExpectedKey(e.local_name_lossy())),
                        MapState::ExpectingValue(key) => {
                            let value = self.parse_value(&e)?;
                            map.insert(key, value);
                            MapState::ExpectingKey
                        }
                    };
                }
                XmlEvent::EndElement(e) => {
                    return match state {
                        MapState::ExpectingKey if e.local_name == b"map" => Ok(map),
                        MapState::ExpectingKey => Err(DecodeError::MismatchedClose {
                            container: "map",
                            found: e.local_name_lossy(),
                        }),
                        MapState::ExpectingValue(key) => Err(DecodeError::DanglingKey(key)),
                    }
                }
                _ => {}
            }
        }
    }

    fn parse_array(&mut self) -> Result<Array> {
        let mut items = Array::new();

        loop {
            match self.next_event()? {
                XmlEvent::StartElement(e) => items.push(self.parse_value(&e)?),
                XmlEvent::EndElement(e) if e.local_name == b"array" => return Ok(items),
                XmlEvent::EndElement(e) => {
                    return Err(DecodeError::MismatchedClose {
                        container: "array",
                        found: e.local_name_lossy(),
                    })
                }
                _ => {}
            }
        }
    }
}

/// Boolean lexical forms: 1/t/T/TRUE/true/True and 0/f/F/FALSE/false/False
fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Hyphenated UUID text, optionally behind a `urn:uuid:` prefix
fn parse_uuid_text(s: &str) -> Option<Uuid> {
    let hyphenated = match s.len() {
        36 => s,
        45 => {
            let prefix = s.get(..9).filter(|p| p.eq_ignore_ascii_case("urn:uuid:"))?;
            &s[prefix.len()..]
        }
        _ => return None,
    };
    Uuid::try_parse(hyphenated).ok()
}
