//! XML Event Types
//!
//! Event types for pull-parser style XML processing.

use crate::core::attributes::Attribute;
use std::borrow::Cow;

/// XML parsing event
///
/// Self-closing tags are reported as a `StartElement` immediately
/// followed by an `EndElement`, so consumers never special-case them.
#[derive(Debug, Clone)]
pub enum XmlEvent<'a> {
    /// Start of an element: <name attrs...>
    StartElement(StartElement<'a>),
    /// End of an element: </name>
    EndElement(EndElement<'a>),
    /// Text content between tags (entities decoded)
    Text(Cow<'a, [u8]>),
    /// CDATA section content
    CData(Cow<'a, [u8]>),
    /// Comment content
    Comment(Cow<'a, [u8]>),
    /// Processing instruction: <?target data?>
    ProcessingInstruction {
        target: &'a [u8],
        data: Cow<'a, [u8]>,
    },
    /// XML declaration: <?xml version="1.0"?>
    XmlDeclaration,
    /// DOCTYPE declaration
    DocType,
    /// End of document
    EndDocument,
}

/// Start element event data
#[derive(Debug, Clone)]
pub struct StartElement<'a> {
    /// Full element name (may include prefix)
    pub name: &'a [u8],
    /// Local name (after colon)
    pub local_name: &'a [u8],
    /// Element attributes
    pub attributes: Vec<Attribute<'a>>,
}

impl<'a> StartElement<'a> {
    pub fn new(name: &'a [u8], attributes: Vec<Attribute<'a>>) -> Self {
        StartElement {
            name,
            local_name: local_name(name),
            attributes,
        }
    }

    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(self.name).ok()
    }

    /// Local name as text, lossily converted for use in messages
    pub fn local_name_lossy(&self) -> String {
        String::from_utf8_lossy(self.local_name).into_owned()
    }

    /// Get an attribute value by local name as string
    pub fn get_attribute_value(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.local_name.as_ref() == local_name.as_bytes())
            .and_then(|a| a.value_str())
    }
}

/// End element event data
#[derive(Debug, Clone)]
pub struct EndElement<'a> {
    /// Full element name
    pub name: &'a [u8],
    /// Local name (after colon)
    pub local_name: &'a [u8],
}

impl<'a> EndElement<'a> {
    pub fn new(name: &'a [u8]) -> Self {
        EndElement {
            name,
            local_name: local_name(name),
        }
    }

    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(self.name).ok()
    }

    pub fn local_name_lossy(&self) -> String {
        String::from_utf8_lossy(self.local_name).into_owned()
    }
}

/// Part of a qualified name after the prefix colon
fn local_name(name: &[u8]) -> &[u8] {
    match memchr::memchr(b':', name) {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

impl<'a> XmlEvent<'a> {
    pub fn is_start_element(&self) -> bool {
        matches!(self, XmlEvent::StartElement(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_element() {
        let elem = StartElement::new(b"llsd", vec![]);
        assert_eq!(elem.name_str(), Some("llsd"));
        assert_eq!(elem.local_name, b"llsd");
    }

    #[test]
    fn test_namespaced_element() {
        let elem = StartElement::new(b"ll:map", vec![]);
        assert_eq!(elem.name_str(), Some("ll:map"));
        assert_eq!(elem.local_name_lossy(), "map");

        let end = EndElement::new(b"ll:map");
        assert_eq!(end.local_name, b"map");
    }

    #[test]
    fn test_attribute_lookup() {
        let attrs = vec![Attribute::new(b"encoding", Cow::Borrowed(b"base85"))];
        let elem = StartElement::new(b"binary", attrs);
        assert_eq!(elem.get_attribute_value("encoding"), Some("base85"));
        assert_eq!(elem.get_attribute_value("missing"), None);
    }
}
