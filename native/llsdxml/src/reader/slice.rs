//! Zero-Copy Slice Reader
//!
//! Pull parser over a byte slice. Event payloads borrow from the input
//! unless entity decoding forced a copy. The reader tracks open elements,
//! so every event it hands out belongs to a well-nested document: a
//! mismatched or unbalanced end tag, or input ending inside an element,
//! is reported as a `ParseError` from `next_event`.

use super::events::{EndElement, StartElement, XmlEvent};
use crate::core::tokenizer::{ParseError, TokenKind, Tokenizer};

/// Zero-copy XML reader from a byte slice
pub struct SliceReader<'a> {
    tokenizer: Tokenizer<'a>,
    /// Names of the currently open elements, outermost first
    open: Vec<&'a [u8]>,
    /// End event still owed for a self-closing tag
    pending_end: Option<&'a [u8]>,
    /// Set once EndDocument or an error has been yielded by the iterator
    finished: bool,
}

impl<'a> SliceReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        SliceReader {
            tokenizer: Tokenizer::new(input),
            open: Vec::with_capacity(16),
            pending_end: None,
            finished: false,
        }
    }

    /// Number of currently open elements
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Get the next XML event
    pub fn next_event(&mut self) -> Result<XmlEvent<'a>, ParseError> {
        if let Some(name) = self.pending_end.take() {
            self.open.pop();
            return Ok(XmlEvent::EndElement(EndElement::new(name)));
        }

        let token = self.tokenizer.next_token()?;

        match token.kind {
            TokenKind::Eof => match self.open.last() {
                Some(name) => Err(ParseError::new(
                    format!("Unexpected end of input inside <{}>", String::from_utf8_lossy(name)),
                    token.span.0,
                )),
                None => Ok(XmlEvent::EndDocument),
            },

            TokenKind::StartTag | TokenKind::EmptyTag => {
                let name = token.name.unwrap_or_default();
                self.open.push(name);
                if token.kind == TokenKind::EmptyTag {
                    self.pending_end = Some(name);
                }
                Ok(XmlEvent::StartElement(StartElement::new(name, token.attributes)))
            }

            TokenKind::EndTag => {
                let name = token.name.unwrap_or_default();
                match self.open.pop() {
                    Some(open) if open == name => Ok(XmlEvent::EndElement(EndElement::new(name))),
                    Some(open) => Err(ParseError::new(
                        format!(
                            "Mismatched end tag: expected </{}>, found </{}>",
                            String::from_utf8_lossy(open),
                            String::from_utf8_lossy(name)
                        ),
                        token.span.0,
                    )),
                    None => Err(ParseError::new(
                        format!("Unexpected end tag </{}>", String::from_utf8_lossy(name)),
                        token.span.0,
                    )),
                }
            }

            TokenKind::Text => Ok(XmlEvent::Text(token.content.unwrap_or_default())),
            TokenKind::CData => Ok(XmlEvent::CData(token.content.unwrap_or_default())),
            TokenKind::Comment => Ok(XmlEvent::Comment(token.content.unwrap_or_default())),

            TokenKind::ProcessingInstruction => Ok(XmlEvent::ProcessingInstruction {
                target: token.name.unwrap_or_default(),
                data: token.content.unwrap_or_default(),
            }),

            TokenKind::XmlDeclaration => Ok(XmlEvent::XmlDeclaration),
            TokenKind::DocType => Ok(XmlEvent::DocType),
        }
    }

    /// Consume events up to and including the end tag of the most recently
    /// opened element. A no-op when no element is open.
    pub fn skip_element(&mut self) -> Result<(), ParseError> {
        let depth = self.open.len();
        if depth == 0 {
            return Ok(());
        }

        loop {
            match self.next_event()? {
                XmlEvent::EndElement(_) if self.open.len() < depth => return Ok(()),
                XmlEvent::EndDocument => return Ok(()),
                _ => {}
            }
        }
    }
}

impl<'a> Iterator for SliceReader<'a> {
    type Item = Result<XmlEvent<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_event() {
            Ok(XmlEvent::EndDocument) => {
                self.finished = true;
                None
            }
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(input: &[u8]) -> Vec<XmlEvent<'_>> {
        SliceReader::new(input).collect::<Result<Vec<_>, _>>().unwrap()
    }

    #[test]
    fn test_simple_element() {
        let events = events(b"<string>hello</string>");
        assert_eq!(events.len(), 3);

        assert!(matches!(&events[0], XmlEvent::StartElement(e) if e.name_str() == Some("string")));
        assert!(matches!(&events[1], XmlEvent::Text(t) if t.as_ref() == b"hello"));
        assert!(matches!(&events[2], XmlEvent::EndElement(e) if e.name_str() == Some("string")));
    }

    #[test]
    fn test_empty_element_expands() {
        let events = events(b"<llsd><undef/></llsd>");
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[1], XmlEvent::StartElement(e) if e.name_str() == Some("undef")));
        assert!(matches!(&events[2], XmlEvent::EndElement(e) if e.name_str() == Some("undef")));
    }

    #[test]
    fn test_attributes() {
        let events = events(b"<binary encoding=\"base64\"/>");
        match &events[0] {
            XmlEvent::StartElement(e) => assert_eq!(e.get_attribute_value("encoding"), Some("base64")),
            other => panic!("Expected StartElement, got {:?}", other),
        }
    }

    #[test]
    fn test_cdata_and_comment() {
        let events = events(b"<string><!-- note --><![CDATA[a<b]]></string>");
        assert!(matches!(&events[1], XmlEvent::Comment(_)));
        assert!(matches!(&events[2], XmlEvent::CData(c) if c.as_ref() == b"a<b"));
    }

    #[test]
    fn test_depth_tracking() {
        let mut reader = SliceReader::new(b"<a><b/></a>");
        reader.next_event().unwrap();
        assert_eq!(reader.depth(), 1);
        reader.next_event().unwrap();
        assert_eq!(reader.depth(), 2);
        reader.next_event().unwrap();
        assert_eq!(reader.depth(), 1);
        reader.next_event().unwrap();
        assert_eq!(reader.depth(), 0);
        assert!(matches!(reader.next_event().unwrap(), XmlEvent::EndDocument));
    }

    #[test]
    fn test_skip_subtree() {
        let mut reader = SliceReader::new(b"<meta><x><y>1</y></x><z/></meta><llsd/>");
        assert!(reader.next_event().unwrap().is_start_element());
        reader.skip_element().unwrap();
        assert_eq!(reader.depth(), 0);
        assert!(matches!(reader.next_event().unwrap(), XmlEvent::StartElement(e) if e.name_str() == Some("llsd")));
    }

    #[test]
    fn test_skip_self_closing() {
        let mut reader = SliceReader::new(b"<a><undef/><b/></a>");
        reader.next_event().unwrap();
        reader.next_event().unwrap();
        reader.skip_element().unwrap();
        assert_eq!(reader.depth(), 1);
        assert!(matches!(reader.next_event().unwrap(), XmlEvent::StartElement(e) if e.name_str() == Some("b")));
    }

    #[test]
    fn test_mismatched_end_tag() {
        let result: Result<Vec<_>, _> = SliceReader::new(b"<map><key>a</map></key>").collect();
        let err = result.unwrap_err();
        assert!(err.message.contains("Mismatched"));
    }

    #[test]
    fn test_unclosed_element() {
        let result: Result<Vec<_>, _> = SliceReader::new(b"<llsd><array>").collect();
        assert!(result.unwrap_err().message.contains("end of input"));
    }

    #[test]
    fn test_stray_end_tag() {
        let result: Result<Vec<_>, _> = SliceReader::new(b"</llsd>").collect();
        assert!(result.is_err());
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let mut reader = SliceReader::new(b"<a>");
        assert!(matches!(reader.next(), Some(Ok(_))));
        assert!(matches!(reader.next(), Some(Err(_))));
        assert!(reader.next().is_none());
    }
}
