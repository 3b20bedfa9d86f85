//! XML Tokenizer - State machine for XML token extraction
//!
//! Implements a pull-parser style tokenizer that extracts XML tokens:
//! - Element start/end tags (attributes parsed eagerly)
//! - Text content (entities decoded)
//! - CDATA sections
//! - Comments
//! - Processing instructions and the XML declaration
//! - DOCTYPE declarations (skipped over, internal subset included)
//!
//! Lexical errors are never recovered from: the first one is returned and
//! the tokenizer stops.

use super::attributes::{parse_attributes, Attribute};
use super::entities::decode_text;
use super::scanner::Scanner;
use std::borrow::Cow;
use thiserror::Error;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Current parsing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Initial state before parsing starts
    Init,
    /// Between tags
    InsideText,
    /// Inside a markup construct (<...>)
    InsideMarkup,
    /// End of input reached, or a lexical error was returned
    Done,
}

/// Type of XML token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Element start tag: <element>
    StartTag,
    /// Element end tag: </element>
    EndTag,
    /// Empty element: <element/>
    EmptyTag,
    /// Text content
    Text,
    /// CDATA section: <![CDATA[...]]>
    CData,
    /// Comment: <!--...-->
    Comment,
    /// Processing instruction: <?target ...?>
    ProcessingInstruction,
    /// XML declaration: <?xml ...?>
    XmlDeclaration,
    /// DOCTYPE declaration
    DocType,
    /// End of file
    Eof,
}

/// A parsed XML token
#[derive(Debug, Clone)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw span in input (start, end)
    pub span: (usize, usize),
    /// For tags and PIs: the name / target
    pub name: Option<&'a [u8]>,
    /// For text/cdata/comments/PIs: the content (owned only if entities were decoded)
    pub content: Option<Cow<'a, [u8]>>,
    /// For start and empty tags
    pub attributes: Vec<Attribute<'a>>,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, span: (usize, usize)) -> Self {
        Token {
            kind,
            span,
            name: None,
            content: None,
            attributes: Vec::new(),
        }
    }

    fn with_name(mut self, name: &'a [u8]) -> Self {
        self.name = Some(name);
        self
    }

    fn with_content(mut self, content: Cow<'a, [u8]>) -> Self {
        self.content = Some(content);
        self
    }

    fn with_attributes(mut self, attributes: Vec<Attribute<'a>>) -> Self {
        self.attributes = attributes;
        self
    }
}

/// A well-formedness violation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at byte {position})")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        ParseError {
            message: message.into(),
            position,
        }
    }
}

/// XML tokenizer implementing a pull-parser pattern
pub struct Tokenizer<'a> {
    scanner: Scanner<'a>,
    state: ParseState,
    /// Offset of the first byte after any BOM and leading whitespace
    doc_start: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Tokenizer {
            scanner: Scanner::new(input),
            state: ParseState::Init,
            doc_start: 0,
        }
    }

    /// Record a lexical error and stop tokenizing
    fn fail<T>(&mut self, message: &str, position: usize) -> Result<T, ParseError> {
        self.state = ParseState::Done;
        Err(ParseError::new(message, position))
    }

    fn eof(&mut self) -> Token<'a> {
        self.state = ParseState::Done;
        let pos = self.scanner.position();
        Token::new(TokenKind::Eof, (pos, pos))
    }

    /// Get the next token. Once the input is exhausted every call yields `Eof`.
    pub fn next_token(&mut self) -> Result<Token<'a>, ParseError> {
        if self.state == ParseState::Done {
            return Ok(self.eof());
        }

        if self.state == ParseState::Init {
            if self.scanner.starts_with(UTF8_BOM) {
                self.scanner.advance(UTF8_BOM.len());
            }
            self.scanner.skip_whitespace();
            self.doc_start = self.scanner.position();
            self.state = ParseState::InsideText;
        }

        match self.scanner.peek() {
            Some(b'<') => self.parse_markup(),
            Some(_) => self.parse_text(),
            None => Ok(self.eof()),
        }
    }

    /// Parse markup starting with '<'
    fn parse_markup(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.scanner.position();
        self.scanner.advance(1); // Skip '<'
        self.state = ParseState::InsideMarkup;

        match self.scanner.peek() {
            Some(b'/') => self.parse_end_tag(start),
            Some(b'!') => self.parse_bang_markup(start),
            Some(b'?') => self.parse_pi(start),
            Some(_) => self.parse_start_tag(start),
            None => self.fail("Unexpected end of input after '<'", start),
        }
    }

    /// Parse a start tag or empty element tag
    fn parse_start_tag(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        let Some(name) = self.scanner.read_name() else {
            return self.fail("Invalid element name: must start with letter, underscore, or colon", start);
        };
        let name_end = self.scanner.position();

        let Some(end) = self.scanner.find_tag_end_quoted() else {
            return self.fail("Unterminated start tag", start);
        };

        let is_empty = end > name_end && self.scanner.slice(end - 1, end) == b"/";
        let attr_end = if is_empty { end - 1 } else { end };

        let attributes = match parse_attributes(self.scanner.slice(name_end, attr_end)) {
            Ok(attrs) => attrs,
            Err(msg) => return self.fail(msg, name_end),
        };

        self.scanner.set_position(end + 1);
        self.state = ParseState::InsideText;

        let kind = if is_empty { TokenKind::EmptyTag } else { TokenKind::StartTag };
        Ok(Token::new(kind, (start, end + 1))
            .with_name(name)
            .with_attributes(attributes))
    }

    /// Parse an end tag
    fn parse_end_tag(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(1); // Skip '/'

        let Some(name) = self.scanner.read_name() else {
            return self.fail("Invalid element name in end tag", start);
        };

        // Only whitespace may follow the name
        self.scanner.skip_whitespace();
        match self.scanner.peek() {
            Some(b'>') => {}
            Some(_) => return self.fail("End tag cannot have attributes or other content", start),
            None => return self.fail("Unterminated end tag", start),
        }

        self.scanner.advance(1);
        self.state = ParseState::InsideText;

        Ok(Token::new(TokenKind::EndTag, (start, self.scanner.position())).with_name(name))
    }

    /// Parse markup starting with '!' (comment, CDATA, DOCTYPE)
    fn parse_bang_markup(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(1); // Skip '!'

        if self.scanner.starts_with(b"--") {
            self.parse_comment(start)
        } else if self.scanner.starts_with(b"[CDATA[") {
            self.parse_cdata(start)
        } else if self.scanner.starts_with(b"DOCTYPE") {
            self.parse_doctype(start)
        } else {
            self.fail("Invalid declaration - expected comment, CDATA, or DOCTYPE", start)
        }
    }

    /// Parse a comment <!--...-->
    fn parse_comment(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(2); // Skip '--'
        let content_start = self.scanner.position();

        let Some(pos) = self.scanner.find(b"--") else {
            return self.fail("Unterminated comment", start);
        };
        self.scanner.set_position(pos);
        if !self.scanner.starts_with(b"-->") {
            return self.fail("'--' is not allowed inside a comment", pos);
        }

        let content = self.scanner.slice(content_start, pos);
        self.scanner.advance(3); // Skip '-->'
        self.state = ParseState::InsideText;

        Ok(Token::new(TokenKind::Comment, (start, self.scanner.position()))
            .with_content(Cow::Borrowed(content)))
    }

    /// Parse a CDATA section <![CDATA[...]]>
    fn parse_cdata(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(7); // Skip '[CDATA['
        let content_start = self.scanner.position();

        let Some(pos) = self.scanner.find(b"]]>") else {
            return self.fail("Unterminated CDATA section", start);
        };

        let content = self.scanner.slice(content_start, pos);
        self.scanner.set_position(pos + 3);
        self.state = ParseState::InsideText;

        Ok(Token::new(TokenKind::CData, (start, self.scanner.position()))
            .with_content(Cow::Borrowed(content)))
    }

    /// Skip over a DOCTYPE declaration, including any internal subset
    fn parse_doctype(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(7); // Skip 'DOCTYPE'

        if !self.scanner.at_whitespace() {
            return self.fail("Whitespace required after DOCTYPE", start);
        }

        let mut depth = 0usize;
        let mut quote: Option<u8> = None;

        while let Some(b) = self.scanner.peek() {
            self.scanner.advance(1);
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'[') => depth += 1,
                (None, b']') => depth = depth.saturating_sub(1),
                (None, b'>') if depth == 0 => {
                    self.state = ParseState::InsideText;
                    return Ok(Token::new(TokenKind::DocType, (start, self.scanner.position())));
                }
                _ => {}
            }
        }

        self.fail("Unterminated DOCTYPE declaration", start)
    }

    /// Parse a processing instruction <?...?>
    fn parse_pi(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(1); // Skip '?'

        let Some(name) = self.scanner.read_name() else {
            return self.fail("Invalid processing instruction target", start);
        };

        if !self.scanner.at_whitespace() && !self.scanner.starts_with(b"?>") {
            return self.fail("Invalid character after PI target name", start);
        }

        let content_start = self.scanner.position();
        let Some(pos) = self.scanner.find(b"?>") else {
            return self.fail("Unterminated processing instruction", start);
        };

        let content = self.scanner.slice(content_start, pos);
        self.scanner.set_position(pos + 2);
        self.state = ParseState::InsideText;

        let kind = if name == b"xml" {
            if start != self.doc_start {
                return self.fail("XML declaration must be at the very start of the document", start);
            }
            TokenKind::XmlDeclaration
        } else if name.eq_ignore_ascii_case(b"xml") {
            return self.fail("Processing instruction target cannot be 'xml' (reserved name)", start);
        } else {
            TokenKind::ProcessingInstruction
        };

        Ok(Token::new(kind, (start, self.scanner.position()))
            .with_name(name)
            .with_content(Cow::Borrowed(content)))
    }

    /// Parse text content up to the next '<'
    fn parse_text(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.scanner.position();
        self.state = ParseState::InsideText;

        let end = self
            .scanner
            .find_tag_start()
            .unwrap_or(start + self.scanner.remaining().len());
        let content = self.scanner.slice(start, end);

        let decoded = match decode_text(content) {
            Ok(decoded) => decoded,
            Err(msg) => return self.fail(msg, start),
        };

        self.scanner.set_position(end);
        Ok(Token::new(TokenKind::Text, (start, end)).with_content(decoded))
    }
}
