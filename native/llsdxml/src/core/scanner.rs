//! SIMD-accelerated byte scanning using memchr
//!
//! Cursor over the raw document bytes. All delimiter searches go through
//! memchr / memmem so the hot loops stay vectorized:
//! - SSE2 (default x86_64)
//! - AVX2 (runtime detection)
//! - NEON (aarch64)

use memchr::{memchr, memmem};

/// Byte cursor for XML delimiter detection
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Bytes from the cursor to the end of input
    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos.min(self.input.len())..]
    }

    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &'a [u8] {
        &self.input[start..end]
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    /// Skip whitespace characters (space, tab, newline, carriage return)
    #[inline]
    pub fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() {
            match self.input[self.pos] {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                _ => break,
            }
        }
    }

    /// Check if the cursor sits on whitespace
    #[inline]
    pub fn at_whitespace(&self) -> bool {
        matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r'))
    }

    /// Find next '<' (tag start)
    #[inline]
    pub fn find_tag_start(&self) -> Option<usize> {
        memchr(b'<', self.remaining()).map(|i| self.pos + i)
    }

    /// Find the '>' closing the current tag, ignoring any inside quoted
    /// attribute values
    pub fn find_tag_end_quoted(&self) -> Option<usize> {
        let mut pos = self.pos;
        let mut quote: Option<u8> = None;

        while pos < self.input.len() {
            let b = self.input[pos];
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None => match b {
                    b'"' | b'\'' => quote = Some(b),
                    b'>' => return Some(pos),
                    _ => {}
                },
            }
            pos += 1;
        }
        None
    }

    /// Find the start of the next occurrence of `needle`
    #[inline]
    pub fn find(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(self.remaining(), needle).map(|i| self.pos + i)
    }

    /// Check if input starts with a byte sequence at current position
    #[inline]
    pub fn starts_with(&self, needle: &[u8]) -> bool {
        self.remaining().starts_with(needle)
    }

    /// Read an XML name, advancing past it
    pub fn read_name(&mut self) -> Option<&'a [u8]> {
        let start = self.pos;
        let first = *self.input.get(start)?;
        if !is_name_start_char(first) {
            return None;
        }

        self.pos += 1;
        while self.pos < self.input.len() && is_name_char(self.input[self.pos]) {
            self.pos += 1;
        }

        Some(&self.input[start..self.pos])
    }
}

/// Check if byte is valid XML name start character
/// Allows ASCII letters, underscore, colon, and non-ASCII (UTF-8 Unicode)
#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

/// Check if byte is valid XML name character
#[inline]
pub fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}

#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_tag_start() {
        let scanner = Scanner::new(b"  <llsd>");
        assert_eq!(scanner.find_tag_start(), Some(2));
    }

    #[test]
    fn test_find_tag_end_quoted() {
        let scanner = Scanner::new(b"<binary encoding='>b64'>AAAA");
        assert_eq!(scanner.find_tag_end_quoted(), Some(23));
    }

    #[test]
    fn test_find_needle() {
        let mut scanner = Scanner::new(b"<!-- a - b -->rest");
        scanner.advance(4);
        assert_eq!(scanner.find(b"-->"), Some(11));
    }

    #[test]
    fn test_read_name() {
        let mut scanner = Scanner::new(b"creation-date>");
        assert_eq!(scanner.read_name(), Some(b"creation-date" as &[u8]));
        assert_eq!(scanner.position(), 13);
    }

    #[test]
    fn test_read_name_rejects_digit_start() {
        let mut scanner = Scanner::new(b"1abc");
        assert_eq!(scanner.read_name(), None);
        assert_eq!(scanner.position(), 0);
    }
}
