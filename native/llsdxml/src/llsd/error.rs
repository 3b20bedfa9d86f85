use super::decoder::Shape;
use crate::core::tokenizer::ParseError;
use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Fatal failures while decoding an LLSD XML document.
///
/// Malformed scalar payloads never show up here; they decode to the
/// default value of their kind instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The document is not well-formed XML.
    #[error("malformed XML: {0}")]
    Xml(#[from] ParseError),
    /// The input ended without an `<llsd>` element.
    #[error("no <llsd> element found")]
    MissingRoot,
    /// `<llsd>` contained something other than map, array or undef.
    #[error("unexpected element type <{0}> under <llsd>")]
    UnexpectedRoot(String),
    /// An element name that is not an LLSD type.
    #[error("unexpected element <{0}>")]
    UnexpectedElement(String),
    /// A scalar element contained a child element.
    #[error("unexpected start element <{child}> in <{parent}>")]
    NestedElement {
        /// Scalar element being read.
        parent: &'static str,
        /// Offending child.
        child: String,
    },
    /// A map had a value where a `<key>` was required.
    #[error("expected <key>, got <{0}>")]
    ExpectedKey(String),
    /// A map closed right after a `<key>`.
    #[error("map key {0:?} has no value")]
    DanglingKey(String),
    /// A container was closed by the wrong end tag.
    #[error("closing element </{found}> inside <{container}>")]
    MismatchedClose {
        /// Container being read.
        container: &'static str,
        /// End tag that was seen.
        found: String,
    },
    /// Character data was not UTF-8.
    #[error("character data in <{0}> is not valid UTF-8")]
    InvalidUtf8(&'static str),
    /// `<binary encoding="...">` named an unknown codec.
    #[error("unsupported binary encoding {0:?}")]
    UnknownEncoding(String),
    /// A binary payload could not be decoded.
    #[error("invalid {encoding} payload: {reason}")]
    Binary {
        /// Codec in use.
        encoding: &'static str,
        /// Codec error.
        reason: String,
    },
    /// The decoded root cannot be bound to the requested shape.
    #[error("cannot bind a {found} root to {expected}")]
    ShapeMismatch {
        /// Shape requested by the caller.
        expected: Shape,
        /// Element name of the decoded root.
        found: &'static str,
    },
}
