//! XML Reader Module
//!
//! - SliceReader: Zero-copy, well-formedness checking pull parser
//! - Events: XML event types for pull parsing

pub mod events;
pub mod slice;

pub use events::{EndElement, StartElement, XmlEvent};
pub use slice::SliceReader;
