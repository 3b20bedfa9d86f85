//! LLSD XML decoding
//!
//! Turns an LLSD XML document into a [`Value`] tree.

pub mod batch;
pub mod binary;
pub mod decoder;
pub mod error;
pub mod value;

pub use batch::decode_batch;
pub use binary::BinaryEncoding;
pub use decoder::{decode, decode_array, decode_map, Decoder, Shape};
pub use error::{DecodeError, Result};
pub use value::{Array, Map, Value};
