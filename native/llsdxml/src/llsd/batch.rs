//! Parallel Batch Decoding
//!
//! Uses Rayon to decode independent documents concurrently. Each document
//! gets its own decoder, so a failure in one never affects another.

use super::decoder::{decode, Shape};
use super::error::Result;
use super::value::Value;
use rayon::prelude::*;
use tracing::debug;

/// Decode every input with the same shape hint, preserving input order
pub fn decode_batch(inputs: &[&[u8]], shape: Shape) -> Vec<Result<Value>> {
    debug!(documents = inputs.len(), %shape, "decoding LLSD XML batch");
    inputs.par_iter().map(|input| decode(input, shape)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llsd::error::DecodeError;

    #[test]
    fn test_batch_preserves_order() {
        let docs: Vec<String> = (0..64)
            .map(|i| format!("<llsd><array><integer>{i}</integer></array></llsd>"))
            .collect();
        let inputs: Vec<&[u8]> = docs.iter().map(|d| d.as_bytes()).collect();

        let results = decode_batch(&inputs, Shape::Sequence);
        assert_eq!(results.len(), 64);
        for (i, result) in results.into_iter().enumerate() {
            assert_eq!(result.unwrap(), Value::Array(vec![Value::Integer(i as i32)]));
        }
    }

    #[test]
    fn test_batch_failures_are_independent() {
        let inputs: [&[u8]; 3] = [
            b"<llsd><map><key>a</key><string>x</string></map></llsd>",
            b"<llsd><array><foo/></array></llsd>",
            b"<llsd><undef/></llsd>",
        ];

        let results = decode_batch(&inputs, Shape::Mapping);
        assert_eq!(results[0].as_ref().unwrap()["a"], Value::String("x".into()));
        assert!(matches!(results[1], Err(DecodeError::UnexpectedElement(_))));
        assert_eq!(results[2], Ok(Value::Map(Default::default())));
    }

    #[test]
    fn test_empty_batch() {
        assert!(decode_batch(&[], Shape::Any).is_empty());
    }
}
