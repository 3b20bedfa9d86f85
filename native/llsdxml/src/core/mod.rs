//! Core XML parsing primitives
//!
//! This module contains the fundamental building blocks for XML parsing:
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Tokenizer: State machine for XML token extraction
//! - Entities: XML entity decoding with Cow (zero-copy when possible)
//! - Attributes: Attribute parsing and extraction

pub mod attributes;
pub mod entities;
pub mod scanner;
pub mod tokenizer;
