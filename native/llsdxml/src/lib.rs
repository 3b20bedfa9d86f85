//! LlsdXml - LLSD XML decoding for Elixir
//!
//! Layers:
//! core:   byte scanner and XML tokenizer
//! reader: zero-copy pull reader producing well-nested XML events
//! llsd:   recursive-descent LLSD decoder, value model, binary codecs
//! term:   conversion of decoded values to BEAM terms

use rustler::{Binary, Env, NifResult, Term};

pub mod core;
pub mod llsd;
pub mod reader;
mod term;

pub use llsd::{decode, decode_array, decode_batch, decode_map, DecodeError, Decoder, Shape, Value};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Decoding
// ============================================================================

/// Decode one LLSD XML document.
/// Returns {:ok, term} or {:error, reason}
#[rustler::nif]
fn decode_xml<'a>(env: Env<'a>, input: Binary<'a>, shape: Term<'a>) -> NifResult<Term<'a>> {
    let shape = term::shape_from_term(shape)?;
    term::result_to_term(env, llsd::decode(input.as_slice(), shape))
}

/// Decode many documents in parallel.
/// Returns a list of {:ok, term} | {:error, reason} in input order
#[rustler::nif(schedule = "DirtyCpu")]
fn decode_xml_batch<'a>(env: Env<'a>, inputs: Vec<Binary<'a>>, shape: Term<'a>) -> NifResult<Term<'a>> {
    let shape = term::shape_from_term(shape)?;
    let slices: Vec<&[u8]> = inputs.iter().map(|b| b.as_slice()).collect();
    let results = llsd::decode_batch(&slices, shape);

    let mut list = Term::list_new_empty(env);
    for result in results.into_iter().rev() {
        list = list.list_prepend(term::result_to_term(env, result)?);
    }
    Ok(list)
}

// ============================================================================
// NIF Initialization
// ============================================================================

rustler::init!("Elixir.LlsdXml.Native");
