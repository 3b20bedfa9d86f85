//! Elixir Term Conversion Utilities
//!
//! Converts decoded LLSD values to Elixir terms.

use crate::llsd::{DecodeError, Shape, Value};
use rustler::{Atom, Encoder, Env, Error, NewBinary, NifResult, Term};
use uuid::Uuid;

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    ok,
    error,
    undefined,
    uuid,
    date,
    uri,
    binary,
    array,
    map,
    any,
}

/// Convert a decoded value to an Elixir term
///
/// Scalars that have no native BEAM counterpart are tagged:
/// `{:uuid, "hyphenated"}`, `{:date, unix_seconds}`, `{:uri, binary}` and
/// `{:binary, bytes}`. Maps use binary keys.
pub fn value_to_term<'a>(env: Env<'a>, value: &Value) -> NifResult<Term<'a>> {
    Ok(match value {
        Value::Undefined => undefined().encode(env),
        Value::Boolean(b) => b.encode(env),
        Value::Integer(i) => i.encode(env),
        Value::Real(r) => r.encode(env),
        Value::String(s) => bytes_to_binary(env, s.as_bytes()),
        Value::Uuid(u) => {
            let mut buf = Uuid::encode_buffer();
            let text = u.hyphenated().encode_lower(&mut buf);
            (uuid(), bytes_to_binary(env, text.as_bytes())).encode(env)
        }
        Value::Date(d) => (date(), d.unix_timestamp()).encode(env),
        Value::Uri(s) => (uri(), bytes_to_binary(env, s.as_bytes())).encode(env),
        Value::Binary(bytes) => (binary(), bytes_to_binary(env, bytes)).encode(env),
        Value::Array(items) => {
            // Build in reverse so each prepend is O(1)
            let mut list = Term::list_new_empty(env);
            for item in items.iter().rev() {
                list = list.list_prepend(value_to_term(env, item)?);
            }
            list
        }
        Value::Map(entries) => {
            let pairs = entries
                .iter()
                .map(|(key, value)| Ok((bytes_to_binary(env, key.as_bytes()), value_to_term(env, value)?)))
                .collect::<NifResult<Vec<_>>>()?;
            Term::map_from_pairs(env, &pairs)?
        }
    })
}

/// `{:ok, term}` or `{:error, message}`
pub fn result_to_term<'a>(env: Env<'a>, result: Result<Value, DecodeError>) -> NifResult<Term<'a>> {
    match result {
        Ok(value) => Ok((ok(), value_to_term(env, &value)?).encode(env)),
        Err(e) => Ok((error(), e.to_string()).encode(env)),
    }
}

/// Shape hint from `:array`, `:map` or `:any`
pub fn shape_from_term(term: Term) -> NifResult<Shape> {
    let atom: Atom = term.decode()?;
    if atom == array() {
        Ok(Shape::Sequence)
    } else if atom == map() {
        Ok(Shape::Mapping)
    } else if atom == any() {
        Ok(Shape::Any)
    } else {
        Err(Error::BadArg)
    }
}

/// Create a binary from bytes
pub fn bytes_to_binary<'a>(env: Env<'a>, bytes: &[u8]) -> Term<'a> {
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}
