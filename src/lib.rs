//! A streaming codec for JSON5, the JSON superset that allows comments,
//! trailing commas, single-quoted and unquoted-key strings, and a handful
//! of extra numeric literals (`NaN`, `Infinity`, hex, leading/trailing
//! decimal points).
//!
//! The crate is built in four layers, each usable on its own:
//!
//! - [`tokenizer`] — a UTF-8 lexical scanner ([`tokenizer::Tokenizer`]) that
//!   accepts input in arbitrary byte chunks and emits [`tokenizer::Token`]s.
//! - [`parser`] — a grammar state machine ([`parser::Parser`]) that
//!   consumes tokens and assembles a [`value::Value`] tree.
//! - [`value`] — the value model itself: a tagged union over null, bool,
//!   int, float, `NaN`/`Infinity`, string, [`value::Array`], and
//!   [`value::Object`] (an open-addressed hash map written for this crate
//!   rather than borrowed from `std`).
//! - [`writer`] — serializes a [`value::Value`] back to JSON5 text.
//!
//! [`codec::decode`] and [`codec::encode`] wire the layers together for the
//! common case of a document that's already fully in memory.
//!
//! ```
//! use json5_codec::{decode, encode};
//!
//! let value = decode(br#"{ name: 'json5', tags: ["a", "b",] }"#).unwrap();
//! let obj = value.as_object().unwrap();
//! assert_eq!(obj.get(b"name").unwrap().as_str(), Some(&b"json5"[..]));
//!
//! let bytes = encode(&value).unwrap();
//! assert_eq!(decode(&bytes).unwrap(), value);
//! ```

mod codec;
pub mod error;
pub mod parser;
#[cfg(test)]
mod serde_cross_check;
pub mod tokenizer;
mod unicode;
pub mod util;
pub mod value;
pub mod writer;

pub use codec::{decode, decode_with_log, encode, encode_with};
pub use error::Error;
pub use parser::Parser;
pub use tokenizer::{Token, TokenKind, Tokenizer};
pub use value::{set_hash_seed, Array, Object, Value};
pub use writer::WriteOptions;
