//! # docstream
//!
//! Streaming encoder/decoder for self-describing document formats — CBOR
//! (RFC 7049) and JSON (RFC 8259) — unified under a single document model.
//!
//! ## Design principles
//!
//! - **Documents are never materialized.**
//!   Producers drive a strictly-typed writer tree; consumers pull through a
//!   strictly-typed reader tree. Bytes move in traversal order and memory
//!   use is bounded by nesting depth, not document size.
//! - **The borrow checker enforces the traversal contract.**
//!   Every child node borrows its parent's state: a parent cannot be
//!   advanced while a child is live, and a position cannot be written twice.
//!   What borrows cannot see — declared sizes, map key/value alternation,
//!   abandoned positions — is tracked at run time and reported as a
//!   distinguishable misuse error.
//! - **Formats plug into one model.**
//!   The [`TokenRead`]/[`TokenWrite`] seam carries the byte-level work; the
//!   document state machines above it are format-agnostic.
//!
//! ## Reading
//!
//! ```
//! use docstream::read_cbor;
//!
//! let bytes = [0x82, 0x18, 0x2a, 0x63, b'h', b'e', b'y']; // [42, "hey"]
//! let mut reader = read_cbor(&bytes[..]);
//! let mut array = reader.document()?.into_array()?;
//! assert_eq!(array.read()?.unwrap().into_unsigned()?, 42);
//! let text = array.read()?.unwrap().into_text_string()?.read_all_text()?;
//! assert_eq!(text, "hey");
//! assert!(array.read()?.is_none());
//! # Ok::<(), docstream::Error>(())
//! ```
//!
//! ## Writing
//!
//! ```
//! use docstream::write_json;
//!
//! let mut writer = write_json(Vec::new());
//! let mut array = writer.write_array()?;
//! array.append()?.write_u64(1)?;
//! array.append()?.write_bool(true)?;
//! array.finish()?;
//! let out = writer.finish()?.into_inner();
//! assert_eq!(out, b"[1,true]");
//! # Ok::<(), docstream::Error>(())
//! ```
//!
//! ## Feature flags
//!
//! - `simdutf8` *(default)*: SIMD validation for
//!   [`StringReader::read_all_text`].
//!
//! ## Safety
//!
//! This crate forbids `unsafe` code.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod cbor;
mod codec;
mod decode;
mod encode;
mod error;
mod filter;
mod float;
mod json;
mod stream;
mod tag;
mod utf8;

pub use crate::cbor::{read_cbor, write_cbor, CborTokenReader, CborTokenWriter};
pub use crate::codec::{Header, TokenRead, TokenWrite};
pub use crate::decode::{
    ArrayReader, Document, MapReader, Reader, StringReader, DEFAULT_MAX_DEPTH,
};
pub use crate::encode::{ArrayWriter, MapWriter, StringWriter, ValueWriter, Writer};
pub use crate::error::{
    CodecError, CodecErrorCode, Error, ErrorKind, MisuseCode, MisuseError, Result,
};
pub use crate::filter::FilteredMapReader;
pub use crate::json::{read_json, write_json, JsonTokenReader, JsonTokenWriter};
pub use crate::tag::Tag;
