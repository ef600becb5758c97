//! The seam between the document state machines and the wire formats.
//!
//! [`TokenRead`] and [`TokenWrite`] carry the format-specific byte work; the
//! reader and writer trees in [`decode`](crate::decode) and
//! [`encode`](crate::encode) drive them and own every structural invariant
//! (single active child, size promises, map pairing). A format
//! implementation never tracks nesting — the callers pass the little context
//! it needs (`first`, `sized`, key position) on each call.

use crate::error::Result;

/// One parsed document header.
///
/// Containers report their declared length (`None` for indefinite CBOR and
/// for JSON, which has no declared lengths). After a `ByteString`/`TextString`
/// header the token reader is positioned inside the string payload and must
/// be drained through [`TokenRead::read_string`] before the next header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Header {
    /// CBOR `undefined`. Never produced by JSON.
    Undefined,
    /// Null.
    Null,
    /// Boolean.
    Boolean(bool),
    /// Nonnegative integer.
    Unsigned(u64),
    /// Negative integer.
    Signed(i64),
    /// 64-bit float (half/single widths are widened on read).
    Float(f64),
    /// Start of a byte string payload.
    ByteString,
    /// Start of a text string payload.
    TextString,
    /// Start of an array with an optional declared element count.
    Array(Option<u64>),
    /// Start of a map with an optional declared pair count.
    Map(Option<u64>),
}

/// Pull side of a wire format.
///
/// Implementations are single-pass tokenizers over a byte source. All
/// structural bookkeeping lives in the caller; the only state a tokenizer
/// carries across calls is the cursor of an open string payload.
pub trait TokenRead {
    /// Parse the next document header.
    ///
    /// `at_key` is true when the header is a map key (JSON requires a string
    /// there; CBOR ignores the hint).
    ///
    /// # Errors
    ///
    /// Returns a codec error on malformed input or an I/O error from the
    /// source.
    fn read_header(&mut self, at_key: bool) -> Result<Header>;

    /// Pull up to `buf.len()` bytes of the open string payload.
    ///
    /// Returns 0 exactly when the string is exhausted; the payload cursor is
    /// closed at that point. Never called with an empty buffer.
    ///
    /// # Errors
    ///
    /// Returns a codec error on malformed input or an I/O error from the
    /// source.
    fn read_string(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Decide whether an undeclared-length container has a further item.
    ///
    /// Called at an item boundary of an indefinite CBOR container or any
    /// JSON container; consumes the terminator when the answer is `false`
    /// and, for JSON, the separating comma when it is `true`.
    ///
    /// # Errors
    ///
    /// Returns a codec error on malformed input or an I/O error from the
    /// source.
    fn container_continues(&mut self, map: bool, first: bool) -> Result<bool>;

    /// Consume the key/value separator of a map pair (JSON `:`; CBOR no-op).
    ///
    /// # Errors
    ///
    /// Returns a codec error on malformed input or an I/O error from the
    /// source.
    fn pair_separator(&mut self) -> Result<()>;

    /// Number of source bytes consumed so far, for error offsets.
    fn position(&self) -> u64;
}

/// Push side of a wire format.
///
/// The writer tree guarantees call ordering: headers alternate with
/// completed string payloads, `element`/`key`/`value` precede the item they
/// introduce, and `end_*` matches the `begin_*` nesting.
pub trait TokenWrite {
    /// Emit a nonnegative integer.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the sink.
    fn write_unsigned(&mut self, value: u64) -> Result<()>;

    /// Emit a negative integer (`value < 0`; nonnegative values go through
    /// [`TokenWrite::write_unsigned`]).
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the sink.
    fn write_signed(&mut self, value: i64) -> Result<()>;

    /// Emit a 64-bit float.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the sink.
    fn write_float(&mut self, value: f64) -> Result<()>;

    /// Emit a boolean.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the sink.
    fn write_bool(&mut self, value: bool) -> Result<()>;

    /// Emit a null.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the sink.
    fn write_null(&mut self) -> Result<()>;

    /// Emit an undefined (JSON falls back to null).
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the sink.
    fn write_undefined(&mut self) -> Result<()>;

    /// Open a byte string, optionally with a declared byte count.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the sink.
    fn begin_bytes(&mut self, len: Option<u64>) -> Result<()>;

    /// Push byte-string payload.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the sink.
    fn write_bytes_chunk(&mut self, chunk: &[u8]) -> Result<()>;

    /// Close the byte string opened by the matching `begin_bytes`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the sink.
    fn end_bytes(&mut self, sized: bool) -> Result<()>;

    /// Open a text string, optionally with a declared byte count.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the sink.
    fn begin_text(&mut self, len: Option<u64>) -> Result<()>;

    /// Push text-string payload (UTF-8 bytes; not validated here).
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the sink.
    fn write_text_chunk(&mut self, chunk: &[u8]) -> Result<()>;

    /// Close the text string opened by the matching `begin_text`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the sink.
    fn end_text(&mut self, sized: bool) -> Result<()>;

    /// Open an array, optionally with a declared element count.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the sink.
    fn begin_array(&mut self, len: Option<u64>) -> Result<()>;

    /// Close an array; `sized` matches the `begin_array` call.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the sink.
    fn end_array(&mut self, sized: bool) -> Result<()>;

    /// Open a map, optionally with a declared pair count.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the sink.
    fn begin_map(&mut self, len: Option<u64>) -> Result<()>;

    /// Close a map; `sized` matches the `begin_map` call.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the sink.
    fn end_map(&mut self, sized: bool) -> Result<()>;

    /// Mark an array element boundary (JSON `,` when not first).
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the sink.
    fn element(&mut self, first: bool) -> Result<()>;

    /// Mark a map key boundary (JSON `,` when not first; scalars written
    /// until [`TokenWrite::value`] are key material).
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the sink.
    fn key(&mut self, first: bool) -> Result<()>;

    /// Mark a map value boundary (JSON `:`).
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the sink.
    fn value(&mut self) -> Result<()>;

    /// Commit buffered bytes to the sink. Called once by the root writer.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the sink.
    fn flush(&mut self) -> Result<()>;
}
