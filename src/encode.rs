//! SAX writer tree: produces one document, streaming every byte to the sink
//! in traversal order.
//!
//! Each child node ([`ValueWriter`], [`ArrayWriter`], [`MapWriter`],
//! [`StringWriter`]) borrows the encoder through its parent, so a parent
//! cannot be touched while a child is live, and a position cannot be written
//! twice. What borrows cannot see is tracked at run time and reported as a
//! misuse: a child dropped without `finish`, an appended position never
//! written, declared-size mismatches, and map key/value alternation.

use std::fmt;
use std::io;

use crate::codec::TokenWrite;
use crate::error::{Error, MisuseCode, Replay, Result};

pub(crate) struct Encoder<T> {
    tok: T,
    /// Number of open containers/strings below the root.
    depth: usize,
    /// An appended position exists whose document was not yet started.
    slot_pending: bool,
    poison: Option<Replay>,
}

impl<T: TokenWrite> Encoder<T> {
    fn check_poison(&self) -> Result<()> {
        match self.poison {
            Some(p) => Err(p.to_error()),
            None => Ok(()),
        }
    }

    fn poisoning<O>(&mut self, r: Result<O>) -> Result<O> {
        if let Err(e) = &r {
            if self.poison.is_none() {
                self.poison = Replay::capture(e);
            }
        }
        r
    }

    fn emit_unsigned(&mut self, value: u64) -> Result<()> {
        let r = self.tok.write_unsigned(value);
        self.poisoning(r)
    }

    /// Nonnegative values are emitted through the unsigned-integer kind.
    fn emit_integer(&mut self, value: i64) -> Result<()> {
        if value >= 0 {
            self.emit_unsigned(value.unsigned_abs())
        } else {
            let r = self.tok.write_signed(value);
            self.poisoning(r)
        }
    }

    fn emit_float(&mut self, value: f64) -> Result<()> {
        let r = self.tok.write_float(value);
        self.poisoning(r)
    }

    fn emit_bool(&mut self, value: bool) -> Result<()> {
        let r = self.tok.write_bool(value);
        self.poisoning(r)
    }

    fn emit_null(&mut self) -> Result<()> {
        let r = self.tok.write_null();
        self.poisoning(r)
    }

    fn emit_undefined(&mut self) -> Result<()> {
        let r = self.tok.write_undefined();
        self.poisoning(r)
    }

    fn open_string(&mut self, text: bool, len: Option<u64>) -> Result<()> {
        let r = if text {
            self.tok.begin_text(len)
        } else {
            self.tok.begin_bytes(len)
        };
        self.poisoning(r)?;
        self.depth += 1;
        Ok(())
    }

    fn open_array(&mut self, len: Option<u64>) -> Result<()> {
        let r = self.tok.begin_array(len);
        self.poisoning(r)?;
        self.depth += 1;
        Ok(())
    }

    fn open_map(&mut self, len: Option<u64>) -> Result<()> {
        let r = self.tok.begin_map(len);
        self.poisoning(r)?;
        self.depth += 1;
        Ok(())
    }
}

/// Root of a writer tree bound to one byte sink.
///
/// Exposes the same operations as any child position, accepts exactly one
/// top-level document, and must be [`finish`](Writer::finish)ed to commit.
pub struct Writer<T> {
    en: Encoder<T>,
    root_written: bool,
}

impl<T: TokenWrite> Writer<T> {
    /// Bind a writer tree to a token sink.
    pub fn new(tok: T) -> Self {
        Self {
            en: Encoder {
                tok,
                depth: 0,
                slot_pending: false,
                poison: None,
            },
            root_written: false,
        }
    }

    fn claim_root(&mut self) -> Result<()> {
        self.en.check_poison()?;
        if self.root_written {
            return Err(Error::misuse(MisuseCode::RootAlreadyWritten));
        }
        self.root_written = true;
        Ok(())
    }

    /// Write the top-level document as an unsigned integer.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink; a second top-level write is a misuse.
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.claim_root()?;
        self.en.emit_unsigned(value)
    }

    /// Write the top-level document as an integer (nonnegative values encode
    /// as the unsigned kind).
    ///
    /// # Errors
    ///
    /// I/O errors from the sink; a second top-level write is a misuse.
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.claim_root()?;
        self.en.emit_integer(value)
    }

    /// Write the top-level document as a float.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink; a second top-level write is a misuse.
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.claim_root()?;
        self.en.emit_float(value)
    }

    /// Write the top-level document as a boolean.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink; a second top-level write is a misuse.
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.claim_root()?;
        self.en.emit_bool(value)
    }

    /// Write the top-level document as null.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink; a second top-level write is a misuse.
    pub fn write_null(&mut self) -> Result<()> {
        self.claim_root()?;
        self.en.emit_null()
    }

    /// Write the top-level document as undefined.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink; a second top-level write is a misuse.
    pub fn write_undefined(&mut self) -> Result<()> {
        self.claim_root()?;
        self.en.emit_undefined()
    }

    /// Open the top-level document as a byte string of unknown length.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink; a second top-level write is a misuse.
    pub fn write_byte_string(&mut self) -> Result<StringWriter<'_, T>> {
        self.claim_root()?;
        self.en.open_string(false, None)?;
        Ok(StringWriter::new(&mut self.en, false, None))
    }

    /// Open the top-level document as a byte string of exactly `len` bytes.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink; a second top-level write is a misuse.
    pub fn write_byte_string_sized(&mut self, len: u64) -> Result<StringWriter<'_, T>> {
        self.claim_root()?;
        self.en.open_string(false, Some(len))?;
        Ok(StringWriter::new(&mut self.en, false, Some(len)))
    }

    /// Open the top-level document as a text string of unknown length.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink; a second top-level write is a misuse.
    pub fn write_text(&mut self) -> Result<StringWriter<'_, T>> {
        self.claim_root()?;
        self.en.open_string(true, None)?;
        Ok(StringWriter::new(&mut self.en, true, None))
    }

    /// Open the top-level document as a text string of exactly `len` bytes.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink; a second top-level write is a misuse.
    pub fn write_text_sized(&mut self, len: u64) -> Result<StringWriter<'_, T>> {
        self.claim_root()?;
        self.en.open_string(true, Some(len))?;
        Ok(StringWriter::new(&mut self.en, true, Some(len)))
    }

    /// Open the top-level document as an array of unknown length.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink; a second top-level write is a misuse.
    pub fn write_array(&mut self) -> Result<ArrayWriter<'_, T>> {
        self.claim_root()?;
        self.en.open_array(None)?;
        Ok(ArrayWriter::new(&mut self.en, None))
    }

    /// Open the top-level document as an array of exactly `len` elements.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink; a second top-level write is a misuse.
    pub fn write_array_sized(&mut self, len: u64) -> Result<ArrayWriter<'_, T>> {
        self.claim_root()?;
        self.en.open_array(Some(len))?;
        Ok(ArrayWriter::new(&mut self.en, Some(len)))
    }

    /// Open the top-level document as a map of unknown length.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink; a second top-level write is a misuse.
    pub fn write_map(&mut self) -> Result<MapWriter<'_, T>> {
        self.claim_root()?;
        self.en.open_map(None)?;
        Ok(MapWriter::new(&mut self.en, None))
    }

    /// Open the top-level document as a map of exactly `len` pairs.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink; a second top-level write is a misuse.
    pub fn write_map_sized(&mut self, len: u64) -> Result<MapWriter<'_, T>> {
        self.claim_root()?;
        self.en.open_map(Some(len))?;
        Ok(MapWriter::new(&mut self.en, Some(len)))
    }

    /// Commit the document and recover the token sink.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink; misuse if no document was written or a
    /// child writer was never finished.
    pub fn finish(mut self) -> Result<T> {
        self.en.check_poison()?;
        if !self.root_written {
            return Err(Error::misuse(MisuseCode::RootNotWritten));
        }
        if self.en.depth != 0 {
            return Err(Error::misuse(MisuseCode::ChildNotFinished));
        }
        let r = self.en.tok.flush();
        self.en.poisoning(r)?;
        Ok(self.en.tok)
    }
}

/// A single writable position: the child handed out by a container's
/// `append` operations.
///
/// Every operation consumes the writer, so a position can be written at most
/// once.
pub struct ValueWriter<'a, T> {
    en: &'a mut Encoder<T>,
}

impl<T> fmt::Debug for ValueWriter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValueWriter")
    }
}

impl<'a, T: TokenWrite> ValueWriter<'a, T> {
    /// Write this position as an unsigned integer.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink.
    pub fn write_u64(self, value: u64) -> Result<()> {
        self.en.check_poison()?;
        self.en.slot_pending = false;
        self.en.emit_unsigned(value)
    }

    /// Write this position as an integer (nonnegative values encode as the
    /// unsigned kind).
    ///
    /// # Errors
    ///
    /// I/O errors from the sink.
    pub fn write_i64(self, value: i64) -> Result<()> {
        self.en.check_poison()?;
        self.en.slot_pending = false;
        self.en.emit_integer(value)
    }

    /// Write this position as a float.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink.
    pub fn write_f64(self, value: f64) -> Result<()> {
        self.en.check_poison()?;
        self.en.slot_pending = false;
        self.en.emit_float(value)
    }

    /// Write this position as a boolean.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink.
    pub fn write_bool(self, value: bool) -> Result<()> {
        self.en.check_poison()?;
        self.en.slot_pending = false;
        self.en.emit_bool(value)
    }

    /// Write this position as null.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink.
    pub fn write_null(self) -> Result<()> {
        self.en.check_poison()?;
        self.en.slot_pending = false;
        self.en.emit_null()
    }

    /// Write this position as undefined.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink.
    pub fn write_undefined(self) -> Result<()> {
        self.en.check_poison()?;
        self.en.slot_pending = false;
        self.en.emit_undefined()
    }

    /// Open this position as a byte string of unknown length.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink.
    pub fn write_byte_string(self) -> Result<StringWriter<'a, T>> {
        self.en.check_poison()?;
        self.en.slot_pending = false;
        self.en.open_string(false, None)?;
        Ok(StringWriter::new(self.en, false, None))
    }

    /// Open this position as a byte string of exactly `len` bytes.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink.
    pub fn write_byte_string_sized(self, len: u64) -> Result<StringWriter<'a, T>> {
        self.en.check_poison()?;
        self.en.slot_pending = false;
        self.en.open_string(false, Some(len))?;
        Ok(StringWriter::new(self.en, false, Some(len)))
    }

    /// Open this position as a text string of unknown length.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink.
    pub fn write_text(self) -> Result<StringWriter<'a, T>> {
        self.en.check_poison()?;
        self.en.slot_pending = false;
        self.en.open_string(true, None)?;
        Ok(StringWriter::new(self.en, true, None))
    }

    /// Open this position as a text string of exactly `len` bytes.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink.
    pub fn write_text_sized(self, len: u64) -> Result<StringWriter<'a, T>> {
        self.en.check_poison()?;
        self.en.slot_pending = false;
        self.en.open_string(true, Some(len))?;
        Ok(StringWriter::new(self.en, true, Some(len)))
    }

    /// Open this position as an array of unknown length.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink.
    pub fn write_array(self) -> Result<ArrayWriter<'a, T>> {
        self.en.check_poison()?;
        self.en.slot_pending = false;
        self.en.open_array(None)?;
        Ok(ArrayWriter::new(self.en, None))
    }

    /// Open this position as an array of exactly `len` elements.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink.
    pub fn write_array_sized(self, len: u64) -> Result<ArrayWriter<'a, T>> {
        self.en.check_poison()?;
        self.en.slot_pending = false;
        self.en.open_array(Some(len))?;
        Ok(ArrayWriter::new(self.en, Some(len)))
    }

    /// Open this position as a map of unknown length.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink.
    pub fn write_map(self) -> Result<MapWriter<'a, T>> {
        self.en.check_poison()?;
        self.en.slot_pending = false;
        self.en.open_map(None)?;
        Ok(MapWriter::new(self.en, None))
    }

    /// Open this position as a map of exactly `len` pairs.
    ///
    /// # Errors
    ///
    /// I/O errors from the sink.
    pub fn write_map_sized(self, len: u64) -> Result<MapWriter<'a, T>> {
        self.en.check_poison()?;
        self.en.slot_pending = false;
        self.en.open_map(Some(len))?;
        Ok(MapWriter::new(self.en, Some(len)))
    }
}

/// Writer over one array.
pub struct ArrayWriter<'a, T> {
    en: &'a mut Encoder<T>,
    depth: usize,
    remaining: Option<u64>,
    first: bool,
}

impl<'a, T: TokenWrite> ArrayWriter<'a, T> {
    fn new(en: &'a mut Encoder<T>, remaining: Option<u64>) -> Self {
        let depth = en.depth;
        Self {
            en,
            depth,
            remaining,
            first: true,
        }
    }

    /// Claim the next element position.
    ///
    /// # Errors
    ///
    /// Misuse if a child is unfinished, the previous position was never
    /// written, or a declared size would be exceeded.
    pub fn append(&mut self) -> Result<ValueWriter<'_, T>> {
        self.en.check_poison()?;
        if self.en.depth != self.depth {
            return Err(Error::misuse(MisuseCode::ChildNotFinished));
        }
        if self.en.slot_pending {
            return Err(Error::misuse(MisuseCode::SlotNotWritten));
        }
        match self.remaining.as_mut() {
            Some(0) => return Err(Error::misuse(MisuseCode::ArrayLenMismatch)),
            Some(n) => *n -= 1,
            None => {}
        }
        let r = self.en.tok.element(self.first);
        self.en.poisoning(r)?;
        self.first = false;
        self.en.slot_pending = true;
        Ok(ValueWriter { en: &mut *self.en })
    }

    /// Close the array.
    ///
    /// # Errors
    ///
    /// Misuse if a child is unfinished, a position was never written, or a
    /// declared size was not reached.
    pub fn finish(self) -> Result<()> {
        self.en.check_poison()?;
        if self.en.depth != self.depth {
            return Err(Error::misuse(MisuseCode::ChildNotFinished));
        }
        if self.en.slot_pending {
            return Err(Error::misuse(MisuseCode::SlotNotWritten));
        }
        if matches!(self.remaining, Some(n) if n != 0) {
            return Err(Error::misuse(MisuseCode::ArrayLenMismatch));
        }
        let r = self.en.tok.end_array(self.remaining.is_some());
        self.en.poisoning(r)?;
        self.en.depth -= 1;
        Ok(())
    }
}

/// Writer over one map. Keys and values alternate strictly.
pub struct MapWriter<'a, T> {
    en: &'a mut Encoder<T>,
    depth: usize,
    remaining: Option<u64>,
    first: bool,
    awaiting_value: bool,
}

impl<'a, T: TokenWrite> MapWriter<'a, T> {
    fn new(en: &'a mut Encoder<T>, remaining: Option<u64>) -> Self {
        let depth = en.depth;
        Self {
            en,
            depth,
            remaining,
            first: true,
            awaiting_value: false,
        }
    }

    /// Claim the next key position. A key may be a document of any kind.
    ///
    /// # Errors
    ///
    /// Misuse if a child is unfinished, the previous position was never
    /// written, a value is expected, or a declared size would be exceeded.
    pub fn append_key(&mut self) -> Result<ValueWriter<'_, T>> {
        self.en.check_poison()?;
        if self.en.depth != self.depth {
            return Err(Error::misuse(MisuseCode::ChildNotFinished));
        }
        if self.en.slot_pending {
            return Err(Error::misuse(MisuseCode::SlotNotWritten));
        }
        if self.awaiting_value {
            return Err(Error::misuse(MisuseCode::ValueExpected));
        }
        match self.remaining.as_mut() {
            Some(0) => return Err(Error::misuse(MisuseCode::MapLenMismatch)),
            Some(n) => *n -= 1,
            None => {}
        }
        let r = self.en.tok.key(self.first);
        self.en.poisoning(r)?;
        self.first = false;
        self.awaiting_value = true;
        self.en.slot_pending = true;
        Ok(ValueWriter { en: &mut *self.en })
    }

    /// Claim the value position for the key written last.
    ///
    /// # Errors
    ///
    /// Misuse if a child is unfinished, the key was never written, or no key
    /// precedes the value.
    pub fn append_value(&mut self) -> Result<ValueWriter<'_, T>> {
        self.en.check_poison()?;
        if self.en.depth != self.depth {
            return Err(Error::misuse(MisuseCode::ChildNotFinished));
        }
        if self.en.slot_pending {
            return Err(Error::misuse(MisuseCode::SlotNotWritten));
        }
        if !self.awaiting_value {
            return Err(Error::misuse(MisuseCode::KeyExpected));
        }
        let r = self.en.tok.value();
        self.en.poisoning(r)?;
        self.awaiting_value = false;
        self.en.slot_pending = true;
        Ok(ValueWriter { en: &mut *self.en })
    }

    /// Close the map.
    ///
    /// # Errors
    ///
    /// Misuse if a child is unfinished, a position was never written, a value
    /// is expected, or a declared size was not reached.
    pub fn finish(self) -> Result<()> {
        self.en.check_poison()?;
        if self.en.depth != self.depth {
            return Err(Error::misuse(MisuseCode::ChildNotFinished));
        }
        if self.en.slot_pending {
            return Err(Error::misuse(MisuseCode::SlotNotWritten));
        }
        if self.awaiting_value {
            return Err(Error::misuse(MisuseCode::ValueExpected));
        }
        if matches!(self.remaining, Some(n) if n != 0) {
            return Err(Error::misuse(MisuseCode::MapLenMismatch));
        }
        let r = self.en.tok.end_map(self.remaining.is_some());
        self.en.poisoning(r)?;
        self.en.depth -= 1;
        Ok(())
    }
}

/// Writer over one string payload.
///
/// Implements [`std::io::Write`]; `io::Write::flush` is a pass-through and
/// does not close the string — [`finish`](StringWriter::finish) does.
pub struct StringWriter<'a, T> {
    en: &'a mut Encoder<T>,
    depth: usize,
    text: bool,
    remaining: Option<u64>,
}

impl<'a, T: TokenWrite> StringWriter<'a, T> {
    fn new(en: &'a mut Encoder<T>, text: bool, remaining: Option<u64>) -> Self {
        let depth = en.depth;
        Self {
            en,
            depth,
            text,
            remaining,
        }
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.en.check_poison()?;
        if chunk.is_empty() {
            return Ok(());
        }
        if let Some(n) = self.remaining.as_mut() {
            let len = chunk.len() as u64;
            if len > *n {
                return Err(Error::misuse(MisuseCode::StringLenMismatch));
            }
            *n -= len;
        }
        let r = if self.text {
            self.en.tok.write_text_chunk(chunk)
        } else {
            self.en.tok.write_bytes_chunk(chunk)
        };
        self.en.poisoning(r)
    }

    /// Close the string.
    ///
    /// # Errors
    ///
    /// Misuse if a declared size was not reached; I/O errors from the sink.
    pub fn finish(self) -> Result<()> {
        self.en.check_poison()?;
        debug_assert_eq!(self.en.depth, self.depth);
        if matches!(self.remaining, Some(n) if n != 0) {
            return Err(Error::misuse(MisuseCode::StringLenMismatch));
        }
        let r = if self.text {
            self.en.tok.end_text(self.remaining.is_some())
        } else {
            self.en.tok.end_bytes(self.remaining.is_some())
        };
        self.en.poisoning(r)?;
        self.en.depth -= 1;
        Ok(())
    }
}

impl<T: TokenWrite> io::Write for StringWriter<'_, T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_chunk(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
