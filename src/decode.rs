//! SAX reader tree: demand-driven traversal of one document in O(depth)
//! memory.
//!
//! A [`Reader`] owns the decoder state; every node handed out
//! ([`Document`], [`ArrayReader`], [`MapReader`], [`StringReader`]) holds a
//! mutable borrow of that state, so a parent cannot be advanced while a
//! child is live. Abandoned children are drained automatically the next time
//! their parent moves: the decoder keeps one frame per open container and
//! unwinds everything deeper than the operating node before parsing the next
//! header.

use std::fmt;
use std::io;

use crate::codec::{Header, TokenRead};
use crate::error::{CodecErrorCode, Error, MisuseCode, Replay, Result};
use crate::tag::Tag;
use crate::utf8;

/// Default bound on container nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

struct Frame {
    map: bool,
    /// Declared element count (arrays) or pair count (maps); counts down.
    /// `None` for indefinite CBOR containers and all JSON containers.
    remaining: Option<u64>,
    first: bool,
    /// Map only: a key was produced and its value not yet started.
    awaiting_value: bool,
}

pub(crate) struct Decoder<T> {
    tok: T,
    frames: Vec<Frame>,
    string_open: bool,
    max_depth: usize,
    poison: Option<Replay>,
}

impl<T: TokenRead> Decoder<T> {
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

    fn poison_err(&mut self, e: Error) -> Error {
        if self.poison.is_none() {
            self.poison = Replay::capture(&e);
        }
        e
    }

    fn push_frame(&mut self, map: bool, remaining: Option<u64>) -> Result<()> {
        if self.frames.len() >= self.max_depth {
            let e = Error::codec(CodecErrorCode::DepthLimitExceeded, self.tok.position());
            return Err(self.poison_err(e));
        }
        self.frames.push(Frame {
            map,
            remaining,
            first: true,
            awaiting_value: false,
        });
        Ok(())
    }

    /// Parse the next header and build the document node for it.
    fn read_document(&mut self, at_key: bool) -> Result<Document<'_, T>> {
        let r = self.tok.read_header(at_key);
        match self.poisoning(r)? {
            Header::Undefined => Ok(Document::Undefined),
            Header::Null => Ok(Document::Null),
            Header::Boolean(v) => Ok(Document::Boolean(v)),
            Header::Unsigned(v) => Ok(Document::UnsignedInt(v)),
            Header::Signed(v) => Ok(Document::SignedInt(v)),
            Header::Float(v) => Ok(Document::FloatingPoint(v)),
            Header::ByteString => {
                self.string_open = true;
                Ok(Document::ByteString(StringReader {
                    de: self,
                    done: false,
                }))
            }
            Header::TextString => {
                self.string_open = true;
                Ok(Document::TextString(StringReader {
                    de: self,
                    done: false,
                }))
            }
            Header::Array(len) => {
                self.push_frame(false, len)?;
                let depth = self.frames.len();
                Ok(Document::Array(ArrayReader {
                    de: self,
                    depth,
                    done: false,
                }))
            }
            Header::Map(len) => {
                self.push_frame(true, len)?;
                let depth = self.frames.len();
                Ok(Document::Map(MapReader {
                    de: self,
                    depth,
                    done: false,
                }))
            }
        }
    }

    /// Parse the next header, keeping any nested payload on the stack
    /// instead of building a node. Used while fast-forwarding.
    fn consume_item(&mut self, at_key: bool) -> Result<()> {
        let r = self.tok.read_header(at_key);
        match self.poisoning(r)? {
            Header::ByteString | Header::TextString => {
                self.string_open = true;
                Ok(())
            }
            Header::Array(len) => self.push_frame(false, len),
            Header::Map(len) => self.push_frame(true, len),
            _ => Ok(()),
        }
    }

    fn drain_string(&mut self) -> Result<()> {
        let mut scratch = [0u8; 256];
        loop {
            let r = self.tok.read_string(&mut scratch);
            if self.poisoning(r)? == 0 {
                self.string_open = false;
                return Ok(());
            }
        }
    }

    /// Does the innermost frame have a further item? Consumes the terminator
    /// when it does not.
    fn frame_continues(&mut self, idx: usize) -> Result<bool> {
        let frame = &self.frames[idx];
        match frame.remaining {
            Some(0) => Ok(false),
            Some(_) => Ok(true),
            None => {
                let (map, first) = (frame.map, frame.first);
                let r = self.tok.container_continues(map, first);
                self.poisoning(r)
            }
        }
    }

    /// Mark one item consumed on the innermost frame.
    fn take_item(&mut self, idx: usize) {
        let frame = &mut self.frames[idx];
        frame.first = false;
        if let Some(n) = frame.remaining.as_mut() {
            *n -= 1;
        }
    }

    fn skip_pending_value(&mut self, idx: usize) -> Result<()> {
        self.frames[idx].awaiting_value = false;
        let r = self.tok.pair_separator();
        self.poisoning(r)?;
        self.consume_item(false)
    }

    /// Advance the innermost frame by one step without exposing payload.
    fn advance_top(&mut self) -> Result<()> {
        let idx = self.frames.len() - 1;
        if self.frames[idx].map && self.frames[idx].awaiting_value {
            return self.skip_pending_value(idx);
        }
        if !self.frame_continues(idx)? {
            self.frames.pop();
            return Ok(());
        }
        self.take_item(idx);
        if self.frames[idx].map {
            self.frames[idx].awaiting_value = true;
            self.consume_item(true)
        } else {
            self.consume_item(false)
        }
    }

    /// Drain any open string and every frame deeper than `target`.
    fn unwind(&mut self, target: usize) -> Result<()> {
        loop {
            if self.string_open {
                self.drain_string()?;
                continue;
            }
            if self.frames.len() <= target {
                return Ok(());
            }
            self.advance_top()?;
        }
    }
}

/// Root of a reader tree bound to one byte source.
///
/// Yields exactly one top-level [`Document`]; the payload is pulled from the
/// source on demand as the tree is walked.
pub struct Reader<T> {
    de: Decoder<T>,
    root_read: bool,
}

impl<T: TokenRead> Reader<T> {
    /// Bind a reader tree to a token source.
    pub fn new(tok: T) -> Self {
        Self {
            de: Decoder {
                tok,
                frames: Vec::new(),
                string_open: false,
                max_depth: DEFAULT_MAX_DEPTH,
                poison: None,
            },
            root_read: false,
        }
    }

    /// Replace the container nesting bound (default
    /// [`DEFAULT_MAX_DEPTH`]). Exceeding it while reading is a codec error.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.de.max_depth = max_depth;
        self
    }

    /// Pull the single top-level document.
    ///
    /// # Errors
    ///
    /// Codec/I/O errors from the source; requesting the document a second
    /// time is a misuse.
    pub fn document(&mut self) -> Result<Document<'_, T>> {
        self.de.check_poison()?;
        if self.root_read {
            return Err(Error::misuse(MisuseCode::RootAlreadyRead));
        }
        self.root_read = true;
        self.de.read_document(false)
    }

    /// Number of source bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.de.tok.position()
    }

    /// Recover the token source.
    pub fn into_inner(self) -> T {
        self.de.tok
    }
}

/// One document of any kind, as produced by a reader.
///
/// This is the unit traded across the reader API: match on it to visit the
/// inhabited alternative. Scalars carry their payload directly; strings and
/// containers carry a live node borrowing the reader, so the parent cannot
/// move until the node is dropped, skipped, or exhausted.
pub enum Document<'a, T> {
    /// CBOR `undefined`.
    Undefined,
    /// Null.
    Null,
    /// Boolean.
    Boolean(bool),
    /// 64-bit nonnegative integer.
    UnsignedInt(u64),
    /// Negative 64-bit integer.
    SignedInt(i64),
    /// 64-bit float.
    FloatingPoint(f64),
    /// Streaming byte string.
    ByteString(StringReader<'a, T>),
    /// Streaming text string (UTF-8 by convention, not validated here).
    TextString(StringReader<'a, T>),
    /// Streaming array.
    Array(ArrayReader<'a, T>),
    /// Streaming map.
    Map(MapReader<'a, T>),
}

impl<T> fmt::Debug for Document<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Document::Undefined => "Undefined",
            Document::Null => "Null",
            Document::Boolean(_) => "Boolean",
            Document::UnsignedInt(_) => "UnsignedInt",
            Document::SignedInt(_) => "SignedInt",
            Document::FloatingPoint(_) => "FloatingPoint",
            Document::ByteString(_) => "ByteString",
            Document::TextString(_) => "TextString",
            Document::Array(_) => "Array",
            Document::Map(_) => "Map",
        };
        f.write_str(name)
    }
}

impl<'a, T: TokenRead> Document<'a, T> {
    /// Kind of the inhabited alternative.
    #[must_use]
    pub const fn tag(&self) -> Tag {
        match self {
            Self::Undefined => Tag::Undefined,
            Self::Null => Tag::Null,
            Self::Boolean(_) => Tag::Boolean,
            Self::UnsignedInt(_) => Tag::UnsignedInt,
            Self::SignedInt(_) => Tag::SignedInt,
            Self::FloatingPoint(_) => Tag::FloatingPoint,
            Self::ByteString(_) => Tag::ByteString,
            Self::TextString(_) => Tag::TextString,
            Self::Array(_) => Tag::Array,
            Self::Map(_) => Tag::Map,
        }
    }

    /// True if the inhabited alternative carries `tag`.
    #[must_use]
    pub fn is(&self, tag: Tag) -> bool {
        self.tag() == tag
    }

    /// Drain this document to completion without exposing its payload.
    ///
    /// Scalars are a no-op; strings and containers are fast-forwarded.
    ///
    /// # Errors
    ///
    /// Codec/I/O errors from the source. Skip never reports a misuse.
    pub fn skip(self) -> Result<()> {
        match self {
            Self::Undefined
            | Self::Null
            | Self::Boolean(_)
            | Self::UnsignedInt(_)
            | Self::SignedInt(_)
            | Self::FloatingPoint(_) => Ok(()),
            Self::ByteString(s) | Self::TextString(s) => s.skip(),
            Self::Array(a) => a.skip(),
            Self::Map(m) => m.skip(),
        }
    }

    /// The unsigned-integer payload.
    ///
    /// # Errors
    ///
    /// Misuse if the document is of a different kind.
    pub fn into_unsigned(self) -> Result<u64> {
        match self {
            Self::UnsignedInt(v) => Ok(v),
            _ => Err(Error::misuse(MisuseCode::WrongDocumentKind)),
        }
    }

    /// The signed-integer payload.
    ///
    /// # Errors
    ///
    /// Misuse if the document is of a different kind.
    pub fn into_signed(self) -> Result<i64> {
        match self {
            Self::SignedInt(v) => Ok(v),
            _ => Err(Error::misuse(MisuseCode::WrongDocumentKind)),
        }
    }

    /// The float payload.
    ///
    /// # Errors
    ///
    /// Misuse if the document is of a different kind.
    pub fn into_float(self) -> Result<f64> {
        match self {
            Self::FloatingPoint(v) => Ok(v),
            _ => Err(Error::misuse(MisuseCode::WrongDocumentKind)),
        }
    }

    /// The boolean payload.
    ///
    /// # Errors
    ///
    /// Misuse if the document is of a different kind.
    pub fn into_bool(self) -> Result<bool> {
        match self {
            Self::Boolean(v) => Ok(v),
            _ => Err(Error::misuse(MisuseCode::WrongDocumentKind)),
        }
    }

    /// The byte-string node.
    ///
    /// # Errors
    ///
    /// Misuse if the document is of a different kind.
    pub fn into_byte_string(self) -> Result<StringReader<'a, T>> {
        match self {
            Self::ByteString(s) => Ok(s),
            _ => Err(Error::misuse(MisuseCode::WrongDocumentKind)),
        }
    }

    /// The text-string node.
    ///
    /// # Errors
    ///
    /// Misuse if the document is of a different kind.
    pub fn into_text_string(self) -> Result<StringReader<'a, T>> {
        match self {
            Self::TextString(s) => Ok(s),
            _ => Err(Error::misuse(MisuseCode::WrongDocumentKind)),
        }
    }

    /// The array node.
    ///
    /// # Errors
    ///
    /// Misuse if the document is of a different kind.
    pub fn into_array(self) -> Result<ArrayReader<'a, T>> {
        match self {
            Self::Array(a) => Ok(a),
            _ => Err(Error::misuse(MisuseCode::WrongDocumentKind)),
        }
    }

    /// The map node.
    ///
    /// # Errors
    ///
    /// Misuse if the document is of a different kind.
    pub fn into_map(self) -> Result<MapReader<'a, T>> {
        match self {
            Self::Map(m) => Ok(m),
            _ => Err(Error::misuse(MisuseCode::WrongDocumentKind)),
        }
    }
}

/// Streaming reader over one string payload.
///
/// Implements [`std::io::Read`]: a read of 0 signals the end of the string.
/// Dropping the node mid-payload is fine; the remainder is drained when the
/// parent advances.
pub struct StringReader<'a, T> {
    de: &'a mut Decoder<T>,
    done: bool,
}

impl<T: TokenRead> StringReader<'_, T> {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.de.check_poison()?;
        if self.done || buf.is_empty() {
            return Ok(0);
        }
        let r = self.de.tok.read_string(buf);
        let n = self.de.poisoning(r)?;
        if n == 0 {
            self.done = true;
            self.de.string_open = false;
        }
        Ok(n)
    }

    /// Discard the rest of the payload.
    ///
    /// # Errors
    ///
    /// Codec/I/O errors from the source.
    pub fn skip(mut self) -> Result<()> {
        let mut scratch = [0u8; 256];
        while self.read_chunk(&mut scratch)? != 0 {}
        Ok(())
    }

    /// Collect the rest of the payload into a vector.
    ///
    /// # Errors
    ///
    /// Codec/I/O errors from the source.
    pub fn read_all(mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut scratch = [0u8; 256];
        loop {
            let n = self.read_chunk(&mut scratch)?;
            if n == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&scratch[..n]);
        }
    }

    /// Collect the rest of the payload and validate it as UTF-8.
    ///
    /// # Errors
    ///
    /// Codec/I/O errors from the source; `InvalidUtf8` if the payload is not
    /// UTF-8.
    pub fn read_all_text(self) -> Result<String> {
        let offset = self.de.tok.position();
        let bytes = self.read_all()?;
        if utf8::validate(&bytes).is_err() {
            return Err(Error::codec(CodecErrorCode::InvalidUtf8, offset));
        }
        String::from_utf8(bytes).map_err(|_| Error::codec(CodecErrorCode::InvalidUtf8, offset))
    }
}

impl<T: TokenRead> io::Read for StringReader<'_, T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_chunk(buf).map_err(io::Error::from)
    }
}

/// Streaming reader over one array.
pub struct ArrayReader<'a, T> {
    de: &'a mut Decoder<T>,
    depth: usize,
    done: bool,
}

impl<T: TokenRead> ArrayReader<'_, T> {
    /// Pull the next element, or `None` at the end of the array.
    ///
    /// A previous element left partially consumed is skipped silently first.
    ///
    /// # Errors
    ///
    /// Codec/I/O errors from the source; calling again after `Ok(None)` is a
    /// misuse.
    pub fn read(&mut self) -> Result<Option<Document<'_, T>>> {
        self.de.check_poison()?;
        if self.done {
            return Err(Error::misuse(MisuseCode::ReadPastEnd));
        }
        self.de.unwind(self.depth)?;
        let idx = self.depth - 1;
        if !self.de.frame_continues(idx)? {
            self.de.frames.pop();
            self.done = true;
            return Ok(None);
        }
        self.de.take_item(idx);
        self.de.read_document(false).map(Some)
    }

    /// Fast-forward over the remaining elements.
    ///
    /// # Errors
    ///
    /// Codec/I/O errors from the source.
    pub fn skip(self) -> Result<()> {
        self.de.check_poison()?;
        if self.done {
            return Ok(());
        }
        self.de.unwind(self.depth - 1)
    }
}

/// Streaming reader over one map.
pub struct MapReader<'a, T> {
    de: &'a mut Decoder<T>,
    depth: usize,
    done: bool,
}

impl<T: TokenRead> MapReader<'_, T> {
    /// Pull the next key, or `None` once the map is exhausted.
    ///
    /// If the value of the previous pair was never requested it is skipped
    /// silently first.
    ///
    /// # Errors
    ///
    /// Codec/I/O errors from the source; calling again after `Ok(None)` is a
    /// misuse.
    pub fn read_key(&mut self) -> Result<Option<Document<'_, T>>> {
        self.de.check_poison()?;
        if self.done {
            return Err(Error::misuse(MisuseCode::ReadPastEnd));
        }
        self.de.unwind(self.depth)?;
        let idx = self.depth - 1;
        if self.de.frames[idx].awaiting_value {
            self.de.skip_pending_value(idx)?;
            self.de.unwind(self.depth)?;
        }
        if !self.de.frame_continues(idx)? {
            self.de.frames.pop();
            self.done = true;
            return Ok(None);
        }
        self.de.take_item(idx);
        self.de.frames[idx].awaiting_value = true;
        self.de.read_document(true).map(Some)
    }

    /// Pull the value of the pair whose key was last returned.
    ///
    /// # Errors
    ///
    /// Codec/I/O errors from the source; misuse if no key is pending.
    pub fn read_value(&mut self) -> Result<Document<'_, T>> {
        self.de.check_poison()?;
        if self.done {
            return Err(Error::misuse(MisuseCode::ReadPastEnd));
        }
        self.de.unwind(self.depth)?;
        let idx = self.depth - 1;
        if !self.de.frames[idx].awaiting_value {
            return Err(Error::misuse(MisuseCode::KeyExpected));
        }
        self.de.frames[idx].awaiting_value = false;
        let r = self.de.tok.pair_separator();
        self.de.poisoning(r)?;
        self.de.read_document(false)
    }

    /// Fast-forward over the remaining pairs.
    ///
    /// # Errors
    ///
    /// Codec/I/O errors from the source.
    pub fn skip(self) -> Result<()> {
        self.de.check_poison()?;
        if self.done {
            return Ok(());
        }
        self.de.unwind(self.depth - 1)
    }
}
