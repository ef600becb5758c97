//! CBOR wire format (RFC 7049).
//!
//! The reader accepts every well-formed encoding: all argument widths,
//! definite and indefinite strings/arrays/maps, half/single/double floats.
//! Semantic tags are skipped transparently (the document model has no tag
//! kind). The writer emits shortest-form arguments, 64-bit floats, and
//! indefinite-length encodings for size-free containers and strings.

use std::fmt;
use std::io::{Read, Write};

use crate::codec::{Header, TokenRead, TokenWrite};
use crate::decode::Reader;
use crate::encode::Writer;
use crate::error::{CodecErrorCode, Error, Result};
use crate::float::{f64_from_half_bits, f64_from_single_bits};
use crate::stream::ByteReader;

/// Bind a CBOR reader tree to a byte source.
///
/// The returned [`Reader`] yields one document whose payload is pulled from
/// `source` on demand. Wrap slow sources in [`std::io::BufReader`].
pub fn read_cbor<R: Read>(source: R) -> Reader<CborTokenReader<R>> {
    Reader::new(CborTokenReader::new(source))
}

/// Bind a CBOR writer tree to a byte sink.
pub fn write_cbor<W: Write>(sink: W) -> Writer<CborTokenWriter<W>> {
    Writer::new(CborTokenWriter::new(sink))
}

#[derive(Clone, Copy)]
enum StrState {
    Idle,
    Definite { remaining: u64 },
    Chunked { major: u8, remaining: u64 },
}

/// Pull-side CBOR tokenizer over a [`Read`] source.
pub struct CborTokenReader<R> {
    src: ByteReader<R>,
    str_state: StrState,
}

impl<R: Read> CborTokenReader<R> {
    /// Wrap a byte source.
    pub const fn new(source: R) -> Self {
        Self {
            src: ByteReader::new(source),
            str_state: StrState::Idle,
        }
    }

    /// Recover the byte source.
    pub fn into_inner(self) -> R {
        self.src.into_inner()
    }

    /// Read the argument for additional-info `ai`. Any width is accepted;
    /// `ai` 31 is rejected here (callers that allow indefinite lengths
    /// handle it before calling).
    fn read_arg(&mut self, ai: u8, off: u64) -> Result<u64> {
        match ai {
            0..=23 => Ok(u64::from(ai)),
            24 => Ok(u64::from(self.src.read_u8()?)),
            25 => Ok(u64::from(self.src.read_be_u16()?)),
            26 => Ok(u64::from(self.src.read_be_u32()?)),
            27 => self.src.read_be_u64(),
            28..=30 => Err(Error::codec(CodecErrorCode::ReservedAdditionalInfo, off)),
            _ => Err(Error::codec(CodecErrorCode::InvalidIndefiniteLength, off)),
        }
    }

    fn read_payload(&mut self, buf: &mut [u8], remaining: u64) -> Result<usize> {
        let cap = usize::try_from(remaining.min(buf.len() as u64)).unwrap_or(buf.len());
        let n = self.src.read_some(&mut buf[..cap])?;
        if n == 0 {
            return Err(Error::codec(
                CodecErrorCode::UnexpectedEof,
                self.src.position(),
            ));
        }
        Ok(n)
    }
}

impl<R: Read> TokenRead for CborTokenReader<R> {
    fn read_header(&mut self, _at_key: bool) -> Result<Header> {
        loop {
            let off = self.src.position();
            let ib = self.src.read_u8()?;
            let major = ib >> 5;
            let ai = ib & 0x1f;
            return match major {
                0 => Ok(Header::Unsigned(self.read_arg(ai, off)?)),
                1 => {
                    let n = self.read_arg(ai, off)?;
                    let n = i64::try_from(n)
                        .map_err(|_| Error::codec(CodecErrorCode::IntegerOutOfRange, off))?;
                    Ok(Header::Signed(-1 - n))
                }
                2 | 3 => {
                    self.str_state = if ai == 31 {
                        StrState::Chunked {
                            major,
                            remaining: 0,
                        }
                    } else {
                        StrState::Definite {
                            remaining: self.read_arg(ai, off)?,
                        }
                    };
                    Ok(if major == 2 {
                        Header::ByteString
                    } else {
                        Header::TextString
                    })
                }
                4 => {
                    if ai == 31 {
                        Ok(Header::Array(None))
                    } else {
                        Ok(Header::Array(Some(self.read_arg(ai, off)?)))
                    }
                }
                5 => {
                    if ai == 31 {
                        Ok(Header::Map(None))
                    } else {
                        Ok(Header::Map(Some(self.read_arg(ai, off)?)))
                    }
                }
                6 => {
                    // Semantic tag: consume and move on to the tagged item.
                    self.read_arg(ai, off)?;
                    continue;
                }
                _ => match ai {
                    20 => Ok(Header::Boolean(false)),
                    21 => Ok(Header::Boolean(true)),
                    22 => Ok(Header::Null),
                    23 => Ok(Header::Undefined),
                    24 => {
                        self.src.read_u8()?;
                        Err(Error::codec(CodecErrorCode::UnsupportedSimpleValue, off))
                    }
                    25 => Ok(Header::Float(f64_from_half_bits(self.src.read_be_u16()?))),
                    26 => Ok(Header::Float(f64_from_single_bits(
                        self.src.read_be_u32()?,
                    ))),
                    27 => Ok(Header::Float(f64::from_bits(self.src.read_be_u64()?))),
                    28..=30 => Err(Error::codec(CodecErrorCode::ReservedAdditionalInfo, off)),
                    31 => Err(Error::codec(CodecErrorCode::UnexpectedBreak, off)),
                    _ => Err(Error::codec(CodecErrorCode::UnsupportedSimpleValue, off)),
                },
            };
        }
    }

    fn read_string(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            match self.str_state {
                StrState::Idle => return Ok(0),
                StrState::Definite { remaining } => {
                    if remaining == 0 {
                        self.str_state = StrState::Idle;
                        return Ok(0);
                    }
                    let n = self.read_payload(buf, remaining)?;
                    self.str_state = StrState::Definite {
                        remaining: remaining - n as u64,
                    };
                    return Ok(n);
                }
                StrState::Chunked { major, remaining } => {
                    if remaining == 0 {
                        let off = self.src.position();
                        let ib = self.src.read_u8()?;
                        if ib == 0xff {
                            self.str_state = StrState::Idle;
                            return Ok(0);
                        }
                        if ib >> 5 != major {
                            return Err(Error::codec(CodecErrorCode::InvalidStringChunk, off));
                        }
                        let ai = ib & 0x1f;
                        if ai == 31 {
                            return Err(Error::codec(
                                CodecErrorCode::InvalidIndefiniteLength,
                                off,
                            ));
                        }
                        let len = self.read_arg(ai, off)?;
                        self.str_state = StrState::Chunked {
                            major,
                            remaining: len,
                        };
                    } else {
                        let n = self.read_payload(buf, remaining)?;
                        self.str_state = StrState::Chunked {
                            major,
                            remaining: remaining - n as u64,
                        };
                        return Ok(n);
                    }
                }
            }
        }
    }

    fn container_continues(&mut self, _map: bool, _first: bool) -> Result<bool> {
        match self.src.peek_u8()? {
            Some(0xff) => {
                self.src.read_u8()?;
                Ok(false)
            }
            Some(_) => Ok(true),
            None => Err(Error::codec(
                CodecErrorCode::UnexpectedEof,
                self.src.position(),
            )),
        }
    }

    fn pair_separator(&mut self) -> Result<()> {
        Ok(())
    }

    fn position(&self) -> u64 {
        self.src.position()
    }
}

/// Push-side CBOR tokenizer over a [`Write`] sink.
pub struct CborTokenWriter<W> {
    dst: W,
    /// An indefinite-length string is open; chunks carry their own headers.
    chunked_string: bool,
}

impl<W> fmt::Debug for CborTokenWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CborTokenWriter")
    }
}

impl<W: Write> CborTokenWriter<W> {
    /// Wrap a byte sink.
    pub const fn new(sink: W) -> Self {
        Self {
            dst: sink,
            chunked_string: false,
        }
    }

    /// Recover the byte sink.
    pub fn into_inner(self) -> W {
        self.dst
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.dst.write_all(bytes).map_err(Error::Io)
    }

    fn put_u8(&mut self, byte: u8) -> Result<()> {
        self.put(&[byte])
    }

    /// Shortest-form initial byte + argument for `value`.
    fn emit_major(&mut self, major: u8, value: u64) -> Result<()> {
        debug_assert!(major <= 7);
        if value < 24 {
            return self.put_u8((major << 5) | value as u8);
        }
        if value <= 0xff {
            return self.put(&[(major << 5) | 24, value as u8]);
        }
        if value <= 0xffff {
            self.put_u8((major << 5) | 25)?;
            return self.put(&(value as u16).to_be_bytes());
        }
        if value <= 0xffff_ffff {
            self.put_u8((major << 5) | 26)?;
            return self.put(&(value as u32).to_be_bytes());
        }
        self.put_u8((major << 5) | 27)?;
        self.put(&value.to_be_bytes())
    }

    fn emit_len(&mut self, major: u8, indefinite_ib: u8, len: Option<u64>) -> Result<()> {
        match len {
            Some(n) => self.emit_major(major, n),
            None => self.put_u8(indefinite_ib),
        }
    }
}

impl<W: Write> TokenWrite for CborTokenWriter<W> {
    fn write_unsigned(&mut self, value: u64) -> Result<()> {
        self.emit_major(0, value)
    }

    fn write_signed(&mut self, value: i64) -> Result<()> {
        debug_assert!(value < 0);
        self.emit_major(1, (-1 - value).unsigned_abs())
    }

    fn write_float(&mut self, value: f64) -> Result<()> {
        let mut buf = [0u8; 9];
        buf[0] = 0xfb;
        buf[1..9].copy_from_slice(&value.to_bits().to_be_bytes());
        self.put(&buf)
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.put_u8(if value { 0xf5 } else { 0xf4 })
    }

    fn write_null(&mut self) -> Result<()> {
        self.put_u8(0xf6)
    }

    fn write_undefined(&mut self) -> Result<()> {
        self.put_u8(0xf7)
    }

    fn begin_bytes(&mut self, len: Option<u64>) -> Result<()> {
        self.chunked_string = len.is_none();
        self.emit_len(2, 0x5f, len)
    }

    fn write_bytes_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        if self.chunked_string {
            self.emit_major(2, chunk.len() as u64)?;
        }
        self.put(chunk)
    }

    fn end_bytes(&mut self, sized: bool) -> Result<()> {
        self.chunked_string = false;
        if sized {
            Ok(())
        } else {
            self.put_u8(0xff)
        }
    }

    fn begin_text(&mut self, len: Option<u64>) -> Result<()> {
        self.chunked_string = len.is_none();
        self.emit_len(3, 0x7f, len)
    }

    fn write_text_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        if self.chunked_string {
            self.emit_major(3, chunk.len() as u64)?;
        }
        self.put(chunk)
    }

    fn end_text(&mut self, sized: bool) -> Result<()> {
        self.chunked_string = false;
        if sized {
            Ok(())
        } else {
            self.put_u8(0xff)
        }
    }

    fn begin_array(&mut self, len: Option<u64>) -> Result<()> {
        self.emit_len(4, 0x9f, len)
    }

    fn end_array(&mut self, sized: bool) -> Result<()> {
        if sized {
            Ok(())
        } else {
            self.put_u8(0xff)
        }
    }

    fn begin_map(&mut self, len: Option<u64>) -> Result<()> {
        self.emit_len(5, 0xbf, len)
    }

    fn end_map(&mut self, sized: bool) -> Result<()> {
        if sized {
            Ok(())
        } else {
            self.put_u8(0xff)
        }
    }

    fn element(&mut self, _first: bool) -> Result<()> {
        Ok(())
    }

    fn key(&mut self, _first: bool) -> Result<()> {
        Ok(())
    }

    fn value(&mut self) -> Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.dst.flush().map_err(Error::Io)
    }
}
