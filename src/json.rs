//! JSON wire format (RFC 8259).
//!
//! Numbers map to the unsigned/signed/float kinds by heuristic: a token
//! without a fraction or exponent parses as `u64`/`i64` first and falls back
//! to `f64`. Strings stream with incremental unescaping. JSON has no binary
//! kind: the writer emits byte strings as base64 text and the reader never
//! produces a byte-string document (no auto-decoding). `undefined` and
//! non-finite floats are written as `null`. Scalar map keys are written
//! inside quotes so the output stays interoperable; container-valued keys
//! are emitted as-is and produce nonstandard JSON.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::codec::{Header, TokenRead, TokenWrite};
use crate::decode::Reader;
use crate::encode::Writer;
use crate::error::{CodecErrorCode, Error, Result};
use crate::stream::ByteReader;

/// Bind a JSON reader tree to a byte source.
///
/// Wrap slow sources in [`std::io::BufReader`].
pub fn read_json<R: Read>(source: R) -> Reader<JsonTokenReader<R>> {
    Reader::new(JsonTokenReader::new(source))
}

/// Bind a JSON writer tree to a byte sink.
pub fn write_json<W: Write>(sink: W) -> Writer<JsonTokenWriter<W>> {
    Writer::new(JsonTokenWriter::new(sink))
}

// Large enough for any f64 the writer can produce: Rust's float formatting
// never uses an exponent, so the extremes run to ~330 digits.
const NUMBER_TOKEN_MAX: usize = 512;

/// Pull-side JSON tokenizer over a [`Read`] source.
pub struct JsonTokenReader<R> {
    src: ByteReader<R>,
    in_string: bool,
    /// Decoded escape bytes that did not fit the caller's buffer.
    carry: [u8; 4],
    carry_len: u8,
    carry_pos: u8,
}

impl<R: Read> JsonTokenReader<R> {
    /// Wrap a byte source.
    pub const fn new(source: R) -> Self {
        Self {
            src: ByteReader::new(source),
            in_string: false,
            carry: [0; 4],
            carry_len: 0,
            carry_pos: 0,
        }
    }

    /// Recover the byte source.
    pub fn into_inner(self) -> R {
        self.src.into_inner()
    }

    fn skip_ws(&mut self) -> Result<()> {
        while let Some(b) = self.src.peek_u8()? {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => {
                    self.src.read_u8()?;
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn expect_literal(&mut self, lit: &[u8], off: u64) -> Result<()> {
        for &expected in lit {
            if self.src.read_u8()? != expected {
                return Err(Error::codec(CodecErrorCode::InvalidLiteral, off));
            }
        }
        Ok(())
    }

    fn read_number(&mut self, off: u64) -> Result<Header> {
        let mut buf = [0u8; NUMBER_TOKEN_MAX];
        let mut len = 0usize;
        let mut integral = true;
        while let Some(b) = self.src.peek_u8()? {
            match b {
                b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E' => {
                    if len == buf.len() {
                        return Err(Error::codec(CodecErrorCode::NumberTooLong, off));
                    }
                    if matches!(b, b'.' | b'e' | b'E') {
                        integral = false;
                    }
                    buf[len] = b;
                    len += 1;
                    self.src.read_u8()?;
                }
                _ => break,
            }
        }
        let token = &buf[..len];
        validate_number_grammar(token).map_err(|code| Error::codec(code, off))?;
        let text = core::str::from_utf8(token)
            .map_err(|_| Error::codec(CodecErrorCode::InvalidNumber, off))?;
        if integral {
            if text.starts_with('-') {
                if let Ok(v) = text.parse::<i64>() {
                    return Ok(if v >= 0 {
                        Header::Unsigned(v.unsigned_abs())
                    } else {
                        Header::Signed(v)
                    });
                }
            } else if let Ok(v) = text.parse::<u64>() {
                return Ok(Header::Unsigned(v));
            }
            // Out of 64-bit range: fall back to the float kind.
        }
        text.parse::<f64>()
            .map(Header::Float)
            .map_err(|_| Error::codec(CodecErrorCode::InvalidNumber, off))
    }

    fn read_hex4(&mut self, off: u64) -> Result<u16> {
        let mut v: u16 = 0;
        for _ in 0..4 {
            let d = match self.src.read_u8()? {
                b @ b'0'..=b'9' => b - b'0',
                b @ b'a'..=b'f' => b - b'a' + 10,
                b @ b'A'..=b'F' => b - b'A' + 10,
                _ => return Err(Error::codec(CodecErrorCode::InvalidEscape, off)),
            };
            v = (v << 4) | u16::from(d);
        }
        Ok(v)
    }

    /// Decode one escape sequence into `out`; returns the byte count.
    fn read_escape(&mut self, out: &mut [u8; 4], off: u64) -> Result<usize> {
        let simple = match self.src.read_u8()? {
            b'"' => b'"',
            b'\\' => b'\\',
            b'/' => b'/',
            b'b' => 0x08,
            b'f' => 0x0c,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'u' => {
                let hi = self.read_hex4(off)?;
                let code = if (0xd800..=0xdbff).contains(&hi) {
                    if self.src.read_u8()? != b'\\' || self.src.read_u8()? != b'u' {
                        return Err(Error::codec(CodecErrorCode::InvalidEscape, off));
                    }
                    let lo = self.read_hex4(off)?;
                    if !(0xdc00..=0xdfff).contains(&lo) {
                        return Err(Error::codec(CodecErrorCode::InvalidEscape, off));
                    }
                    0x10000 + ((u32::from(hi) - 0xd800) << 10) + (u32::from(lo) - 0xdc00)
                } else if (0xdc00..=0xdfff).contains(&hi) {
                    return Err(Error::codec(CodecErrorCode::InvalidEscape, off));
                } else {
                    u32::from(hi)
                };
                let ch = char::from_u32(code)
                    .ok_or(Error::codec(CodecErrorCode::InvalidEscape, off))?;
                return Ok(ch.encode_utf8(&mut out[..]).len());
            }
            _ => return Err(Error::codec(CodecErrorCode::InvalidEscape, off)),
        };
        out[0] = simple;
        Ok(1)
    }
}

fn validate_number_grammar(t: &[u8]) -> core::result::Result<(), CodecErrorCode> {
    let mut i = 0;
    if t.get(i) == Some(&b'-') {
        i += 1;
    }
    match t.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => {
            i += 1;
            while matches!(t.get(i), Some(b'0'..=b'9')) {
                i += 1;
            }
        }
        _ => return Err(CodecErrorCode::InvalidNumber),
    }
    if t.get(i) == Some(&b'.') {
        i += 1;
        if !matches!(t.get(i), Some(b'0'..=b'9')) {
            return Err(CodecErrorCode::InvalidNumber);
        }
        while matches!(t.get(i), Some(b'0'..=b'9')) {
            i += 1;
        }
    }
    if matches!(t.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(t.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        if !matches!(t.get(i), Some(b'0'..=b'9')) {
            return Err(CodecErrorCode::InvalidNumber);
        }
        while matches!(t.get(i), Some(b'0'..=b'9')) {
            i += 1;
        }
    }
    if i != t.len() {
        return Err(CodecErrorCode::InvalidNumber);
    }
    Ok(())
}

impl<R: Read> TokenRead for JsonTokenReader<R> {
    fn read_header(&mut self, at_key: bool) -> Result<Header> {
        self.skip_ws()?;
        let off = self.src.position();
        let Some(b) = self.src.peek_u8()? else {
            return Err(Error::codec(CodecErrorCode::UnexpectedEof, off));
        };
        if at_key && b != b'"' {
            return Err(Error::codec(CodecErrorCode::InvalidSyntax, off));
        }
        match b {
            b'{' => {
                self.src.read_u8()?;
                Ok(Header::Map(None))
            }
            b'[' => {
                self.src.read_u8()?;
                Ok(Header::Array(None))
            }
            b'"' => {
                self.src.read_u8()?;
                self.in_string = true;
                self.carry_len = 0;
                self.carry_pos = 0;
                Ok(Header::TextString)
            }
            b't' => {
                self.expect_literal(b"true", off)?;
                Ok(Header::Boolean(true))
            }
            b'f' => {
                self.expect_literal(b"false", off)?;
                Ok(Header::Boolean(false))
            }
            b'n' => {
                self.expect_literal(b"null", off)?;
                Ok(Header::Null)
            }
            b'-' | b'0'..=b'9' => self.read_number(off),
            _ => Err(Error::codec(CodecErrorCode::InvalidSyntax, off)),
        }
    }

    fn read_string(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut n = 0;
        while self.carry_pos < self.carry_len && n < buf.len() {
            buf[n] = self.carry[usize::from(self.carry_pos)];
            self.carry_pos += 1;
            n += 1;
        }
        if self.carry_pos == self.carry_len {
            self.carry_pos = 0;
            self.carry_len = 0;
        }
        if !self.in_string {
            return Ok(n);
        }
        while n < buf.len() {
            let off = self.src.position();
            match self.src.read_u8()? {
                b'"' => {
                    self.in_string = false;
                    return Ok(n);
                }
                b'\\' => {
                    let mut tmp = [0u8; 4];
                    let len = self.read_escape(&mut tmp, off)?;
                    for &decoded in &tmp[..len] {
                        if n < buf.len() {
                            buf[n] = decoded;
                            n += 1;
                        } else {
                            self.carry[usize::from(self.carry_len)] = decoded;
                            self.carry_len += 1;
                        }
                    }
                    if self.carry_len > 0 {
                        return Ok(n);
                    }
                }
                raw if raw < 0x20 => {
                    return Err(Error::codec(CodecErrorCode::InvalidSyntax, off));
                }
                raw => {
                    buf[n] = raw;
                    n += 1;
                }
            }
        }
        Ok(n)
    }

    fn container_continues(&mut self, map: bool, first: bool) -> Result<bool> {
        self.skip_ws()?;
        let off = self.src.position();
        let close = if map { b'}' } else { b']' };
        match self.src.peek_u8()? {
            None => Err(Error::codec(CodecErrorCode::UnexpectedEof, off)),
            Some(b) if b == close => {
                self.src.read_u8()?;
                Ok(false)
            }
            Some(b',') if !first => {
                self.src.read_u8()?;
                Ok(true)
            }
            Some(_) if first => Ok(true),
            Some(_) => Err(Error::codec(CodecErrorCode::InvalidSyntax, off)),
        }
    }

    fn pair_separator(&mut self) -> Result<()> {
        self.skip_ws()?;
        let off = self.src.position();
        if self.src.read_u8()? != b':' {
            return Err(Error::codec(CodecErrorCode::InvalidSyntax, off));
        }
        Ok(())
    }

    fn position(&self) -> u64 {
        self.src.position()
    }
}

/// Push-side JSON tokenizer over a [`Write`] sink. Emits minimal
/// (non-pretty) output.
pub struct JsonTokenWriter<W> {
    dst: W,
    /// Scalars written between `key` and `value` are key material and get
    /// quoted.
    in_key: bool,
    b64_carry: [u8; 2],
    b64_len: u8,
}

impl<W: Write> JsonTokenWriter<W> {
    /// Wrap a byte sink.
    pub const fn new(sink: W) -> Self {
        Self {
            dst: sink,
            in_key: false,
            b64_carry: [0; 2],
            b64_len: 0,
        }
    }

    /// Recover the byte sink.
    pub fn into_inner(self) -> W {
        self.dst
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.dst.write_all(bytes).map_err(Error::Io)
    }

    fn put_scalar(&mut self, repr: &[u8]) -> Result<()> {
        if self.in_key {
            self.put(b"\"")?;
            self.put(repr)?;
            self.put(b"\"")
        } else {
            self.put(repr)
        }
    }

    fn escape_into(&mut self, chunk: &[u8]) -> Result<()> {
        let mut start = 0;
        for (i, &b) in chunk.iter().enumerate() {
            if b != b'"' && b != b'\\' && b >= 0x20 {
                continue;
            }
            if start < i {
                self.put(&chunk[start..i])?;
            }
            match b {
                b'"' => self.put(b"\\\"")?,
                b'\\' => self.put(b"\\\\")?,
                0x08 => self.put(b"\\b")?,
                0x09 => self.put(b"\\t")?,
                0x0a => self.put(b"\\n")?,
                0x0c => self.put(b"\\f")?,
                0x0d => self.put(b"\\r")?,
                other => {
                    let mut esc = *b"\\u0000";
                    esc[4] = HEX[usize::from(other >> 4)];
                    esc[5] = HEX[usize::from(other & 0xf)];
                    self.put(&esc)?;
                }
            }
            start = i + 1;
        }
        if start < chunk.len() {
            self.put(&chunk[start..])?;
        }
        Ok(())
    }
}

const HEX: [u8; 16] = *b"0123456789abcdef";

impl<W: Write> TokenWrite for JsonTokenWriter<W> {
    fn write_unsigned(&mut self, value: u64) -> Result<()> {
        let repr = value.to_string();
        self.put_scalar(repr.as_bytes())
    }

    fn write_signed(&mut self, value: i64) -> Result<()> {
        let repr = value.to_string();
        self.put_scalar(repr.as_bytes())
    }

    fn write_float(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return self.put_scalar(b"null");
        }
        let mut repr = value.to_string();
        if !repr.contains(['.', 'e', 'E']) {
            repr.push_str(".0");
        }
        self.put_scalar(repr.as_bytes())
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.put_scalar(if value { &b"true"[..] } else { &b"false"[..] })
    }

    fn write_null(&mut self) -> Result<()> {
        self.put_scalar(b"null")
    }

    fn write_undefined(&mut self) -> Result<()> {
        self.put_scalar(b"null")
    }

    fn begin_bytes(&mut self, _len: Option<u64>) -> Result<()> {
        self.b64_len = 0;
        self.put(b"\"")
    }

    fn write_bytes_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        let mut data = chunk;
        if self.b64_len > 0 {
            let have = usize::from(self.b64_len);
            let need = 3 - have;
            if data.len() < need {
                self.b64_carry[have..have + data.len()].copy_from_slice(data);
                self.b64_len += data.len() as u8;
                return Ok(());
            }
            let mut triple = [0u8; 3];
            triple[..have].copy_from_slice(&self.b64_carry[..have]);
            triple[have..].copy_from_slice(&data[..need]);
            data = &data[need..];
            self.b64_len = 0;
            let encoded = STANDARD.encode(triple);
            self.put(encoded.as_bytes())?;
        }
        let whole = data.len() - data.len() % 3;
        if whole > 0 {
            let encoded = STANDARD.encode(&data[..whole]);
            self.put(encoded.as_bytes())?;
        }
        let rest = &data[whole..];
        self.b64_carry[..rest.len()].copy_from_slice(rest);
        self.b64_len = rest.len() as u8;
        Ok(())
    }

    fn end_bytes(&mut self, _sized: bool) -> Result<()> {
        if self.b64_len > 0 {
            let have = usize::from(self.b64_len);
            let encoded = STANDARD.encode(&self.b64_carry[..have]);
            self.b64_len = 0;
            self.put(encoded.as_bytes())?;
        }
        self.put(b"\"")
    }

    fn begin_text(&mut self, _len: Option<u64>) -> Result<()> {
        self.put(b"\"")
    }

    fn write_text_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.escape_into(chunk)
    }

    fn end_text(&mut self, _sized: bool) -> Result<()> {
        self.put(b"\"")
    }

    fn begin_array(&mut self, _len: Option<u64>) -> Result<()> {
        // A container in key position produces nonstandard JSON; its own
        // scalars are not key material.
        self.in_key = false;
        self.put(b"[")
    }

    fn end_array(&mut self, _sized: bool) -> Result<()> {
        self.put(b"]")
    }

    fn begin_map(&mut self, _len: Option<u64>) -> Result<()> {
        self.in_key = false;
        self.put(b"{")
    }

    fn end_map(&mut self, _sized: bool) -> Result<()> {
        self.put(b"}")
    }

    fn element(&mut self, first: bool) -> Result<()> {
        if first {
            Ok(())
        } else {
            self.put(b",")
        }
    }

    fn key(&mut self, first: bool) -> Result<()> {
        if !first {
            self.put(b",")?;
        }
        self.in_key = true;
        Ok(())
    }

    fn value(&mut self) -> Result<()> {
        self.in_key = false;
        self.put(b":")
    }

    fn flush(&mut self) -> Result<()> {
        self.dst.flush().map_err(Error::Io)
    }
}
