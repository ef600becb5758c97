use std::io::{self, Read};

use crate::error::{CodecErrorCode, Error, Result};

/// Byte cursor over a [`Read`] source shared by both token readers.
///
/// Adds the one byte of lookahead the tokenizers need (CBOR break detection,
/// JSON delimiter peeking), retries `Interrupted`, and counts consumed bytes
/// for error offsets.
pub(crate) struct ByteReader<R> {
    inner: R,
    peeked: Option<u8>,
    pos: u64,
}

impl<R: Read> ByteReader<R> {
    pub(crate) const fn new(inner: R) -> Self {
        Self {
            inner,
            peeked: None,
            pos: 0,
        }
    }

    pub(crate) fn into_inner(self) -> R {
        self.inner
    }

    /// Bytes consumed so far. A peeked but unconsumed byte does not count.
    pub(crate) const fn position(&self) -> u64 {
        self.pos
    }

    fn next_raw(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    /// Look at the next byte without consuming it. `None` at end of stream.
    pub(crate) fn peek_u8(&mut self) -> Result<Option<u8>> {
        if self.peeked.is_none() {
            self.peeked = self.next_raw()?;
        }
        Ok(self.peeked)
    }

    /// Consume one byte; end of stream is a codec error.
    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        let b = match self.peeked.take() {
            Some(b) => b,
            None => self
                .next_raw()?
                .ok_or(Error::codec(CodecErrorCode::UnexpectedEof, self.pos))?,
        };
        self.pos += 1;
        Ok(b)
    }

    /// Fill `buf` completely; a short source is a codec error.
    pub(crate) fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        if let Some(b) = self.peeked.take() {
            if buf.is_empty() {
                self.peeked = Some(b);
                return Ok(());
            }
            buf[0] = b;
            self.pos += 1;
            filled = 1;
        }
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => return Err(Error::codec(CodecErrorCode::UnexpectedEof, self.pos)),
                Ok(n) => {
                    filled += n;
                    self.pos += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(())
    }

    /// Pull at most `buf.len()` bytes; 0 only at end of stream.
    pub(crate) fn read_some(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if let Some(b) = self.peeked.take() {
            buf[0] = b;
            self.pos += 1;
            return Ok(1);
        }
        loop {
            match self.inner.read(buf) {
                Ok(n) => {
                    self.pos += n as u64;
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    pub(crate) fn read_be_u16(&mut self) -> Result<u16> {
        let mut b = [0u8; 2];
        self.read_exact(&mut b)?;
        Ok(u16::from_be_bytes(b))
    }

    pub(crate) fn read_be_u32(&mut self) -> Result<u32> {
        let mut b = [0u8; 4];
        self.read_exact(&mut b)?;
        Ok(u32::from_be_bytes(b))
    }

    pub(crate) fn read_be_u64(&mut self) -> Result<u64> {
        let mut b = [0u8; 8];
        self.read_exact(&mut b)?;
        Ok(u64::from_be_bytes(b))
    }
}
