//! Growable byte writer and cursor-based reader
//!
//! All multi-byte integers are big-endian. Strings are encoded as a
//! 4-byte length that includes one trailing NUL terminator, followed by
//! the UTF-8 bytes and the NUL.

use super::CodecError;
use rust_decimal::Decimal;

/// Append-only byte buffer used to build record payloads
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    /// Length prefix counts the trailing NUL terminator
    pub fn put_string(&mut self, s: &str) {
        self.put_u32(s.len() as u32 + 1);
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
    }

    /// Decimals travel as their literal string form, scale preserved
    pub fn put_decimal(&mut self, d: &Decimal) {
        self.put_string(&d.to_string());
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over a record payload, reading fields in write order
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::FormatInvalid(format!(
                "truncated field: need {} bytes, have {}",
                n,
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let slice = self.take(N)?;
        let mut arr = [0u8; N];
        arr.copy_from_slice(slice);
        Ok(arr)
    }

    pub fn get_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    pub fn get_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    pub fn get_i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    pub fn get_u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_be_bytes(self.take_array()?))
    }

    pub fn get_i64(&mut self) -> Result<i64, CodecError> {
        Ok(i64::from_be_bytes(self.take_array()?))
    }

    pub fn get_string(&mut self) -> Result<String, CodecError> {
        let len = self.get_u32()? as usize;
        if len == 0 {
            return Err(CodecError::FormatInvalid(
                "string length must include NUL terminator".into(),
            ));
        }
        let bytes = self.take(len)?;
        if bytes[len - 1] != 0 {
            return Err(CodecError::FormatInvalid("string missing NUL terminator".into()));
        }
        String::from_utf8(bytes[..len - 1].to_vec())
            .map_err(|e| CodecError::FormatInvalid(format!("invalid UTF-8 string: {}", e)))
    }

    pub fn get_decimal(&mut self) -> Result<Decimal, CodecError> {
        let s = self.get_string()?;
        s.parse()
            .map_err(|e| CodecError::FormatInvalid(format!("invalid decimal '{}': {}", s, e)))
    }
}
