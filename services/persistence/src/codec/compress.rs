//! Optional bulk payload compression
//!
//! Compression is transparent to every downstream reader: the envelope
//! flag byte (bit 0) says whether the payload was compressed, and
//! decoders inflate before field parsing.

use super::CodecError;

/// Payload transform applied between field encoding and the envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Store the payload verbatim
    #[default]
    None,
    /// zstd bulk compression, default level
    Zstd,
}

/// Envelope flag bit marking a compressed payload
pub const FLAG_COMPRESSED: u8 = 0b0000_0001;

impl Compression {
    /// Compress a payload, returning the bytes and the flag byte to store
    pub fn compress(&self, payload: Vec<u8>) -> Result<(Vec<u8>, u8), CodecError> {
        match self {
            Compression::None => Ok((payload, 0)),
            Compression::Zstd => {
                let compressed = zstd::stream::encode_all(payload.as_slice(), 0)
                    .map_err(|e| CodecError::Compression(e.to_string()))?;
                Ok((compressed, FLAG_COMPRESSED))
            }
        }
    }
}

/// Inflate a payload according to the envelope flag byte
pub fn decompress(flags: u8, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    if flags & FLAG_COMPRESSED == 0 {
        return Ok(payload.to_vec());
    }
    zstd::stream::decode_all(payload).map_err(|e| CodecError::Compression(e.to_string()))
}
