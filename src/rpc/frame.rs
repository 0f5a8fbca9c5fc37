//! Length-prefixed message framing for the binary wire surface.
//!
//! A unary message travels as exactly one frame: a compressed flag byte,
//! a big-endian u32 payload length, then the payload.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Size of the flag + length prefix.
pub const HEADER_LEN: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame truncated: expected {expected} bytes, have {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("message of {len} bytes exceeds the {max} byte limit")]
    Oversize { len: usize, max: usize },

    #[error("compressed frames are not supported")]
    Compressed,

    #[error("{0} trailing bytes after the message frame")]
    Trailing(usize),
}

/// Wrap a payload in a single uncompressed frame.
pub fn encode(payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    buf.put_u8(0);
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    buf.freeze()
}

/// Decode exactly one frame from a unary request body.
pub fn decode(buf: &[u8], max_message_bytes: usize) -> Result<Bytes, FrameError> {
    if buf.len() < HEADER_LEN {
        return Err(FrameError::Truncated {
            expected: HEADER_LEN,
            actual: buf.len(),
        });
    }
    if buf[0] != 0 {
        return Err(FrameError::Compressed);
    }
    let len = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]) as usize;
    if len > max_message_bytes {
        return Err(FrameError::Oversize {
            len,
            max: max_message_bytes,
        });
    }
    let total = HEADER_LEN + len;
    if buf.len() < total {
        return Err(FrameError::Truncated {
            expected: total,
            actual: buf.len(),
        });
    }
    if buf.len() > total {
        return Err(FrameError::Trailing(buf.len() - total));
    }
    Ok(Bytes::copy_from_slice(&buf[HEADER_LEN..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let framed = encode(b"{\"message\":\"hi\"}");
        let payload = decode(&framed, 1024).unwrap();
        assert_eq!(&payload[..], b"{\"message\":\"hi\"}");
    }

    #[test]
    fn empty_payload_roundtrip() {
        let framed = encode(b"");
        assert_eq!(framed.len(), HEADER_LEN);
        assert!(decode(&framed, 1024).unwrap().is_empty());
    }

    #[test]
    fn truncated_header() {
        assert_eq!(
            decode(b"\x00\x00", 1024),
            Err(FrameError::Truncated {
                expected: HEADER_LEN,
                actual: 2
            })
        );
    }

    #[test]
    fn truncated_payload() {
        let mut framed = encode(b"hello").to_vec();
        framed.truncate(framed.len() - 2);
        assert!(matches!(
            decode(&framed, 1024),
            Err(FrameError::Truncated { .. })
        ));
    }

    #[test]
    fn compressed_flag_rejected() {
        let mut framed = encode(b"hello").to_vec();
        framed[0] = 1;
        assert_eq!(decode(&framed, 1024), Err(FrameError::Compressed));
    }

    #[test]
    fn oversize_rejected() {
        let framed = encode(b"hello world");
        assert_eq!(
            decode(&framed, 4),
            Err(FrameError::Oversize { len: 11, max: 4 })
        );
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut framed = encode(b"hello").to_vec();
        framed.extend_from_slice(b"junk");
        assert_eq!(decode(&framed, 1024), Err(FrameError::Trailing(4)));
    }
}
