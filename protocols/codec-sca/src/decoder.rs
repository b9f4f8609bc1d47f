use alloc::{vec, vec::Vec};
use framing_sca::{FieldLimits, Frame, Header};

use crate::error::{Error, Result};

/// Where the decoder is in the header/payload cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolState {
    AwaitingHeader,
    /// A valid header with a non empty payload has been received.
    AwaitingData(Header),
}

impl ProtocolState {
    pub fn is_awaiting_data(&self) -> bool {
        matches!(self, ProtocolState::AwaitingData(_))
    }
}

/// Reassembles frames from a byte stream delivered in arbitrary chunks.
///
/// Bytes can be handed over in two ways. `writable` returns a slice of exactly the number of
/// bytes the decoder is missing, to be filled completely by the caller (e.g. with
/// `read_exact`). `push_bytes` copies as many bytes as are missing from a chunk of any size and
/// reports how many were consumed. In both cases `next_frame` is then called: it returns
/// `Error::MissingBytes` until a frame is complete.
///
/// Headers naming an unknown field or operation, or a length above the capacity of the
/// destination, are rejected with `Error::FramingError` and the decoder goes back to waiting for
/// a header. No payload byte is ever buffered for a rejected header.
#[derive(Debug)]
pub struct Decoder {
    limits: FieldLimits,
    state: ProtocolState,
    missing_b: usize,
    buffer: Vec<u8>,
    cursor: usize,
}

impl Decoder {
    pub fn new(limits: FieldLimits) -> Self {
        let size = usize::max(limits.max_capacity(), Header::SIZE);
        Self {
            limits,
            state: ProtocolState::AwaitingHeader,
            missing_b: Header::SIZE,
            buffer: vec![0; size],
            cursor: 0,
        }
    }

    pub fn limits(&self) -> &FieldLimits {
        &self.limits
    }

    pub fn state(&self) -> ProtocolState {
        self.state
    }

    /// Bytes still needed to complete the current header or payload.
    pub fn missing(&self) -> usize {
        self.missing_b
    }

    #[inline]
    pub fn writable(&mut self) -> &mut [u8] {
        let start = self.cursor;
        let end = start + self.missing_b;
        debug_assert!(end <= self.buffer.len());
        self.cursor = end;
        self.missing_b = 0;
        &mut self.buffer[start..end]
    }

    /// Copy up to `missing()` bytes from `src`, returns how many were taken.
    #[inline]
    pub fn push_bytes(&mut self, src: &[u8]) -> usize {
        let n = usize::min(self.missing_b, src.len());
        let start = self.cursor;
        self.buffer[start..start + n].copy_from_slice(&src[..n]);
        self.cursor += n;
        self.missing_b -= n;
        n
    }

    #[inline]
    pub fn next_frame(&mut self) -> Result<Frame> {
        if self.missing_b > 0 {
            return Err(Error::MissingBytes(self.missing_b));
        }

        match self.state {
            ProtocolState::AwaitingHeader => {
                let header = Header::from_bytes(&self.buffer[..self.cursor]);
                self.cursor = 0;
                let header = match header.and_then(|h| self.limits.check(&h).map(|_| h)) {
                    Ok(header) => header,
                    Err(e) => {
                        self.reset();
                        return Err(e.into());
                    }
                };

                // ZERO LENGTH FIELDS HAVE NO DATA PHASE
                if header.is_empty() {
                    self.missing_b = Header::SIZE;
                    return Ok(Frame::from_parts_unchecked(header, Vec::new()));
                }

                self.state = ProtocolState::AwaitingData(header);
                self.missing_b = header.len();
                Err(Error::MissingBytes(self.missing_b))
            }
            ProtocolState::AwaitingData(header) => {
                let payload = self.buffer[..self.cursor].to_vec();
                self.reset();
                Ok(Frame::from_parts_unchecked(header, payload))
            }
        }
    }

    /// Drop any partial header or payload and wait for a new header.
    pub fn reset(&mut self) {
        self.state = ProtocolState::AwaitingHeader;
        self.missing_b = Header::SIZE;
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framing_sca::{Field, Operation};

    fn decoder() -> Decoder {
        Decoder::new(FieldLimits::new(256, 2).unwrap())
    }

    fn feed(decoder: &mut Decoder, mut bytes: &[u8]) -> Vec<Result<Frame>> {
        let mut out = Vec::new();
        while !bytes.is_empty() {
            let n = decoder.push_bytes(bytes);
            bytes = &bytes[n..];
            match decoder.next_frame() {
                Err(Error::MissingBytes(_)) => (),
                other => out.push(other),
            }
        }
        out
    }

    #[test]
    fn header_then_payload_with_writable() {
        let mut decoder = decoder();
        decoder.writable().copy_from_slice(&[2, 0, 3, 0]);
        assert_eq!(decoder.next_frame(), Err(Error::MissingBytes(3)));
        assert!(decoder.state().is_awaiting_data());

        decoder.writable().copy_from_slice(b"abc");
        let frame = decoder.next_frame().unwrap();
        assert_eq!(frame.header().field(), Field::Plaintext);
        assert_eq!(frame.payload(), b"abc");
        assert_eq!(decoder.state(), ProtocolState::AwaitingHeader);
        assert_eq!(decoder.missing(), Header::SIZE);
    }

    #[test]
    fn byte_by_byte_delivery() {
        let mut decoder = decoder();
        let stream = [3, 1, 2, 0, 7, 8];
        let mut frames = Vec::new();
        for b in stream.iter() {
            frames.extend(feed(&mut decoder, core::slice::from_ref(b)));
        }
        assert_eq!(frames.len(), 1);
        let frame = frames.pop().unwrap().unwrap();
        assert_eq!(frame.header().operation(), Operation::Encrypt);
        assert_eq!(frame.payload(), &[7, 8]);
    }

    #[test]
    fn zero_length_field_has_no_data_phase() {
        let mut decoder = decoder();
        let frames = feed(&mut decoder, &[1, 0, 0, 0, 2, 0, 1, 0, b'x']);
        assert_eq!(frames.len(), 2);
        let empty = frames[0].as_ref().unwrap();
        assert_eq!(empty.header().field(), Field::AssociatedData);
        assert!(empty.payload().is_empty());
        let next = frames[1].as_ref().unwrap();
        assert_eq!(next.header().field(), Field::Plaintext);
        assert_eq!(next.payload(), b"x");
    }

    #[test]
    fn unknown_field_resets_to_header() {
        let mut decoder = decoder();
        let frames = feed(&mut decoder, &[9, 0, 4, 0, 2, 0, 1, 0, b'y']);
        assert_eq!(
            frames[0],
            Err(Error::FramingError(framing_sca::Error::UnknownField(9)))
        );
        assert_eq!(frames[1].as_ref().unwrap().payload(), b"y");
        assert_eq!(decoder.state(), ProtocolState::AwaitingHeader);
    }

    #[test]
    fn length_above_capacity_is_rejected() {
        let mut decoder = decoder();
        // 272 bytes is the ciphertext capacity for 256 byte messages
        let at = feed(&mut decoder, &[0, 0, 0x10, 0x01]);
        assert!(at.is_empty());
        assert_eq!(decoder.missing(), 272);

        let mut decoder = self::decoder();
        let above = feed(&mut decoder, &[0, 0, 0x11, 0x01]);
        assert_eq!(
            above[0],
            Err(Error::FramingError(
                framing_sca::Error::CapacityExceeded {
                    field: Field::Ciphertext,
                    length: 273,
                    capacity: 272
                }
            ))
        );
        assert_eq!(decoder.state(), ProtocolState::AwaitingHeader);
    }
}
