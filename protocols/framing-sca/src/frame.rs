use crate::{
    error::{Error, Result},
    header::{Field, Header, Operation},
};
use alloc::vec::Vec;

/// A header together with its complete payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    header: Header,
    payload: Vec<u8>,
}

impl Frame {
    /// Builds a frame around `payload`, fails if the payload is too long for the length field.
    pub fn from_payload(field: Field, operation: Operation, payload: Vec<u8>) -> Result<Self> {
        let header = Header::new(field, operation, payload.len())?;
        Ok(Self { header, payload })
    }

    /// Caller must make sure that `payload.len() == header.len()`.
    pub fn from_parts_unchecked(header: Header, payload: Vec<u8>) -> Self {
        Self { header, payload }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    #[inline]
    pub fn encoded_length(&self) -> usize {
        Header::SIZE + self.payload.len()
    }

    /// Write the serialized frame into `dst`.
    #[inline]
    pub fn serialize(&self, dst: &mut [u8]) -> Result<()> {
        let len = self.encoded_length();
        if dst.len() < len {
            return Err(Error::WriteBufferTooSmall {
                needed: len,
                available: dst.len(),
            });
        }
        dst[..Header::SIZE].copy_from_slice(&self.header.to_bytes());
        dst[Header::SIZE..len].copy_from_slice(&self.payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn serialize_prepends_header() {
        let frame = Frame::from_payload(Field::Nonce, Operation::Encrypt, vec![9; 16]).unwrap();
        let mut dst = [0u8; 20];
        frame.serialize(&mut dst).unwrap();
        assert_eq!(&dst[..4], &[3, 1, 16, 0]);
        assert_eq!(&dst[4..], &[9; 16]);
    }

    #[test]
    fn serialize_into_short_buffer_fails() {
        let frame = Frame::from_payload(Field::Seed, Operation::Store, vec![0; 16]).unwrap();
        let mut dst = [0u8; 10];
        assert_eq!(
            frame.serialize(&mut dst),
            Err(Error::WriteBufferTooSmall {
                needed: 20,
                available: 10
            })
        );
    }
}
