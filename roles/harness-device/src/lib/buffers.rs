use codec_sca::{framing_sca::Error as FramingError, Field, FieldLimits};
use const_sca::{NONCE_SIZE, SEED_SIZE, WORD_SIZE};

use crate::error::{DeviceError, DeviceResult};

/// Byte storage of fixed capacity with a logical length.
#[derive(Debug, Clone)]
pub struct BoundedBuffer {
    field: Field,
    data: Vec<u8>,
    len: usize,
}

impl BoundedBuffer {
    pub fn new(field: Field, capacity: usize) -> Self {
        Self {
            field,
            data: vec![0; capacity],
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Replace the content, the logical length becomes `payload.len()`.
    pub fn store(&mut self, payload: &[u8]) -> DeviceResult<()> {
        self.check(payload.len())?;
        self.data[..payload.len()].copy_from_slice(payload);
        self.len = payload.len();
        Ok(())
    }

    /// Whole backing storage, for producers that report how much they wrote.
    pub fn storage_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn set_len(&mut self, len: usize) -> DeviceResult<()> {
        self.check(len)?;
        self.len = len;
        Ok(())
    }

    fn check(&self, len: usize) -> DeviceResult<()> {
        if len > self.capacity() {
            return Err(FramingError::CapacityExceeded {
                field: self.field,
                length: len,
                capacity: self.capacity(),
            }
            .into());
        }
        Ok(())
    }
}

/// Overwrite the first `payload.len()` bytes of a fixed size destination.
pub fn write_prefix(field: Field, dst: &mut [u8], payload: &[u8]) -> DeviceResult<()> {
    if payload.len() > dst.len() {
        return Err(DeviceError::Framing(FramingError::CapacityExceeded {
            field,
            length: payload.len(),
            capacity: dst.len(),
        }));
    }
    dst[..payload.len()].copy_from_slice(payload);
    Ok(())
}

/// Every device destination except the key, which is owned by the orchestrator.
#[derive(Debug, Clone)]
pub struct Buffers {
    pub ciphertext: BoundedBuffer,
    pub associated_data: BoundedBuffer,
    pub plaintext: BoundedBuffer,
    pub nonce: [u8; NONCE_SIZE],
    pub seed: [u8; SEED_SIZE],
    pub repeat_count: [u8; WORD_SIZE],
    pub fixed_key: [u8; WORD_SIZE],
}

impl Buffers {
    pub fn new(limits: &FieldLimits, repeat_count: u32, fixed_key: bool) -> Self {
        Self {
            ciphertext: BoundedBuffer::new(Field::Ciphertext, limits.capacity(Field::Ciphertext)),
            associated_data: BoundedBuffer::new(
                Field::AssociatedData,
                limits.capacity(Field::AssociatedData),
            ),
            plaintext: BoundedBuffer::new(Field::Plaintext, limits.capacity(Field::Plaintext)),
            nonce: [0; NONCE_SIZE],
            seed: [0; SEED_SIZE],
            repeat_count: repeat_count.to_le_bytes(),
            fixed_key: (fixed_key as u32).to_le_bytes(),
        }
    }

    pub fn repeat_count(&self) -> u32 {
        u32::from_le_bytes(self.repeat_count)
    }

    /// Any non zero word enables the fixed key mode.
    pub fn fixed_key(&self) -> bool {
        u32::from_le_bytes(self.fixed_key) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_sets_logical_length_and_rejects_overflow() {
        let mut buffer = BoundedBuffer::new(Field::Plaintext, 4);
        buffer.store(b"abc").unwrap();
        assert_eq!(buffer.as_slice(), b"abc");
        buffer.store(b"").unwrap();
        assert!(buffer.is_empty());
        assert!(buffer.store(b"abcde").is_err());
        assert!(buffer.is_empty());
    }

    #[test]
    fn prefix_write_keeps_the_tail() {
        let mut nonce = [0xaa; 4];
        write_prefix(Field::Nonce, &mut nonce, &[1, 2]).unwrap();
        assert_eq!(nonce, [1, 2, 0xaa, 0xaa]);
        assert!(write_prefix(Field::Nonce, &mut nonce, &[0; 5]).is_err());
    }

    #[test]
    fn fixed_key_is_any_non_zero_word() {
        let limits = FieldLimits::new(16, 2).unwrap();
        let mut buffers = Buffers::new(&limits, 1, false);
        assert!(!buffers.fixed_key());
        buffers.fixed_key = [0, 0, 0x80, 0];
        assert!(buffers.fixed_key());
        assert_eq!(buffers.ciphertext.capacity(), 32);
    }
}
