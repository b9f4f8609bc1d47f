use crate::error::{Error, Result};
use const_sca::{
    FIELD_ASSOCIATED_DATA, FIELD_CIPHERTEXT, FIELD_FIXED_KEY, FIELD_KEY, FIELD_NONCE,
    FIELD_PLAINTEXT, FIELD_REPEAT_COUNT, FIELD_SEED, KEY_WORDS, MAX_SHARES, NONCE_SIZE,
    OPERATION_DECRYPT, OPERATION_ENCRYPT, OPERATION_STORE, SEED_SIZE, TAG_SIZE, WORD_SIZE,
};
use core::convert::TryFrom;

/// Destination of a frame payload on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Ciphertext,
    AssociatedData,
    Plaintext,
    Nonce,
    /// The D-way masked key, `KEY_WORDS * shares` little endian words.
    Key,
    /// Seed loaded into slot 0 of the shadow state.
    Seed,
    /// Number of encryptions executed by one run, a little endian `u32`.
    RepeatCount,
    /// Non zero when the key is refreshed rather than re-randomized between runs.
    FixedKey,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Ciphertext,
        Field::AssociatedData,
        Field::Plaintext,
        Field::Nonce,
        Field::Key,
        Field::Seed,
        Field::RepeatCount,
        Field::FixedKey,
    ];

    pub fn id(&self) -> u8 {
        (*self).into()
    }
}

impl TryFrom<u8> for Field {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            FIELD_CIPHERTEXT => Ok(Field::Ciphertext),
            FIELD_ASSOCIATED_DATA => Ok(Field::AssociatedData),
            FIELD_PLAINTEXT => Ok(Field::Plaintext),
            FIELD_NONCE => Ok(Field::Nonce),
            FIELD_KEY => Ok(Field::Key),
            FIELD_SEED => Ok(Field::Seed),
            FIELD_REPEAT_COUNT => Ok(Field::RepeatCount),
            FIELD_FIXED_KEY => Ok(Field::FixedKey),
            other => Err(Error::UnknownField(other)),
        }
    }
}

impl From<Field> for u8 {
    fn from(field: Field) -> Self {
        match field {
            Field::Ciphertext => FIELD_CIPHERTEXT,
            Field::AssociatedData => FIELD_ASSOCIATED_DATA,
            Field::Plaintext => FIELD_PLAINTEXT,
            Field::Nonce => FIELD_NONCE,
            Field::Key => FIELD_KEY,
            Field::Seed => FIELD_SEED,
            Field::RepeatCount => FIELD_REPEAT_COUNT,
            Field::FixedKey => FIELD_FIXED_KEY,
        }
    }
}

/// What the device does once the payload of a frame is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Store,
    Encrypt,
    Decrypt,
}

impl Operation {
    pub fn runs_cipher(&self) -> bool {
        !matches!(self, Operation::Store)
    }
}

impl TryFrom<u8> for Operation {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            OPERATION_STORE => Ok(Operation::Store),
            OPERATION_ENCRYPT => Ok(Operation::Encrypt),
            OPERATION_DECRYPT => Ok(Operation::Decrypt),
            other => Err(Error::UnknownOperation(other)),
        }
    }
}

impl From<Operation> for u8 {
    fn from(operation: Operation) -> Self {
        match operation {
            Operation::Store => OPERATION_STORE,
            Operation::Encrypt => OPERATION_ENCRYPT,
            Operation::Decrypt => OPERATION_DECRYPT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    field: Field,
    operation: Operation,
    length: u16,
}

impl Header {
    pub const FIELD_OFFSET: usize = const_sca::HEADER_FIELD_OFFSET;
    pub const OPERATION_OFFSET: usize = const_sca::HEADER_OPERATION_OFFSET;
    pub const LEN_OFFSET: usize = const_sca::HEADER_LEN_OFFSET;
    pub const LEN_SIZE: usize = const_sca::HEADER_LEN_SIZE;
    pub const LEN_END: usize = Self::LEN_OFFSET + Self::LEN_SIZE;

    pub const SIZE: usize = const_sca::HEADER_SIZE;

    #[inline]
    pub fn new(field: Field, operation: Operation, length: usize) -> Result<Self> {
        let length = u16::try_from(length).map_err(|_| Error::LengthOverflow(length))?;
        Ok(Self {
            field,
            operation,
            length,
        })
    }

    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(Error::UnexpectedHeaderLength(
                (Self::SIZE - bytes.len()) as isize,
            ));
        };

        let field = Field::try_from(bytes[Self::FIELD_OFFSET])?;
        let operation = Operation::try_from(bytes[Self::OPERATION_OFFSET])?;
        let length = u16::from_le_bytes([bytes[Self::LEN_OFFSET], bytes[Self::LEN_OFFSET + 1]]);

        Ok(Self {
            field,
            operation,
            length,
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let len = self.length.to_le_bytes();
        [self.field.into(), self.operation.into(), len[0], len[1]]
    }

    #[allow(clippy::len_without_is_empty)]
    #[inline]
    pub fn len(&self) -> usize {
        self.length as usize
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }
}

/// Capacity of every device destination for a given message size and masking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLimits {
    max_message_len: usize,
    shares: usize,
}

impl FieldLimits {
    pub fn new(max_message_len: usize, shares: usize) -> Result<Self> {
        if shares == 0 || shares > MAX_SHARES {
            return Err(Error::InvalidShares(shares));
        }
        Ok(Self {
            max_message_len,
            shares,
        })
    }

    pub fn max_message_len(&self) -> usize {
        self.max_message_len
    }

    pub fn shares(&self) -> usize {
        self.shares
    }

    pub fn capacity(&self, field: Field) -> usize {
        match field {
            Field::Ciphertext => self.max_message_len + TAG_SIZE,
            Field::AssociatedData | Field::Plaintext => self.max_message_len,
            Field::Nonce => NONCE_SIZE,
            Field::Key => KEY_WORDS * self.shares * WORD_SIZE,
            Field::Seed => SEED_SIZE,
            Field::RepeatCount | Field::FixedKey => WORD_SIZE,
        }
    }

    /// Largest capacity over all fields.
    pub fn max_capacity(&self) -> usize {
        Field::ALL
            .iter()
            .map(|f| self.capacity(*f))
            .max()
            .unwrap_or(0)
    }

    #[inline]
    pub fn check(&self, header: &Header) -> Result<()> {
        let capacity = self.capacity(header.field());
        if header.len() > capacity {
            return Err(Error::CapacityExceeded {
                field: header.field(),
                length: header.len(),
                capacity,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_from_bytes_reads_little_endian_length() {
        let header = Header::from_bytes(&[2, 1, 0x34, 0x01]).unwrap();
        assert_eq!(header.field(), Field::Plaintext);
        assert_eq!(header.operation(), Operation::Encrypt);
        assert_eq!(header.len(), 0x134);
        assert_eq!(header.to_bytes(), [2, 1, 0x34, 0x01]);
    }

    #[test]
    fn header_from_short_slice_fails() {
        let err = Header::from_bytes(&[2, 1]).unwrap_err();
        assert_eq!(err, Error::UnexpectedHeaderLength(2));
    }

    #[test]
    fn unknown_field_and_operation_are_rejected() {
        assert_eq!(
            Header::from_bytes(&[8, 0, 0, 0]).unwrap_err(),
            Error::UnknownField(8)
        );
        assert_eq!(
            Header::from_bytes(&[0, 3, 0, 0]).unwrap_err(),
            Error::UnknownOperation(3)
        );
    }

    #[test]
    fn payload_larger_than_u16_does_not_fit() {
        let err = Header::new(Field::Plaintext, Operation::Store, 70_000).unwrap_err();
        assert_eq!(err, Error::LengthOverflow(70_000));
    }

    #[test]
    fn capacity_boundary_is_inclusive() {
        let limits = FieldLimits::new(256, 3).unwrap();
        let at = Header::new(Field::Ciphertext, Operation::Store, 256 + TAG_SIZE).unwrap();
        let above = Header::new(Field::Ciphertext, Operation::Store, 257 + TAG_SIZE).unwrap();
        assert!(limits.check(&at).is_ok());
        assert_eq!(
            limits.check(&above).unwrap_err(),
            Error::CapacityExceeded {
                field: Field::Ciphertext,
                length: 257 + TAG_SIZE,
                capacity: 256 + TAG_SIZE
            }
        );

        let key = Header::new(Field::Key, Operation::Store, 48).unwrap();
        assert!(limits.check(&key).is_ok());
        let key = Header::new(Field::Key, Operation::Store, 49).unwrap();
        assert!(limits.check(&key).is_err());
    }

    #[test]
    fn shares_out_of_range_are_rejected() {
        assert_eq!(FieldLimits::new(256, 0), Err(Error::InvalidShares(0)));
        assert_eq!(
            FieldLimits::new(256, MAX_SHARES + 1),
            Err(Error::InvalidShares(MAX_SHARES + 1))
        );
    }
}
