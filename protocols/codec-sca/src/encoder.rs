use alloc::vec::Vec;
use framing_sca::Frame;

use crate::error::Result;

#[derive(Debug, Default)]
pub struct Encoder {
    buffer: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Serialize `frame`; the returned slice is valid until the next call.
    #[inline]
    pub fn encode(&mut self, frame: &Frame) -> Result<&[u8]> {
        let len = frame.encoded_length();
        self.buffer.clear();
        self.buffer.resize(len, 0);
        frame.serialize(&mut self.buffer[..len])?;
        Ok(&self.buffer[..len])
    }
}
