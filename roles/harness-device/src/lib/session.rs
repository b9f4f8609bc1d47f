use cipher_sca::CipherEngine;
use codec_sca::{Decoder, Error as CodecError, Field, FieldLimits, Frame, Operation, ProtocolState};
use const_sca::NONCE_SIZE;
use masking_sca::{ChaChaPermutation, Permutation};
use tracing::{debug, trace, warn};

use crate::{
    buffers::{write_prefix, Buffers},
    config::DeviceConfig,
    error::DeviceResult,
    orchestrator::{Orchestrator, Response, RunParameters},
    signals::{Level, Signals},
};

/// Everything the device keeps for the whole uptime: the frame assembler, the stored fields and
/// the orchestrator. Connections come and go, the session stays.
#[derive(Debug)]
pub struct Session<E, S, P: Permutation = ChaChaPermutation> {
    decoder: Decoder,
    buffers: Buffers,
    orchestrator: Orchestrator<E, S, P>,
    busy: bool,
}

impl<E: CipherEngine, S: Signals> Session<E, S, ChaChaPermutation> {
    pub fn from_config(config: &DeviceConfig, engine: E, signals: S) -> DeviceResult<Self> {
        let limits = FieldLimits::new(config.max_message_len(), config.shares())?;
        let params = RunParameters {
            repeat_count: config.repeat_count(),
            fixed_key: config.fixed_key(),
        };
        Self::new(limits, params, engine, signals, ChaChaPermutation)
    }
}

impl<E: CipherEngine, S: Signals, P: Permutation> Session<E, S, P> {
    pub fn new(
        limits: FieldLimits,
        params: RunParameters,
        engine: E,
        signals: S,
        permutation: P,
    ) -> DeviceResult<Self> {
        let params = RunParameters {
            repeat_count: params.repeat_count.max(1),
            ..params
        };
        Ok(Self {
            decoder: Decoder::new(limits),
            buffers: Buffers::new(&limits, params.repeat_count, params.fixed_key),
            orchestrator: Orchestrator::new(
                limits.shares(),
                engine,
                signals,
                permutation,
                params,
            )?,
            busy: false,
        })
    }

    pub fn limits(&self) -> &FieldLimits {
        self.decoder.limits()
    }

    pub fn state(&self) -> ProtocolState {
        self.decoder.state()
    }

    pub fn buffers(&self) -> &Buffers {
        &self.buffers
    }

    pub fn nonce(&self) -> &[u8; NONCE_SIZE] {
        &self.buffers.nonce
    }

    pub fn orchestrator(&self) -> &Orchestrator<E, S, P> {
        &self.orchestrator
    }

    pub fn signals(&self) -> &S {
        self.orchestrator.signals()
    }

    /// Bytes still expected for the current header or payload.
    pub fn missing(&self) -> usize {
        self.decoder.missing()
    }

    /// Feed bytes received from the host, in chunks of any size. Returns the responses of the
    /// runs completed by these bytes, in order.
    pub fn receive(&mut self, mut bytes: &[u8]) -> Vec<Response> {
        let mut responses = Vec::new();
        while !bytes.is_empty() {
            let taken = self.decoder.push_bytes(bytes);
            bytes = &bytes[taken..];
            if self.decoder.missing() > 0 {
                break;
            }
            match self.decoder.next_frame() {
                Ok(frame) => {
                    if let Some(response) = self.handle_frame(frame) {
                        responses.push(response);
                    }
                }
                Err(CodecError::MissingBytes(n)) => {
                    trace!("Header accepted, waiting for {} bytes", n);
                    self.set_busy(true);
                }
                Err(CodecError::FramingError(e)) => {
                    warn!("Frame rejected: {}", e);
                    self.set_busy(false);
                }
            }
        }
        responses
    }

    /// Drop any partial frame and wait for a header. Stored fields are kept.
    pub fn reset_protocol(&mut self) {
        self.decoder.reset();
        self.set_busy(false);
    }

    /// Store the payload of a complete frame and run the requested operation, if any.
    pub fn handle_frame(&mut self, frame: Frame) -> Option<Response> {
        let header = *frame.header();
        debug!(
            field = ?header.field(),
            operation = ?header.operation(),
            len = header.len(),
            "Frame received"
        );
        if let Err(e) = self.store(header.field(), frame.payload()) {
            warn!("Failed to store {:?}: {}", header.field(), e);
            self.set_busy(false);
            return None;
        }

        let response = match header.operation() {
            Operation::Store => None,
            Operation::Encrypt => {
                self.set_busy(true);
                let Buffers {
                    ciphertext,
                    plaintext,
                    associated_data,
                    nonce,
                    ..
                } = &mut self.buffers;
                Some(self.orchestrator.encrypt(
                    ciphertext,
                    plaintext.as_slice(),
                    associated_data.as_slice(),
                    nonce,
                ))
            }
            Operation::Decrypt => {
                self.set_busy(true);
                let Buffers {
                    ciphertext,
                    plaintext,
                    associated_data,
                    nonce,
                    ..
                } = &mut self.buffers;
                Some(self.orchestrator.decrypt(
                    plaintext,
                    ciphertext.as_slice(),
                    associated_data.as_slice(),
                    nonce,
                ))
            }
        };
        self.set_busy(false);
        response
    }

    fn store(&mut self, field: Field, payload: &[u8]) -> DeviceResult<()> {
        match field {
            Field::Ciphertext => self.buffers.ciphertext.store(payload),
            Field::AssociatedData => self.buffers.associated_data.store(payload),
            Field::Plaintext => self.buffers.plaintext.store(payload),
            Field::Nonce => write_prefix(field, &mut self.buffers.nonce, payload),
            Field::Key => self.orchestrator.load_key(payload),
            Field::Seed => {
                write_prefix(field, &mut self.buffers.seed, payload)?;
                self.orchestrator.reseed(&self.buffers.seed);
                Ok(())
            }
            Field::RepeatCount => {
                let previous = self.buffers.repeat_count;
                write_prefix(field, &mut self.buffers.repeat_count, payload)?;
                if !self
                    .orchestrator
                    .set_repeat_count(self.buffers.repeat_count())
                {
                    self.buffers.repeat_count = previous;
                }
                Ok(())
            }
            Field::FixedKey => {
                write_prefix(field, &mut self.buffers.fixed_key, payload)?;
                self.orchestrator.set_fixed_key(self.buffers.fixed_key());
                Ok(())
            }
        }
    }

    fn set_busy(&mut self, busy: bool) {
        if self.busy != busy {
            self.busy = busy;
            let level = if busy { Level::High } else { Level::Low };
            self.orchestrator.signals_mut().busy(level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{RecordingSignals, SignalEvent};
    use cipher_sca::ReferenceEngine;
    use codec_sca::Header;

    fn session() -> Session<ReferenceEngine, RecordingSignals> {
        Session::new(
            FieldLimits::new(256, 2).unwrap(),
            RunParameters::default(),
            ReferenceEngine::new(),
            RecordingSignals::new(),
            ChaChaPermutation,
        )
        .unwrap()
    }

    fn header(field: Field, operation: Operation, len: usize) -> [u8; 4] {
        Header::new(field, operation, len).unwrap().to_bytes()
    }

    #[test]
    fn busy_follows_data_phase() {
        let mut s = session();
        s.receive(&header(Field::Plaintext, Operation::Store, 2));
        assert!(s.state().is_awaiting_data());
        assert_eq!(s.signals().busy_level(), Level::High);
        s.receive(b"A");
        assert_eq!(s.signals().busy_level(), Level::High);
        s.receive(b"B");
        assert_eq!(s.signals().busy_level(), Level::Low);
        assert_eq!(s.buffers().plaintext.as_slice(), b"AB");
        assert_eq!(
            s.signals().events(),
            &[SignalEvent::Busy(Level::High), SignalEvent::Busy(Level::Low)]
        );
    }

    #[test]
    fn nonce_prefix_write_keeps_remaining_bytes() {
        let mut s = session();
        let mut bytes = header(Field::Nonce, Operation::Store, 16).to_vec();
        bytes.extend_from_slice(&[0xee; 16]);
        bytes.extend_from_slice(&header(Field::Nonce, Operation::Store, 3));
        bytes.extend_from_slice(&[1, 2, 3]);
        assert!(s.receive(&bytes).is_empty());
        let mut expected = [0xee; 16];
        expected[..3].copy_from_slice(&[1, 2, 3]);
        assert_eq!(s.nonce(), &expected);
    }

    #[test]
    fn repeat_count_zero_keeps_previous_value() {
        let mut s = session();
        let mut bytes = header(Field::RepeatCount, Operation::Store, 4).to_vec();
        bytes.extend_from_slice(&5u32.to_le_bytes());
        bytes.extend_from_slice(&header(Field::RepeatCount, Operation::Store, 4));
        bytes.extend_from_slice(&0u32.to_le_bytes());
        s.receive(&bytes);
        assert_eq!(s.orchestrator().params().repeat_count, 5);
        assert_eq!(s.buffers().repeat_count(), 5);
    }

    #[test]
    fn seed_frame_reseeds_the_shadow_state() {
        let mut s = session();
        let mut bytes = header(Field::Seed, Operation::Store, 16).to_vec();
        bytes.extend_from_slice(&[1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0]);
        s.receive(&bytes);
        let bundles = s.orchestrator().shadow().bundles();
        assert_eq!(bundles[0], [1, 2, 3, 4]);
        assert_eq!(&bundles[1..], &[[0; 4]; 3]);
    }

    #[test]
    fn key_frame_sets_the_baseline() {
        let mut s = session();
        let mut bytes = header(Field::Key, Operation::Store, 32).to_vec();
        bytes.extend((0u8..32).collect::<Vec<u8>>());
        s.receive(&bytes);
        assert_eq!(s.orchestrator().key().to_bytes(), (0u8..32).collect::<Vec<u8>>());
        assert_eq!(s.orchestrator().initial_key(), s.orchestrator().key());
    }
}
