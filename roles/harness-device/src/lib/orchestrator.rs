//! Runs the cipher on the stored fields and keeps the key and the shadow state moving between
//! runs.
//!
//! An encrypt run repeats the cipher call `repeat_count` times. Before each call the cipher PRNG
//! is reseeded from the cipher slot of the shadow state; after it the shadow state is rotated,
//! the nonce is taken from the nonce slot and the key is re-masked with a PRNG seeded from the
//! refresh slot. Every value used by iteration `i` is a function of the seed, nonce and key
//! loaded by the host, so the host can replay the run offline.

use cipher_sca::{CipherEngine, Error as CipherError};
use codec_sca::{Field, Operation};
use const_sca::{NONCE_SIZE, SEED_SIZE, TAG_SIZE};
use masking_sca::{
    bundle_from_bytes, bundle_to_bytes, ChaChaPermutation, MaskedKey, Permutation, ShadowPrng,
    ShadowState, Slot,
};
use tracing::{debug, error, info, warn};

use crate::{
    buffers::{write_prefix, BoundedBuffer},
    error::DeviceResult,
    signals::{Level, Signals},
};

/// How an encrypt run is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunParameters {
    pub repeat_count: u32,
    pub fixed_key: bool,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            repeat_count: const_sca::DEFAULT_REPEAT_COUNT,
            fixed_key: true,
        }
    }
}

/// Output of an encrypt or decrypt run.
///
/// An encrypt run the engine rejects has an empty payload. Nothing goes back on the wire for
/// it, so the host only sees its read time out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    operation: Operation,
    payload: Vec<u8>,
    authenticated: Option<bool>,
}

impl Response {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Tag check result, only set for decryptions.
    pub fn authenticated(&self) -> Option<bool> {
        self.authenticated
    }

    /// Bytes sent back to the host. With `report_auth_status` a decrypt response carries one
    /// trailing status byte, `1` when the tag verified.
    pub fn to_wire(&self, report_auth_status: bool) -> Vec<u8> {
        let mut out = self.payload.clone();
        if report_auth_status {
            if let Some(authenticated) = self.authenticated {
                out.push(authenticated as u8);
            }
        }
        out
    }
}

pub struct Orchestrator<E, S, P: Permutation = ChaChaPermutation> {
    engine: E,
    signals: S,
    shadow: ShadowState,
    prng: ShadowPrng<P>,
    key: MaskedKey,
    initial_key: MaskedKey,
    params: RunParameters,
}

impl<E: CipherEngine, S: Signals, P: Permutation> Orchestrator<E, S, P> {
    pub fn new(
        shares: usize,
        engine: E,
        signals: S,
        permutation: P,
        params: RunParameters,
    ) -> DeviceResult<Self> {
        let key = MaskedKey::zeroed(shares)?;
        Ok(Self {
            engine,
            signals,
            shadow: ShadowState::new(),
            prng: ShadowPrng::new(permutation),
            initial_key: key.clone(),
            key,
            params,
        })
    }

    pub fn shadow(&self) -> &ShadowState {
        &self.shadow
    }

    pub fn key(&self) -> &MaskedKey {
        &self.key
    }

    pub fn initial_key(&self) -> &MaskedKey {
        &self.initial_key
    }

    pub fn params(&self) -> RunParameters {
        self.params
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn signals(&self) -> &S {
        &self.signals
    }

    pub fn signals_mut(&mut self) -> &mut S {
        &mut self.signals
    }

    /// Full reseed: every shadow bundle is cleared and `seed` lands in the cipher slot.
    pub fn reseed(&mut self, seed: &[u8; SEED_SIZE]) {
        self.shadow.reseed(bundle_from_bytes(seed));
        debug!("Shadow state reseeded");
    }

    /// Prefix write of the masked key; the result also becomes the refresh baseline.
    pub fn load_key(&mut self, payload: &[u8]) -> DeviceResult<()> {
        let mut bytes = self.key.to_bytes();
        write_prefix(Field::Key, &mut bytes, payload)?;
        let loaded = MaskedKey::from_bytes(self.key.shares(), &bytes);
        bytes.iter_mut().for_each(|b| *b = 0);
        self.key = loaded?;
        self.initial_key = self.key.clone();
        Ok(())
    }

    /// Zero is not a valid repeat count, the previous value is kept and `false` returned.
    pub fn set_repeat_count(&mut self, repeat_count: u32) -> bool {
        if repeat_count == 0 {
            warn!(
                "Ignoring repeat count 0, keeping {}",
                self.params.repeat_count
            );
            return false;
        }
        self.params.repeat_count = repeat_count;
        true
    }

    pub fn set_fixed_key(&mut self, fixed_key: bool) {
        self.params.fixed_key = fixed_key;
    }

    /// Encrypts `m` into `c` `repeat_count` times; `nonce` ends up holding the nonce of the next
    /// run.
    pub fn encrypt(
        &mut self,
        c: &mut BoundedBuffer,
        m: &[u8],
        ad: &[u8],
        nonce: &mut [u8; NONCE_SIZE],
    ) -> Response {
        let repeat_count = self.params.repeat_count;
        info!(
            repeat_count,
            fixed_key = self.params.fixed_key,
            mlen = m.len(),
            adlen = ad.len(),
            "Encrypt run"
        );

        let mut clen = 0;
        for i in 0..repeat_count {
            self.prng.reseed(self.shadow.slot(Slot::Cipher));
            self.prng.advance();

            self.signals.trigger(Level::High);
            let result = self.engine.encrypt(
                c.storage_mut(),
                m,
                ad,
                nonce,
                &self.key,
                &mut self.prng,
            );
            self.signals.trigger(Level::Low);

            match result {
                Ok(len) => clen = len,
                Err(e) => {
                    error!("Encryption {} of {} failed: {}", i + 1, repeat_count, e);
                    clen = 0;
                    break;
                }
            }
            self.step(nonce);
        }
        self.initial_key = self.key.clone();

        if let Err(e) = c.set_len(clen) {
            error!("Ciphertext does not fit its buffer: {}", e);
            let _ = c.set_len(0);
        }
        Response {
            operation: Operation::Encrypt,
            payload: c.as_slice().to_vec(),
            authenticated: None,
        }
    }

    /// Single decryption of `c` into `m`, the tag check result is reported but does not change
    /// the payload.
    pub fn decrypt(
        &mut self,
        m: &mut BoundedBuffer,
        c: &[u8],
        ad: &[u8],
        nonce: &[u8; NONCE_SIZE],
    ) -> Response {
        info!(clen = c.len(), adlen = ad.len(), "Decrypt run");

        self.signals.trigger(Level::High);
        let result = self.engine.decrypt(
            m.storage_mut(),
            c,
            ad,
            nonce,
            &self.key,
            &mut self.prng,
        );
        self.signals.trigger(Level::Low);

        let written = c.len().saturating_sub(TAG_SIZE);
        let (mlen, authenticated) = match result {
            Ok(len) => (len, true),
            Err(CipherError::AuthenticationFailed) => {
                warn!("Decryption failed to authenticate");
                (written, false)
            }
            Err(e) => {
                error!("Decryption failed: {}", e);
                (0, false)
            }
        };
        if let Err(e) = m.set_len(mlen) {
            error!("Plaintext does not fit its buffer: {}", e);
            let _ = m.set_len(0);
        }
        Response {
            operation: Operation::Decrypt,
            payload: m.as_slice().to_vec(),
            authenticated: Some(authenticated),
        }
    }

    // One shadow step after a cipher call: next nonce, then key re-masking.
    fn step(&mut self, nonce: &mut [u8; NONCE_SIZE]) {
        self.shadow.rotate(self.prng.permutation());
        *nonce = bundle_to_bytes(&self.shadow.slot(Slot::Nonce));

        self.prng.reseed(self.shadow.slot(Slot::Refresh));
        self.prng.advance();
        if self.params.fixed_key {
            if let Err(e) = self.key.refresh_from(&self.initial_key, &mut self.prng) {
                error!("Key refresh failed: {}", e);
            }
        } else {
            self.key.rerandomize(&mut self.prng);
        }
    }
}

impl<E, S, P: Permutation> std::fmt::Debug for Orchestrator<E, S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("shares", &self.key.shares())
            .field("params", &self.params)
            .finish()
    }
}
