//! Offline replay of the device state.
//!
//! The device derives the PRNG seed, the nonce and the masked key of every iteration of a run
//! from its shadow state. [`DeviceMirror`] follows every value the host sends and replays the
//! same derivation, so the inputs of each traced encryption are known without reading them back.

use const_sca::{NONCE_SIZE, SEED_SIZE};
use masking_sca::{
    bundle_from_bytes, bundle_to_bytes, simple_refresh, ChaChaPermutation, MaskedKey, ShadowPrng,
    ShadowState, Slot,
};
use serde::Serialize;

use crate::error::HostResult;

/// Inputs of one on-device encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInputs {
    pub key: MaskedKey,
    /// Seed of the PRNG handed to the cipher.
    pub seed: [u8; SEED_SIZE],
    pub nonce: [u8; NONCE_SIZE],
}

/// Hex encoded [`RunInputs`], as stored by captures.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RunInputsRecord {
    pub masked_key: String,
    pub key: String,
    pub seed: String,
    pub nonce: String,
}

impl From<&RunInputs> for RunInputsRecord {
    fn from(inputs: &RunInputs) -> Self {
        Self {
            masked_key: hex::encode(inputs.key.to_bytes()),
            key: hex::encode(inputs.key.unmask()),
            seed: hex::encode(inputs.seed),
            nonce: hex::encode(inputs.nonce),
        }
    }
}

/// Host copy of the device values that evolve across runs.
#[derive(Debug, Clone)]
pub struct DeviceMirror {
    permutation: ChaChaPermutation,
    shadow: ShadowState,
    key: MaskedKey,
    nonce: [u8; NONCE_SIZE],
    repeat_count: u32,
    fixed_key: bool,
}

impl DeviceMirror {
    /// State of a device that just started.
    pub fn new(shares: usize) -> HostResult<Self> {
        Ok(Self {
            permutation: ChaChaPermutation,
            shadow: ShadowState::new(),
            key: MaskedKey::zeroed(shares)?,
            nonce: [0; NONCE_SIZE],
            repeat_count: const_sca::DEFAULT_REPEAT_COUNT,
            fixed_key: true,
        })
    }

    pub fn shadow(&self) -> &ShadowState {
        &self.shadow
    }

    pub fn key(&self) -> &MaskedKey {
        &self.key
    }

    pub fn nonce(&self) -> &[u8; NONCE_SIZE] {
        &self.nonce
    }

    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    pub fn fixed_key(&self) -> bool {
        self.fixed_key
    }

    pub fn set_seed(&mut self, seed: &[u8; SEED_SIZE]) {
        self.shadow.reseed(bundle_from_bytes(seed));
    }

    pub fn set_key(&mut self, key: MaskedKey) {
        self.key = key;
    }

    pub fn set_nonce(&mut self, nonce: &[u8; NONCE_SIZE]) {
        self.nonce = *nonce;
    }

    /// The device ignores a zero repeat count.
    pub fn set_repeat_count(&mut self, repeat_count: u32) {
        if repeat_count != 0 {
            self.repeat_count = repeat_count;
        }
    }

    pub fn set_fixed_key(&mut self, fixed_key: bool) {
        self.fixed_key = fixed_key;
    }

    /// Predict the inputs of the `n` encryptions of the next run and move the mirror to the
    /// device state after that run.
    pub fn unroll_inputs(&mut self, n: u32) -> Vec<RunInputs> {
        let baseline = self.key.clone();
        let mut prng = ShadowPrng::new(self.permutation);
        let mut inputs = Vec::with_capacity(n as usize);
        for _ in 0..n {
            inputs.push(RunInputs {
                key: self.key.clone(),
                seed: bundle_to_bytes(&self.shadow.slot(Slot::Cipher)),
                nonce: self.nonce,
            });

            self.shadow.rotate(&self.permutation);
            self.nonce = bundle_to_bytes(&self.shadow.slot(Slot::Nonce));
            prng.reseed(self.shadow.slot(Slot::Refresh));
            prng.advance();
            if self.fixed_key {
                self.key = simple_refresh(&baseline, &mut prng);
            } else {
                self.key.rerandomize(&mut prng);
            }
        }
        inputs
    }
}
