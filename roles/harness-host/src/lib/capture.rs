//! Batch capture driver.
//!
//! Loads random seed, nonce, key, message and associated data on the device, then triggers
//! `number / batch` runs of `batch` encryptions each. The inputs of every encryption are
//! recovered with [`DeviceMirror::unroll_inputs`](crate::unroll::DeviceMirror::unroll_inputs)
//! and the ciphertext returned by each run is checked against the local reference engine.

use cipher_sca::{CipherEngine, ReferenceEngine};
use codec_sca::{Field, FieldLimits, Operation};
use const_sca::{KEY_SIZE, NONCE_SIZE, SEED_SIZE, TAG_SIZE};
use masking_sca::{bundle_from_bytes, MaskedKey, ShadowPrng};
use rand::RngCore;
use serde::Serialize;
use std::{fs::File, io::BufWriter, path::Path};
use tracing::{info, warn};

use crate::{
    client::HarnessClient,
    error::{HostError, HostResult},
    unroll::{RunInputs, RunInputsRecord},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSettings {
    /// Total number of encryptions.
    pub number: u32,
    /// Encryptions per run.
    pub batch: u32,
    pub fixed_key: bool,
    /// Secret used in fixed key mode, random when unset.
    pub key: Option<[u8; KEY_SIZE]>,
    pub message_len: usize,
    pub ad_len: usize,
}

impl CaptureSettings {
    pub fn validate(&self, limits: &FieldLimits) -> HostResult<()> {
        if self.batch == 0 {
            return Err(HostError::InvalidSettings("batch must not be 0".into()));
        }
        if self.number % self.batch != 0 {
            return Err(HostError::InvalidSettings(format!(
                "number {} is not a multiple of batch {}",
                self.number, self.batch
            )));
        }
        if self.message_len > limits.capacity(Field::Plaintext)
            || self.ad_len > limits.capacity(Field::AssociatedData)
        {
            return Err(HostError::InvalidSettings(format!(
                "messages are limited to {} bytes",
                limits.max_message_len()
            )));
        }
        Ok(())
    }

    pub fn batches(&self) -> u32 {
        self.number / self.batch
    }
}

/// One run of `batch` encryptions.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BatchRecord {
    /// Ciphertext and tag returned for the last encryption of the run.
    pub ciphertext: String,
    /// Whether that ciphertext matches the reference engine on the unrolled inputs.
    pub verified: bool,
    pub inputs: Vec<RunInputsRecord>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Capture {
    pub shares: usize,
    pub fixed_key: bool,
    pub seed: String,
    pub nonce: String,
    pub plaintext: String,
    pub associated_data: String,
    pub batches: Vec<BatchRecord>,
}

impl Capture {
    pub fn encryptions(&self) -> usize {
        self.batches.iter().map(|b| b.inputs.len()).sum()
    }

    pub fn all_verified(&self) -> bool {
        self.batches.iter().all(|b| b.verified)
    }

    pub fn write_json(&self, path: &Path) -> HostResult<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        info!("Capture of {} encryptions saved to {}", self.encryptions(), path.display());
        Ok(())
    }
}

/// Ciphertext the reference engine produces for `inputs`.
pub fn reference_ciphertext(inputs: &RunInputs, m: &[u8], ad: &[u8]) -> HostResult<Vec<u8>> {
    let mut c = vec![0u8; m.len() + TAG_SIZE];
    let mut prng = ShadowPrng::default();
    prng.reseed(bundle_from_bytes(&inputs.seed));
    prng.advance();
    let len = ReferenceEngine::new().encrypt(&mut c, m, ad, &inputs.nonce, &inputs.key, &mut prng)?;
    c.truncate(len);
    Ok(c)
}

pub async fn run_capture<R: RngCore>(
    client: &mut HarnessClient,
    settings: &CaptureSettings,
    rng: &mut R,
) -> HostResult<Capture> {
    settings.validate(client.limits())?;
    let shares = client.limits().shares();

    let mut seed = [0u8; SEED_SIZE];
    rng.fill_bytes(&mut seed);
    let mut nonce = [0u8; NONCE_SIZE];
    rng.fill_bytes(&mut nonce);
    let key = if settings.fixed_key {
        let secret = match settings.key {
            Some(secret) => secret,
            None => {
                let mut secret = [0u8; KEY_SIZE];
                rng.fill_bytes(&mut secret);
                secret
            }
        };
        MaskedKey::mask(&secret, shares, rng)?
    } else {
        MaskedKey::random(shares, rng)?
    };
    let mut m = vec![0u8; settings.message_len];
    rng.fill_bytes(&mut m);
    let mut ad = vec![0u8; settings.ad_len];
    rng.fill_bytes(&mut ad);

    client.set_repeat_count(settings.batch).await?;
    client.set_fixed_key(settings.fixed_key).await?;
    client.set_seed(&seed).await?;
    client
        .set_data(Field::Nonce, &nonce, Operation::Store)
        .await?;
    client.set_key(&key).await?;
    client
        .set_data(Field::AssociatedData, &ad, Operation::Store)
        .await?;

    let mut batches = Vec::with_capacity(settings.batches() as usize);
    for i in 0..settings.batches() {
        let ciphertext = client
            .set_data(Field::Plaintext, &m, Operation::Encrypt)
            .await?
            .unwrap_or_default();
        let inputs = client.unroll_inputs(settings.batch);

        let verified = match inputs.last() {
            Some(last) => reference_ciphertext(last, &m, &ad)? == ciphertext,
            None => false,
        };
        if !verified {
            warn!("Batch {} does not match the unrolled inputs", i);
        }
        info!("Batch {}/{} recorded", i + 1, settings.batches());
        batches.push(BatchRecord {
            ciphertext: hex::encode(&ciphertext),
            verified,
            inputs: inputs.iter().map(RunInputsRecord::from).collect(),
        });
    }

    Ok(Capture {
        shares,
        fixed_key: settings.fixed_key,
        seed: hex::encode(seed),
        nonce: hex::encode(nonce),
        plaintext: hex::encode(&m),
        associated_data: hex::encode(&ad),
        batches,
    })
}
