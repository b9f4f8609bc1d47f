//! Known answer tests.
//!
//! Vector files are blocks of `Name = HEX` lines separated by blank lines:
//!
//! ```text
//! Count = 1
//! Key = 000102030405060708090A0B0C0D0E0F
//! Nonce = 000102030405060708090A0B0C0D0E0F
//! PT =
//! AD =
//! CT = ...
//! ```

use cipher_sca::{CipherEngine, Error as CipherError};
use const_sca::{KEY_SIZE, NONCE_SIZE, TAG_SIZE};
use masking_sca::MaskedKey;
use rand::RngCore;
use tracing::{info, warn};

use crate::{
    client::HarnessClient,
    error::{HostError, HostResult},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KatVector {
    pub count: u32,
    /// First line of the block in the file.
    pub line: usize,
    pub key: Vec<u8>,
    pub nonce: Vec<u8>,
    pub plaintext: Vec<u8>,
    pub associated_data: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

#[derive(Default)]
struct Block {
    count: Option<u32>,
    line: usize,
    key: Option<Vec<u8>>,
    nonce: Option<Vec<u8>>,
    plaintext: Option<Vec<u8>>,
    associated_data: Option<Vec<u8>>,
    ciphertext: Option<Vec<u8>>,
}

impl Block {
    fn is_empty(&self) -> bool {
        self.count.is_none()
            && self.key.is_none()
            && self.nonce.is_none()
            && self.plaintext.is_none()
            && self.associated_data.is_none()
            && self.ciphertext.is_none()
    }

    fn finish(self, index: usize) -> HostResult<KatVector> {
        let line = self.line;
        let missing = |name: &str| HostError::Kat {
            line,
            reason: format!("block has no `{}` entry", name),
        };
        Ok(KatVector {
            count: self.count.unwrap_or(index as u32 + 1),
            line,
            key: self.key.ok_or_else(|| missing("Key"))?,
            nonce: self.nonce.ok_or_else(|| missing("Nonce"))?,
            plaintext: self.plaintext.ok_or_else(|| missing("PT"))?,
            associated_data: self.associated_data.ok_or_else(|| missing("AD"))?,
            ciphertext: self.ciphertext.ok_or_else(|| missing("CT"))?,
        })
    }
}

pub fn parse_kat(src: &str) -> HostResult<Vec<KatVector>> {
    let mut vectors = Vec::new();
    let mut block = Block::default();
    for (i, raw) in src.lines().enumerate() {
        let line = i + 1;
        let raw = raw.trim();
        if raw.is_empty() {
            if !block.is_empty() {
                let finished = std::mem::take(&mut block);
                vectors.push(finished.finish(vectors.len())?);
            }
            continue;
        }
        if block.is_empty() {
            block.line = line;
        }
        let (name, value) = raw.split_once('=').ok_or_else(|| HostError::Kat {
            line,
            reason: format!("expected `Name = value`, got `{}`", raw),
        })?;
        let value = value.trim();
        match name.trim() {
            "Count" => {
                block.count = Some(value.parse().map_err(|_| HostError::Kat {
                    line,
                    reason: format!("invalid count `{}`", value),
                })?)
            }
            "Key" => block.key = Some(hex::decode(value)?),
            "Nonce" => block.nonce = Some(hex::decode(value)?),
            "PT" => block.plaintext = Some(hex::decode(value)?),
            "AD" => block.associated_data = Some(hex::decode(value)?),
            "CT" => block.ciphertext = Some(hex::decode(value)?),
            other => {
                return Err(HostError::Kat {
                    line,
                    reason: format!("unknown entry `{}`", other),
                })
            }
        }
    }
    if !block.is_empty() {
        vectors.push(block.finish(vectors.len())?);
    }
    Ok(vectors)
}

impl KatVector {
    pub fn key_bytes(&self) -> HostResult<[u8; KEY_SIZE]> {
        self.key.as_slice().try_into().map_err(|_| HostError::Kat {
            line: self.line,
            reason: format!("key of {} bytes, expected {}", self.key.len(), KEY_SIZE),
        })
    }

    pub fn nonce_bytes(&self) -> HostResult<[u8; NONCE_SIZE]> {
        self.nonce.as_slice().try_into().map_err(|_| HostError::Kat {
            line: self.line,
            reason: format!(
                "nonce of {} bytes, expected {}",
                self.nonce.len(),
                NONCE_SIZE
            ),
        })
    }

    /// Run the vector through a local engine with a freshly masked key.
    pub fn check_reference<E: CipherEngine, R: RngCore>(
        &self,
        engine: &mut E,
        shares: usize,
        rng: &mut R,
    ) -> HostResult<KatOutcome> {
        let key = MaskedKey::mask(&self.key_bytes()?, shares, rng)?;
        let nonce = self.nonce_bytes()?;

        let mut c = vec![0u8; self.plaintext.len() + TAG_SIZE];
        let clen = engine.encrypt(
            &mut c,
            &self.plaintext,
            &self.associated_data,
            &nonce,
            &key,
            &mut *rng,
        )?;
        c.truncate(clen);

        let mut m = vec![0u8; self.ciphertext.len().saturating_sub(TAG_SIZE)];
        let authenticated = match engine.decrypt(
            &mut m,
            &self.ciphertext,
            &self.associated_data,
            &nonce,
            &key,
            &mut *rng,
        ) {
            Ok(mlen) => {
                m.truncate(mlen);
                true
            }
            Err(CipherError::AuthenticationFailed) => false,
            Err(e) => return Err(e.into()),
        };

        Ok(KatOutcome {
            count: self.count,
            ciphertext_matches: c == self.ciphertext,
            plaintext_matches: m == self.plaintext,
            authenticated: Some(authenticated),
        })
    }

    /// Encrypt and decrypt the vector on the device, each time with a freshly masked key.
    pub async fn check_device<R: RngCore>(
        &self,
        client: &mut HarnessClient,
        rng: &mut R,
    ) -> HostResult<KatOutcome> {
        let shares = client.limits().shares();
        let key = self.key_bytes()?;
        let nonce = self.nonce_bytes()?;

        let mut seed = [0u8; 16];
        rng.fill_bytes(&mut seed);
        client.set_seed(&seed).await?;

        let masked = MaskedKey::mask(&key, shares, rng)?;
        let c = client
            .encrypt_key(&self.associated_data, &self.plaintext, &masked, Some(&nonce))
            .await?;
        let repeat_count = client.mirror().repeat_count();
        client.unroll_inputs(repeat_count);

        let masked = MaskedKey::mask(&key, shares, rng)?;
        let decrypted = client
            .decrypt_key(&self.associated_data, &self.ciphertext, &masked, &nonce)
            .await?;

        Ok(KatOutcome {
            count: self.count,
            ciphertext_matches: c == self.ciphertext,
            plaintext_matches: decrypted.plaintext == self.plaintext,
            authenticated: decrypted.authenticated,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KatOutcome {
    pub count: u32,
    pub ciphertext_matches: bool,
    pub plaintext_matches: bool,
    pub authenticated: Option<bool>,
}

impl KatOutcome {
    pub fn passed(&self) -> bool {
        self.ciphertext_matches && self.plaintext_matches && self.authenticated != Some(false)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KatReport {
    pub passed: usize,
    pub failed: usize,
}

impl KatReport {
    pub fn record(&mut self, outcome: &KatOutcome) {
        if outcome.passed() {
            self.passed += 1;
        } else {
            warn!(
                count = outcome.count,
                ciphertext_matches = outcome.ciphertext_matches,
                plaintext_matches = outcome.plaintext_matches,
                authenticated = ?outcome.authenticated,
                "Known answer test failed"
            );
            self.failed += 1;
        }
    }

    pub fn log(&self) {
        info!("{} vectors passed, {} failed", self.passed, self.failed);
    }
}

/// Check every vector on the device with a repeat count of one.
pub async fn run_on_device<R: RngCore>(
    client: &mut HarnessClient,
    vectors: &[KatVector],
    rng: &mut R,
) -> HostResult<KatReport> {
    client.set_repeat_count(1).await?;
    let mut report = KatReport::default();
    for vector in vectors {
        let outcome = vector.check_device(client, rng).await?;
        report.record(&outcome);
    }
    report.log();
    Ok(report)
}

/// Check every vector against a local engine.
pub fn run_on_reference<E: CipherEngine, R: RngCore>(
    engine: &mut E,
    shares: usize,
    vectors: &[KatVector],
    rng: &mut R,
) -> HostResult<KatReport> {
    let mut report = KatReport::default();
    for vector in vectors {
        let outcome = vector.check_reference(engine, shares, rng)?;
        report.record(&outcome);
    }
    report.log();
    Ok(report)
}
