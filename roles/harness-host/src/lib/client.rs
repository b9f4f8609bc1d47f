use codec_sca::{Encoder, Field, FieldLimits, Frame, Operation};
use const_sca::{NONCE_SIZE, SEED_SIZE, TAG_SIZE, WORD_SIZE};
use masking_sca::MaskedKey;
use std::time::Duration;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time,
};
use tracing::{debug, info};

use crate::{
    config::HostConfig,
    error::{HostError, HostResult},
    unroll::{DeviceMirror, RunInputs},
};

/// Result of a decryption on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decrypted {
    pub plaintext: Vec<u8>,
    /// Only known when the device reports the authentication status.
    pub authenticated: Option<bool>,
}

/// Drives a device over its byte link and keeps a [`DeviceMirror`] of what was sent.
#[derive(Debug)]
pub struct HarnessClient {
    stream: TcpStream,
    encoder: Encoder,
    limits: FieldLimits,
    report_auth_status: bool,
    response_timeout: Duration,
    mirror: DeviceMirror,
    plaintext_len: usize,
    ciphertext_len: usize,
    seed: [u8; SEED_SIZE],
    fixed_key: [u8; WORD_SIZE],
}

impl HarnessClient {
    pub async fn connect(config: &HostConfig) -> HostResult<Self> {
        let stream = TcpStream::connect(config.device_address()).await?;
        stream.set_nodelay(true)?;
        info!("Connected to device at {}", config.device_address());
        Self::from_stream(stream, config)
    }

    pub fn from_stream(stream: TcpStream, config: &HostConfig) -> HostResult<Self> {
        Ok(Self {
            stream,
            encoder: Encoder::new(),
            limits: FieldLimits::new(config.max_message_len(), config.shares())?,
            report_auth_status: config.report_auth_status(),
            response_timeout: config.response_timeout(),
            mirror: DeviceMirror::new(config.shares())?,
            plaintext_len: 0,
            ciphertext_len: 0,
            seed: [0; SEED_SIZE],
            fixed_key: 1u32.to_le_bytes(),
        })
    }

    pub fn limits(&self) -> &FieldLimits {
        &self.limits
    }

    pub fn mirror(&self) -> &DeviceMirror {
        &self.mirror
    }

    /// Send one frame. `Operation::Encrypt` and `Operation::Decrypt` return the response of the
    /// run, `Operation::Store` returns nothing.
    pub async fn set_data(
        &mut self,
        field: Field,
        data: &[u8],
        operation: Operation,
    ) -> HostResult<Option<Vec<u8>>> {
        let frame = Frame::from_payload(field, operation, data.to_vec())?;
        self.limits.check(frame.header())?;
        self.track(field, data);

        let bytes = self.encoder.encode(&frame)?;
        debug!(?field, ?operation, len = data.len(), "Sending frame");
        self.stream.write_all(bytes).await?;

        let expected = match operation {
            Operation::Store => return Ok(None),
            Operation::Encrypt => self.plaintext_len + TAG_SIZE,
            Operation::Decrypt => {
                self.ciphertext_len.saturating_sub(TAG_SIZE) + self.report_auth_status as usize
            }
        };
        self.read_response(expected).await.map(Some)
    }

    pub async fn set_seed(&mut self, seed: &[u8; SEED_SIZE]) -> HostResult<()> {
        self.set_data(Field::Seed, seed, Operation::Store).await?;
        Ok(())
    }

    pub async fn set_key(&mut self, key: &MaskedKey) -> HostResult<()> {
        self.set_data(Field::Key, &key.to_bytes(), Operation::Store)
            .await?;
        Ok(())
    }

    pub async fn set_repeat_count(&mut self, repeat_count: u32) -> HostResult<()> {
        self.set_data(
            Field::RepeatCount,
            &repeat_count.to_le_bytes(),
            Operation::Store,
        )
        .await?;
        Ok(())
    }

    pub async fn set_fixed_key(&mut self, fixed_key: bool) -> HostResult<()> {
        self.set_data(
            Field::FixedKey,
            &(fixed_key as u32).to_le_bytes(),
            Operation::Store,
        )
        .await?;
        Ok(())
    }

    /// Load `key` then encrypt, see [`HarnessClient::encrypt`].
    pub async fn encrypt_key(
        &mut self,
        ad: &[u8],
        m: &[u8],
        key: &MaskedKey,
        nonce: Option<&[u8; NONCE_SIZE]>,
    ) -> HostResult<Vec<u8>> {
        self.set_key(key).await?;
        self.encrypt(ad, m, nonce).await
    }

    /// Encrypt with the key held by the device. Without `nonce` the device uses the nonce left
    /// by its previous run. Returns the ciphertext and tag of the last iteration.
    ///
    /// The mirror is not advanced: call [`HarnessClient::unroll_inputs`] with the repeat count
    /// after every run to stay in step with the device.
    ///
    /// A device whose engine fails the run sends nothing back, which surfaces here as
    /// [`HostError::Timeout`].
    pub async fn encrypt(
        &mut self,
        ad: &[u8],
        m: &[u8],
        nonce: Option<&[u8; NONCE_SIZE]>,
    ) -> HostResult<Vec<u8>> {
        self.set_data(Field::AssociatedData, ad, Operation::Store)
            .await?;
        let response = match nonce {
            Some(nonce) => {
                self.set_data(Field::Plaintext, m, Operation::Store).await?;
                self.set_data(Field::Nonce, nonce, Operation::Encrypt)
                    .await?
            }
            None => self.set_data(Field::Plaintext, m, Operation::Encrypt).await?,
        };
        Ok(response.unwrap_or_default())
    }

    /// Load `key` then decrypt, see [`HarnessClient::decrypt`].
    pub async fn decrypt_key(
        &mut self,
        ad: &[u8],
        c: &[u8],
        key: &MaskedKey,
        nonce: &[u8; NONCE_SIZE],
    ) -> HostResult<Decrypted> {
        self.set_key(key).await?;
        self.decrypt(ad, c, nonce).await
    }

    /// Single decryption with the key held by the device.
    pub async fn decrypt(
        &mut self,
        ad: &[u8],
        c: &[u8],
        nonce: &[u8; NONCE_SIZE],
    ) -> HostResult<Decrypted> {
        self.set_data(Field::AssociatedData, ad, Operation::Store)
            .await?;
        self.set_data(Field::Ciphertext, c, Operation::Store).await?;
        let mut plaintext = self
            .set_data(Field::Nonce, nonce, Operation::Decrypt)
            .await?
            .unwrap_or_default();
        let authenticated = match self.report_auth_status {
            true => plaintext.pop().map(|status| status == 1),
            false => None,
        };
        Ok(Decrypted {
            plaintext,
            authenticated,
        })
    }

    /// Inputs of the `n` encryptions of the last run, see [`DeviceMirror::unroll_inputs`].
    pub fn unroll_inputs(&mut self, n: u32) -> Vec<RunInputs> {
        self.mirror.unroll_inputs(n)
    }

    // Mirror of the prefix writes done by the device, `data` already fits its field.
    fn track(&mut self, field: Field, data: &[u8]) {
        match field {
            Field::Ciphertext => self.ciphertext_len = data.len(),
            Field::Plaintext => self.plaintext_len = data.len(),
            Field::AssociatedData => {}
            Field::Nonce => {
                let mut nonce = *self.mirror.nonce();
                nonce[..data.len()].copy_from_slice(data);
                self.mirror.set_nonce(&nonce);
            }
            Field::Key => {
                let mut bytes = self.mirror.key().to_bytes();
                bytes[..data.len()].copy_from_slice(data);
                if let Ok(key) = MaskedKey::from_bytes(self.limits.shares(), &bytes) {
                    self.mirror.set_key(key);
                }
            }
            Field::Seed => {
                self.seed[..data.len()].copy_from_slice(data);
                self.mirror.set_seed(&self.seed);
            }
            Field::RepeatCount => {
                let mut word = self.mirror.repeat_count().to_le_bytes();
                word[..data.len()].copy_from_slice(data);
                self.mirror.set_repeat_count(u32::from_le_bytes(word));
            }
            Field::FixedKey => {
                self.fixed_key[..data.len()].copy_from_slice(data);
                self.mirror
                    .set_fixed_key(u32::from_le_bytes(self.fixed_key) != 0);
            }
        }
    }

    async fn read_response(&mut self, expected: usize) -> HostResult<Vec<u8>> {
        let mut response = vec![0u8; expected];
        match time::timeout(self.response_timeout, self.stream.read_exact(&mut response)).await {
            Ok(Ok(_)) => Ok(response),
            Ok(Err(e)) => Err(HostError::Io(e)),
            Err(_) => Err(HostError::Timeout { expected }),
        }
    }
}
