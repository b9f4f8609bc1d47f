// # Cipher Engine
//
// Abstracts the encryption and decryption operations the harness brackets with its trigger
// signal.
//
// The [`CipherEngine`] trait takes the key in masked form. A masked implementation computes on
// the shares directly and draws its fresh masks from the `rng` handed over by the harness, which
// is reseeded from the shadow state before every call. The reference implementation below simply
// recombines the shares.
//
// Ciphertexts are the encrypted message followed by a `TAG_SIZE` byte tag.

use std::ptr;

use aes_gcm::{
    aead::{consts::U16, generic_array::GenericArray, AeadInPlace, KeyInit},
    aes::Aes128,
    AesGcm,
};
use const_sca::{KEY_SIZE, NONCE_SIZE, TAG_SIZE};
use masking_sca::{MaskedKey, RandomSource};

use crate::error::{Error, Result};

/// AES-128-GCM with a 128 bit nonce and a 128 bit tag.
pub type Aes128Gcm128 = AesGcm<Aes128, U16>;

pub trait CipherEngine {
    // Encrypts `m` authenticating `ad`, writes ciphertext and tag to `out` and returns the
    // number of bytes written (`m.len() + TAG_SIZE`).
    fn encrypt(
        &mut self,
        out: &mut [u8],
        m: &[u8],
        ad: &[u8],
        nonce: &[u8; NONCE_SIZE],
        key: &MaskedKey,
        rng: &mut dyn RandomSource,
    ) -> Result<usize>;

    // Decrypts `c` (ciphertext and tag) into `out` and returns the plaintext length.
    //
    // On `Error::AuthenticationFailed` the first `c.len() - TAG_SIZE` bytes of `out` have been
    // written anyway.
    fn decrypt(
        &mut self,
        out: &mut [u8],
        c: &[u8],
        ad: &[u8],
        nonce: &[u8; NONCE_SIZE],
        key: &MaskedKey,
        rng: &mut dyn RandomSource,
    ) -> Result<usize>;
}

/// Software AES-128-GCM on the recombined key.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceEngine;

impl ReferenceEngine {
    pub fn new() -> Self {
        Self
    }

    fn cipher(key: &MaskedKey) -> Aes128Gcm128 {
        let mut k: [u8; KEY_SIZE] = key.unmask();
        let cipher = Aes128Gcm128::new(GenericArray::from_slice(&k));
        for b in k.iter_mut() {
            unsafe { ptr::write_volatile(b, 0) };
        }
        cipher
    }
}

impl CipherEngine for ReferenceEngine {
    fn encrypt(
        &mut self,
        out: &mut [u8],
        m: &[u8],
        ad: &[u8],
        nonce: &[u8; NONCE_SIZE],
        key: &MaskedKey,
        _rng: &mut dyn RandomSource,
    ) -> Result<usize> {
        let clen = m.len() + TAG_SIZE;
        if out.len() < clen {
            return Err(Error::OutputTooSmall {
                needed: clen,
                available: out.len(),
            });
        }
        let (body, rest) = out.split_at_mut(m.len());
        body.copy_from_slice(m);
        let tag = Self::cipher(key).encrypt_in_place_detached(
            GenericArray::from_slice(nonce),
            ad,
            body,
        )?;
        rest[..TAG_SIZE].copy_from_slice(&tag);
        Ok(clen)
    }

    fn decrypt(
        &mut self,
        out: &mut [u8],
        c: &[u8],
        ad: &[u8],
        nonce: &[u8; NONCE_SIZE],
        key: &MaskedKey,
        _rng: &mut dyn RandomSource,
    ) -> Result<usize> {
        if c.len() < TAG_SIZE {
            return Err(Error::CiphertextTooShort(c.len()));
        }
        let mlen = c.len() - TAG_SIZE;
        if out.len() < mlen {
            return Err(Error::OutputTooSmall {
                needed: mlen,
                available: out.len(),
            });
        }
        let (body, tag) = c.split_at(mlen);
        out[..mlen].copy_from_slice(body);
        Self::cipher(key)
            .decrypt_in_place_detached(
                GenericArray::from_slice(nonce),
                ad,
                &mut out[..mlen],
                GenericArray::from_slice(tag),
            )
            .map_err(|_| Error::AuthenticationFailed)?;
        Ok(mlen)
    }
}
