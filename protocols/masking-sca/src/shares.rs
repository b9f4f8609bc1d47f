use std::{fmt, ptr};

use const_sca::{KEY_SIZE, KEY_WORDS, MAX_SHARES, WORD_SIZE};

use crate::{
    error::{Error, Result},
    prng::RandomSource,
};

/// A key of `KEY_WORDS` words split in `shares` XOR shares per word.
///
/// Words are laid out word major: share `d` of word `i` lives at index `i * shares + d`, which is
/// also the order of the little endian words on the wire. The shares are wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct MaskedKey {
    shares: usize,
    words: Vec<u32>,
}

fn check_shares(shares: usize) -> Result<()> {
    if shares == 0 || shares > MAX_SHARES {
        return Err(Error::InvalidShares(shares));
    }
    Ok(())
}

impl MaskedKey {
    /// All shares set to zero, the unmasked key is zero as well.
    pub fn zeroed(shares: usize) -> Result<Self> {
        check_shares(shares)?;
        Ok(Self {
            shares,
            words: vec![0; KEY_WORDS * shares],
        })
    }

    pub fn from_words(shares: usize, words: Vec<u32>) -> Result<Self> {
        check_shares(shares)?;
        if words.len() != KEY_WORDS * shares {
            return Err(Error::InvalidKeyLength {
                expected: KEY_WORDS * shares * WORD_SIZE,
                actual: words.len() * WORD_SIZE,
            });
        }
        Ok(Self { shares, words })
    }

    pub fn from_bytes(shares: usize, bytes: &[u8]) -> Result<Self> {
        check_shares(shares)?;
        let expected = KEY_WORDS * shares * WORD_SIZE;
        if bytes.len() != expected {
            return Err(Error::InvalidKeyLength {
                expected,
                actual: bytes.len(),
            });
        }
        let words = bytes
            .chunks_exact(WORD_SIZE)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self { shares, words })
    }

    /// Split `key` in `shares` shares: the first `shares - 1` shares of every word are random,
    /// the last one completes the XOR.
    pub fn mask<R: RandomSource + ?Sized>(
        key: &[u8; KEY_SIZE],
        shares: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let mut masked = Self::zeroed(shares)?;
        for (i, chunk) in key.chunks_exact(WORD_SIZE).enumerate() {
            let mut acc = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let group = &mut masked.words[i * shares..(i + 1) * shares];
            for share in group[..shares - 1].iter_mut() {
                let r = rng.next_word();
                *share = r;
                acc ^= r;
            }
            group[shares - 1] = acc;
        }
        Ok(masked)
    }

    /// Every share drawn independently from `rng`.
    pub fn random<R: RandomSource + ?Sized>(shares: usize, rng: &mut R) -> Result<Self> {
        let mut key = Self::zeroed(shares)?;
        key.rerandomize(rng);
        Ok(key)
    }

    pub fn shares(&self) -> usize {
        self.shares
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn byte_len(&self) -> usize {
        self.words.len() * WORD_SIZE
    }

    /// Share `share` of key word `word`.
    pub fn share(&self, word: usize, share: usize) -> u32 {
        self.words[word * self.shares + share]
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    pub fn unmasked_words(&self) -> [u32; KEY_WORDS] {
        let mut out = [0u32; KEY_WORDS];
        for (i, group) in self.words.chunks_exact(self.shares).enumerate() {
            out[i] = group.iter().fold(0, |acc, s| acc ^ s);
        }
        out
    }

    pub fn unmask(&self) -> [u8; KEY_SIZE] {
        let mut out = [0u8; KEY_SIZE];
        for (chunk, word) in out
            .chunks_exact_mut(WORD_SIZE)
            .zip(self.unmasked_words().iter())
        {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    /// Replace every share with a fresh random word. The key value is not preserved.
    pub fn rerandomize<R: RandomSource + ?Sized>(&mut self, rng: &mut R) {
        for share in self.words.iter_mut() {
            *share = rng.next_word();
        }
    }

    /// Overwrite `self` with a refreshed copy of `baseline`.
    ///
    /// For every word `shares - 1` random words are XORed into the baseline shares and their
    /// XOR is folded into the last share, so the key value of `self` equals the one of
    /// `baseline`.
    pub fn refresh_from<R: RandomSource + ?Sized>(
        &mut self,
        baseline: &MaskedKey,
        rng: &mut R,
    ) -> Result<()> {
        if baseline.shares != self.shares {
            return Err(Error::SharesMismatch {
                expected: self.shares,
                actual: baseline.shares,
            });
        }
        self.refresh_words(baseline, rng);
        Ok(())
    }

    // Caller checks that both keys have the same number of shares.
    fn refresh_words<R: RandomSource + ?Sized>(&mut self, baseline: &MaskedKey, rng: &mut R) {
        let d = self.shares;
        for i in 0..KEY_WORDS {
            let mut r = 0u32;
            for j in 0..d - 1 {
                let s = rng.next_word();
                self.words[i * d + j] = baseline.words[i * d + j] ^ s;
                r ^= s;
            }
            self.words[i * d + d - 1] = baseline.words[i * d + d - 1] ^ r;
        }
    }

    fn erase(&mut self) {
        for w in self.words.iter_mut() {
            unsafe { ptr::write_volatile(w, 0) };
        }
    }
}

/// Refreshed copy of `baseline`, see [`MaskedKey::refresh_from`].
pub fn simple_refresh<R: RandomSource + ?Sized>(baseline: &MaskedKey, rng: &mut R) -> MaskedKey {
    let mut out = baseline.clone();
    out.refresh_words(baseline, rng);
    out
}

impl Drop for MaskedKey {
    fn drop(&mut self) {
        self.erase();
    }
}

impl fmt::Debug for MaskedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaskedKey")
            .field("shares", &self.shares)
            .finish()
    }
}
