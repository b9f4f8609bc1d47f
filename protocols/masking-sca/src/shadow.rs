use const_sca::{BUNDLE_WORDS, SHADOW_BUNDLES, WORD_SIZE};
use rand_chacha::{
    rand_core::{RngCore, SeedableRng},
    ChaCha8Rng,
};

/// 128 bit row of a shadow state.
pub type Bundle = [u32; BUNDLE_WORDS];

/// One generator step over the whole shadow state.
///
/// The harness treats the generator as a black box: any deterministic mixing of the four
/// bundles can be plugged in, as long as the host and the device agree on it.
pub trait Permutation {
    fn permute(&self, state: &mut [Bundle; SHADOW_BUNDLES]);
}

/// Reference permutation: a two round Feistel where each half keys a ChaCha8 keystream that is
/// XORed into the other half.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChaChaPermutation;

impl ChaChaPermutation {
    fn mix(key_rows: &[Bundle], target: &mut [Bundle]) {
        let mut seed = [0u8; 32];
        for (chunk, word) in seed
            .chunks_exact_mut(WORD_SIZE)
            .zip(key_rows.iter().flatten())
        {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        let mut stream = ChaCha8Rng::from_seed(seed);
        for word in target.iter_mut().flatten() {
            *word ^= stream.next_u32();
        }
    }
}

impl Permutation for ChaChaPermutation {
    fn permute(&self, state: &mut [Bundle; SHADOW_BUNDLES]) {
        let (low, high) = state.split_at_mut(SHADOW_BUNDLES / 2);
        Self::mix(low, high);
        Self::mix(high, low);
    }
}

/// The three generator slots kept by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Seeds the PRNG consumed by the cipher.
    Cipher,
    /// Next nonce.
    Nonce,
    /// Seeds the PRNG consumed by the key refresh.
    Refresh,
}

impl Slot {
    fn index(&self) -> usize {
        match self {
            Slot::Cipher => 0,
            Slot::Nonce => 1,
            Slot::Refresh => 2,
        }
    }
}

/// Shadow generator state: the three slots plus one capacity bundle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShadowState {
    bundles: [Bundle; SHADOW_BUNDLES],
}

impl ShadowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: Bundle) -> Self {
        let mut state = Self::new();
        state.reseed(seed);
        state
    }

    /// Zero every bundle, then load `seed` in the cipher slot.
    pub fn reseed(&mut self, seed: Bundle) {
        self.bundles = [[0; BUNDLE_WORDS]; SHADOW_BUNDLES];
        self.bundles[Slot::Cipher.index()] = seed;
    }

    pub fn slot(&self, slot: Slot) -> Bundle {
        self.bundles[slot.index()]
    }

    pub fn bundles(&self) -> &[Bundle; SHADOW_BUNDLES] {
        &self.bundles
    }

    /// One shadow step: every slot moves forward together.
    pub fn rotate<P: Permutation + ?Sized>(&mut self, permutation: &P) {
        permutation.permute(&mut self.bundles);
    }
}

pub fn bundle_from_bytes(bytes: &[u8; BUNDLE_WORDS * WORD_SIZE]) -> Bundle {
    let mut bundle = [0u32; BUNDLE_WORDS];
    for (word, chunk) in bundle.iter_mut().zip(bytes.chunks_exact(WORD_SIZE)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    bundle
}

pub fn bundle_to_bytes(bundle: &Bundle) -> [u8; BUNDLE_WORDS * WORD_SIZE] {
    let mut bytes = [0u8; BUNDLE_WORDS * WORD_SIZE];
    for (chunk, word) in bytes.chunks_exact_mut(WORD_SIZE).zip(bundle.iter()) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reseed_clears_every_slot() {
        let mut state = ShadowState::from_seed([1, 2, 3, 4]);
        state.rotate(&ChaChaPermutation);
        state.reseed([5, 6, 7, 8]);
        assert_eq!(state.slot(Slot::Cipher), [5, 6, 7, 8]);
        assert_eq!(state.slot(Slot::Nonce), [0; 4]);
        assert_eq!(state.slot(Slot::Refresh), [0; 4]);
        assert_eq!(state.bundles()[3], [0; 4]);
    }

    #[test]
    fn rotation_is_deterministic_and_decorrelates_slots() {
        let mut a = ShadowState::from_seed([0; 4]);
        let mut b = ShadowState::from_seed([0; 4]);
        a.rotate(&ChaChaPermutation);
        b.rotate(&ChaChaPermutation);
        assert_eq!(a, b);

        assert_ne!(a.slot(Slot::Cipher), a.slot(Slot::Nonce));
        assert_ne!(a.slot(Slot::Nonce), a.slot(Slot::Refresh));
        assert_ne!(a.slot(Slot::Cipher), a.slot(Slot::Refresh));

        let before = a.clone();
        a.rotate(&ChaChaPermutation);
        assert_ne!(a, before);
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = ShadowState::from_seed([0, 0, 0, 0]);
        let mut b = ShadowState::from_seed([0, 0, 0, 1]);
        a.rotate(&ChaChaPermutation);
        b.rotate(&ChaChaPermutation);
        assert_ne!(a.slot(Slot::Nonce), b.slot(Slot::Nonce));
    }

    #[test]
    fn bundle_bytes_are_little_endian() {
        let bytes = [1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1];
        let bundle = bundle_from_bytes(&bytes);
        assert_eq!(bundle, [1, 0x100, 0x10000, 0x1000000]);
        assert_eq!(bundle_to_bytes(&bundle), bytes);
    }
}
