use const_sca::PRNG_TABLE_WORDS;
use rand_chacha::rand_core::{impls, Error as RandError, RngCore};

use crate::shadow::{Bundle, ChaChaPermutation, Permutation, ShadowState, Slot};

/// Source of the 32 bit words consumed by masking and by the cipher.
///
/// Implemented for every [`RngCore`], so [`ShadowPrng`] as well as any `rand` generator can be
/// used where a `RandomSource` is expected.
pub trait RandomSource {
    fn next_word(&mut self) -> u32;
}

impl<R: RngCore + ?Sized> RandomSource for R {
    #[inline]
    fn next_word(&mut self) -> u32 {
        self.next_u32()
    }
}

/// PRNG built on a shadow state used in sponge mode.
///
/// `reseed` loads a seed in the cipher bundle of a fresh core state. `advance` refills the output
/// table: each of its two steps permutes the core and squeezes the cipher and nonce bundles,
/// eight words per step. `generate` pops words from the table and refills it when it runs out.
#[derive(Debug, Clone)]
pub struct ShadowPrng<P: Permutation = ChaChaPermutation> {
    permutation: P,
    core: ShadowState,
    table: [u32; PRNG_TABLE_WORDS],
    index: usize,
}

impl<P: Permutation> ShadowPrng<P> {
    pub fn new(permutation: P) -> Self {
        Self {
            permutation,
            core: ShadowState::new(),
            table: [0; PRNG_TABLE_WORDS],
            index: PRNG_TABLE_WORDS,
        }
    }

    pub fn with_seed(permutation: P, seed: Bundle) -> Self {
        let mut prng = Self::new(permutation);
        prng.reseed(seed);
        prng
    }

    pub fn permutation(&self) -> &P {
        &self.permutation
    }

    /// Restart the generator from `seed`, the output table is marked empty.
    pub fn reseed(&mut self, seed: Bundle) {
        self.core.reseed(seed);
        self.index = PRNG_TABLE_WORDS;
    }

    /// Refill the output table from the core state.
    pub fn advance(&mut self) {
        for chunk in self.table.chunks_exact_mut(8) {
            self.core.rotate(&self.permutation);
            chunk[..4].copy_from_slice(&self.core.slot(Slot::Cipher));
            chunk[4..].copy_from_slice(&self.core.slot(Slot::Nonce));
        }
        self.index = 0;
    }

    #[inline]
    pub fn generate(&mut self) -> u32 {
        if self.index >= PRNG_TABLE_WORDS {
            self.advance();
        }
        let word = self.table[self.index];
        self.index += 1;
        word
    }
}

impl Default for ShadowPrng<ChaChaPermutation> {
    fn default() -> Self {
        Self::new(ChaChaPermutation)
    }
}

impl<P: Permutation> RngCore for ShadowPrng<P> {
    fn next_u32(&mut self) -> u32 {
        self.generate()
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), RandError> {
        self.fill_bytes(dest);
        Ok(())
    }
}
