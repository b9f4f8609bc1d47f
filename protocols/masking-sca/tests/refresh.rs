use masking_sca::{
    simple_refresh, ChaChaPermutation, MaskedKey, ShadowPrng, ShadowState, Slot,
};
use quickcheck_macros::quickcheck;
use rand::{rngs::StdRng, SeedableRng};

fn key_bytes(words: (u32, u32, u32, u32)) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..4].copy_from_slice(&words.0.to_le_bytes());
    key[4..8].copy_from_slice(&words.1.to_le_bytes());
    key[8..12].copy_from_slice(&words.2.to_le_bytes());
    key[12..].copy_from_slice(&words.3.to_le_bytes());
    key
}

fn shares_from(order: u8) -> usize {
    (order as usize % 8) + 1
}

#[quickcheck]
fn mask_then_unmask_is_identity(words: (u32, u32, u32, u32), order: u8, seed: u64) -> bool {
    let key = key_bytes(words);
    let mut rng = StdRng::seed_from_u64(seed);
    let masked = MaskedKey::mask(&key, shares_from(order), &mut rng).unwrap();
    masked.unmask() == key
}

#[quickcheck]
fn simple_refresh_preserves_the_key(words: (u32, u32, u32, u32), order: u8, seed: u32) -> bool {
    let key = key_bytes(words);
    let shares = shares_from(order);
    let mut prng = ShadowPrng::with_seed(ChaChaPermutation, [seed, 0, 0, 0]);
    let baseline = MaskedKey::mask(&key, shares, &mut prng).unwrap();
    let refreshed = simple_refresh(&baseline, &mut prng);
    refreshed.unmask() == key && refreshed.shares() == shares
}

#[test]
fn refreshed_shares_differ_from_baseline() {
    let mut prng = ShadowPrng::with_seed(ChaChaPermutation, [1, 2, 3, 4]);
    let baseline = MaskedKey::mask(&[0x5a; 16], 4, &mut prng).unwrap();
    let refreshed = simple_refresh(&baseline, &mut prng);
    assert_ne!(refreshed.words(), baseline.words());
    for word in 0..4 {
        for share in 0..3 {
            assert_ne!(refreshed.share(word, share), baseline.share(word, share));
        }
    }
}

#[test]
fn five_chained_refreshes_keep_the_key() {
    let key = [0xc3; 16];
    let mut shadow = ShadowState::from_seed([7, 7, 7, 7]);
    let mut prng = ShadowPrng::new(ChaChaPermutation);
    let mut current = MaskedKey::mask(&key, 3, &mut StdRng::seed_from_u64(5)).unwrap();
    for _ in 0..5 {
        shadow.rotate(&ChaChaPermutation);
        prng.reseed(shadow.slot(Slot::Refresh));
        prng.advance();
        current = simple_refresh(&current, &mut prng);
    }
    assert_eq!(current.unmask(), key);
}

#[test]
fn rerandomized_keys_are_not_the_baseline() {
    let key = [0u8; 16];
    let mut prng = ShadowPrng::with_seed(ChaChaPermutation, [0; 4]);
    let mut masked = MaskedKey::mask(&key, 2, &mut prng).unwrap();
    let mut seen = Vec::new();
    for _ in 0..8 {
        masked.rerandomize(&mut prng);
        assert_ne!(masked.unmask(), key);
        seen.push(masked.unmask());
    }
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 8);
}
