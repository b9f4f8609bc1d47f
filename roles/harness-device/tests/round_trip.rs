use cipher_sca::ReferenceEngine;
use codec_sca::{Field, FieldLimits, Frame, Operation};
use harness_device::{signals::RecordingSignals, RunParameters, Session};
use masking_sca::{ChaChaPermutation, MaskedKey, ShadowPrng};
use quickcheck_macros::quickcheck;

const MAX_MESSAGE_LEN: usize = 256;

fn frame(field: Field, operation: Operation, payload: &[u8]) -> Vec<u8> {
    let frame = Frame::from_payload(field, operation, payload.to_vec()).unwrap();
    let mut bytes = vec![0; frame.encoded_length()];
    frame.serialize(&mut bytes).unwrap();
    bytes
}

fn key_bytes(words: (u32, u32, u32, u32)) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..4].copy_from_slice(&words.0.to_le_bytes());
    key[4..8].copy_from_slice(&words.1.to_le_bytes());
    key[8..12].copy_from_slice(&words.2.to_le_bytes());
    key[12..].copy_from_slice(&words.3.to_le_bytes());
    key
}

#[quickcheck]
fn decrypting_the_ciphertext_returns_the_plaintext(
    m: Vec<u8>,
    ad: Vec<u8>,
    key: (u32, u32, u32, u32),
    nonce: (u64, u64),
    order: u8,
) -> bool {
    let m = &m[..m.len().min(MAX_MESSAGE_LEN)];
    let ad = &ad[..ad.len().min(MAX_MESSAGE_LEN)];
    let shares = (order as usize % 8) + 1;
    let mut nonce_bytes = [0u8; 16];
    nonce_bytes[..8].copy_from_slice(&nonce.0.to_le_bytes());
    nonce_bytes[8..].copy_from_slice(&nonce.1.to_le_bytes());

    let mut prng = ShadowPrng::with_seed(ChaChaPermutation, [key.0, key.1, nonce.0 as u32, 1]);
    let masked = MaskedKey::mask(&key_bytes(key), shares, &mut prng).unwrap();

    let mut s = Session::new(
        FieldLimits::new(MAX_MESSAGE_LEN, shares).unwrap(),
        RunParameters::default(),
        ReferenceEngine::new(),
        RecordingSignals::new(),
        ChaChaPermutation,
    )
    .unwrap();

    let mut bytes = frame(Field::Key, Operation::Store, &masked.to_bytes());
    bytes.extend(frame(Field::Nonce, Operation::Store, &nonce_bytes));
    bytes.extend(frame(Field::AssociatedData, Operation::Store, ad));
    bytes.extend(frame(Field::Plaintext, Operation::Encrypt, m));
    let encrypted = s.receive(&bytes);
    if encrypted.len() != 1 || encrypted[0].payload().len() != m.len() + 16 {
        return false;
    }
    let c = encrypted[0].payload().to_vec();

    // the run moved key and nonce on
    let mut bytes = frame(Field::Key, Operation::Store, &masked.to_bytes());
    bytes.extend(frame(Field::Nonce, Operation::Store, &nonce_bytes));
    bytes.extend(frame(Field::Ciphertext, Operation::Decrypt, &c));
    let decrypted = s.receive(&bytes);

    decrypted.len() == 1
        && decrypted[0].payload() == m
        && decrypted[0].authenticated() == Some(true)
        && s.buffers().associated_data.as_slice() == ad
}
