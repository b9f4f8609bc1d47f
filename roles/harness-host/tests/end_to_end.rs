use cipher_sca::{CipherEngine, ReferenceEngine};
use harness_device::{link, signals::RecordingSignals, DeviceConfig, Session};
use harness_host::{
    capture::{reference_ciphertext, run_capture, CaptureSettings},
    kat::{parse_kat, run_on_device, KatReport},
    HarnessClient, HostConfig,
};
use masking_sca::{MaskedKey, ShadowPrng};
use rand::{rngs::StdRng, SeedableRng};
use std::time::Duration;
use tokio::net::TcpListener;

const SHARES: usize = 3;
const MAX_MESSAGE_LEN: usize = 64;

async fn start_device() -> HostConfig {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let mut device_config = DeviceConfig::new(address.clone(), SHARES, MAX_MESSAGE_LEN);
    device_config.set_report_auth_status(true);
    let session = Session::from_config(
        &device_config,
        ReferenceEngine::new(),
        RecordingSignals::new(),
    )
    .unwrap();
    tokio::spawn(link::serve(
        listener,
        session,
        Duration::from_millis(100),
        true,
    ));

    let mut config = HostConfig::new(address, SHARES, MAX_MESSAGE_LEN);
    config.set_report_auth_status(true);
    config
}

fn reference_encrypt(m: &[u8], ad: &[u8], nonce: &[u8; 16], key: &[u8; 16]) -> Vec<u8> {
    let key = MaskedKey::mask(key, 1, &mut ShadowPrng::default()).unwrap();
    let mut out = vec![0; m.len() + 16];
    let len = ReferenceEngine::new()
        .encrypt(&mut out, m, ad, nonce, &key, &mut ShadowPrng::default())
        .unwrap();
    out.truncate(len);
    out
}

#[tokio::test]
async fn client_encrypts_and_decrypts_on_the_device() {
    let config = start_device().await;
    let mut client = HarnessClient::connect(&config).await.unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let key = [0x42; 16];
    let nonce = [0x24; 16];

    let masked = MaskedKey::mask(&key, SHARES, &mut rng).unwrap();
    let c = client
        .encrypt_key(b"header", b"secret message", &masked, Some(&nonce))
        .await
        .unwrap();
    assert_eq!(c, reference_encrypt(b"secret message", b"header", &nonce, &key));

    let masked = MaskedKey::mask(&key, SHARES, &mut rng).unwrap();
    let decrypted = client
        .decrypt_key(b"header", &c, &masked, &nonce)
        .await
        .unwrap();
    assert_eq!(decrypted.plaintext, b"secret message");
    assert_eq!(decrypted.authenticated, Some(true));

    let decrypted = client
        .decrypt_key(b"other header", &c, &masked, &nonce)
        .await
        .unwrap();
    assert_eq!(decrypted.authenticated, Some(false));
}

#[tokio::test]
async fn unrolled_inputs_reproduce_every_run() {
    let config = start_device().await;
    let mut client = HarnessClient::connect(&config).await.unwrap();
    let mut rng = StdRng::seed_from_u64(11);
    let (m, ad) = (b"sixteen byte msg", b"ad");

    client.set_seed(&[5; 16]).await.unwrap();
    client.set_repeat_count(4).await.unwrap();
    client.set_fixed_key(false).await.unwrap();
    let key = MaskedKey::random(SHARES, &mut rng).unwrap();

    let first = client
        .encrypt_key(ad, m, &key, Some(&[9; 16]))
        .await
        .unwrap();
    let inputs = client.unroll_inputs(4);
    assert_eq!(inputs[0].key, key);
    assert_eq!(inputs[0].nonce, [9; 16]);
    assert_eq!(reference_ciphertext(&inputs[3], m, ad).unwrap(), first);

    // without a nonce the device continues from the state of the previous run
    let second = client.encrypt(ad, m, None).await.unwrap();
    let inputs = client.unroll_inputs(4);
    assert_ne!(inputs[0].key.unmask(), key.unmask());
    assert_eq!(reference_ciphertext(&inputs[3], m, ad).unwrap(), second);
}

#[tokio::test]
async fn capture_batches_match_the_reference_engine() {
    let config = start_device().await;
    let mut client = HarnessClient::connect(&config).await.unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    let settings = CaptureSettings {
        number: 6,
        batch: 3,
        fixed_key: true,
        key: Some([0x77; 16]),
        message_len: 16,
        ad_len: 4,
    };

    let capture = run_capture(&mut client, &settings, &mut rng).await.unwrap();
    assert_eq!(capture.batches.len(), 2);
    assert_eq!(capture.encryptions(), 6);
    assert!(capture.all_verified());
    for inputs in capture.batches.iter().flat_map(|b| b.inputs.iter()) {
        assert_eq!(inputs.key, "77".repeat(16));
    }

    let path = std::env::temp_dir().join(format!("capture-{}.json", std::process::id()));
    capture.write_json(&path).unwrap();
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(saved["batches"][1]["inputs"].as_array().unwrap().len(), 3);
    assert_eq!(saved["shares"], SHARES);
}

#[tokio::test]
async fn known_answer_tests_run_on_the_device() {
    let config = start_device().await;
    let mut client = HarnessClient::connect(&config).await.unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    let (key, nonce) = ([0x11; 16], [0x22; 16]);
    let good = hex::encode_upper(reference_encrypt(b"AB", &[0x00, 0xff], &nonce, &key));
    let bad = "00".repeat(18);
    let src = format!(
        "Count = 1\nKey = {k}\nNonce = {n}\nPT = 4142\nAD = 00FF\nCT = {good}\n\n\
         Count = 2\nKey = {k}\nNonce = {n}\nPT = 4142\nAD = 00FF\nCT = {bad}\n",
        k = hex::encode(key),
        n = hex::encode(nonce),
        good = good,
        bad = bad
    );

    let vectors = parse_kat(&src).unwrap();
    let report = run_on_device(&mut client, &vectors, &mut rng).await.unwrap();
    assert_eq!(report, KatReport { passed: 1, failed: 1 });
}
