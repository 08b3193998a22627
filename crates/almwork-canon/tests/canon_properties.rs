use almwork_canon::{content_hash, generate_keypair, hex_sha256, sign_content_hash, verify_signature};
use proptest::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
struct Doc {
    fields: BTreeMap<String, String>,
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn content_hash_is_stable_under_map_insertion_order(
        keys in prop::collection::vec("[a-z]{1,8}", 1..8),
        values in prop::collection::vec("[a-z0-9]{0,16}", 1..8),
    ) {
        let n = keys.len().min(values.len());
        let mut forward = BTreeMap::new();
        let mut backward = BTreeMap::new();
        for i in 0..n {
            forward.insert(keys[i].clone(), values[i].clone());
        }
        for i in (0..n).rev() {
            backward.insert(keys[i].clone(), values[i].clone());
        }

        let h1 = content_hash(&Doc { fields: forward }).unwrap();
        let h2 = content_hash(&Doc { fields: backward }).unwrap();
        prop_assert_eq!(h1, h2);
    }

    #[test]
    fn sha256_hex_is_always_64_chars(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        prop_assert_eq!(hex_sha256(&bytes).len(), 64);
    }
}

#[test]
fn signature_binds_to_exact_content_and_key() {
    let (sk, pk) = generate_keypair().unwrap();
    let hash_a = hex_sha256(b"payload a");
    let hash_b = hex_sha256(b"payload b");

    let sig_a = sign_content_hash(&sk, &hash_a).unwrap();

    assert!(verify_signature(&pk, &hash_a, &sig_a).unwrap());
    assert!(!verify_signature(&pk, &hash_b, &sig_a).unwrap());
}
