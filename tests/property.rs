use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use bitcoin::Network;
use proptest::prelude::*;
use quorum_wallet::{build_multisig, ErrorCode, MultisigPolicy, MAX_SIGNERS};

fn any_secret_key() -> impl Strategy<Value = SecretKey> {
    prop::array::uniform32(any::<u8>()).prop_filter_map("valid secp256k1 scalar", |bytes| {
        SecretKey::from_slice(&bytes).ok()
    })
}

fn distinct_public_keys(max: usize) -> impl Strategy<Value = Vec<PublicKey>> {
    prop::collection::vec(any_secret_key(), 1..=max).prop_filter_map(
        "distinct public keys",
        |secrets| {
            let secp = Secp256k1::new();
            let mut keys: Vec<PublicKey> =
                secrets.iter().map(|sk| sk.public_key(&secp)).collect();
            let before = keys.len();
            keys.sort_by_key(|pk| pk.serialize());
            keys.dedup();
            (keys.len() == before).then_some(keys)
        },
    )
}

proptest! {
    #[test]
    fn policy_construction_matches_bounds(required in any::<u8>(), total in any::<u8>()) {
        let result = MultisigPolicy::new(required, total);
        let in_bounds = required >= 1 && required <= total && total <= MAX_SIGNERS;
        if in_bounds {
            let policy = result.unwrap();
            prop_assert_eq!(policy.required(), required);
            prop_assert_eq!(policy.total(), total);
        } else {
            prop_assert_eq!(result.unwrap_err().code, ErrorCode::InvalidPolicy);
        }
    }

    #[test]
    fn built_scripts_embed_sorted_keys(
        mut keys in distinct_public_keys(MAX_SIGNERS as usize),
        required_seed in any::<u8>(),
        reverse in any::<bool>(),
    ) {
        let total = keys.len() as u8;
        let required = 1 + required_seed % total;
        let policy = MultisigPolicy::new(required, total).unwrap();

        let canonical = build_multisig(policy, &keys, Network::Testnet).unwrap();
        if reverse {
            keys.reverse();
        }
        let rebuilt = build_multisig(policy, &keys, Network::Testnet).unwrap();

        // Input order never leaks into the output
        prop_assert_eq!(&canonical.redeem_script, &rebuilt.redeem_script);
        prop_assert_eq!(&canonical.addresses, &rebuilt.addresses);

        // OP_m, n keys, OP_n, OP_CHECKMULTISIG
        let elements = canonical.redeem_script.instructions().count();
        prop_assert_eq!(elements, keys.len() + 3);

        for pair in canonical.sorted_public_keys.windows(2) {
            prop_assert!(pair[0].serialize() < pair[1].serialize());
        }
    }

    #[test]
    fn address_prefixes_follow_network(keys in distinct_public_keys(5)) {
        let total = keys.len() as u8;
        let policy = MultisigPolicy::new(1, total).unwrap();

        let testnet = build_multisig(policy, &keys, Network::Testnet).unwrap();
        prop_assert!(testnet.addresses.p2sh.starts_with('2'));
        prop_assert!(testnet.addresses.p2wsh.starts_with("tb1"));

        let mainnet = build_multisig(policy, &keys, Network::Bitcoin).unwrap();
        prop_assert!(mainnet.addresses.p2sh.starts_with('3'));
        prop_assert!(mainnet.addresses.p2wsh.starts_with("bc1"));
    }
}
