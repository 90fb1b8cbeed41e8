// Copyright 2022 The ed25519-ringct Developers
// SPDX-License-Identifier: BSD-3-Clause

//! End-to-end scenarios exercising the public surface the way a wallet
//! would: hashing known answers, commitment parity, range proofs, ring
//! signatures and the audit bundle.

use ed25519_ringct::{
    common::{generate_key_image, generate_keys_m},
    hashing::{argon2id, blake2b, sha3},
    proofs::{audit, bulletproofs, bulletproofs_plus},
    ringct::{check_commitments_parity, generate_pedersen_commitment, generate_pseudo_commitments},
    signatures::clsag,
    EdwardsPoint, PointProtocol, Scalar, ScalarProtocol,
};
use rand::thread_rng;

const KAT_INPUT: &str = "cfc765d905c65e2b61816dc1f0fd69f6f6779f36ed6239ac7e21ff51ef2c891e";

#[test]
fn sha3_known_answer() {
    let input = hex::decode(KAT_INPUT).unwrap();
    assert_eq!(
        sha3(&input).to_string(),
        "974506601a60dc465e6e9acddb563889e63471849ec4198656550354b8541fcb"
    );
}

#[test]
fn blake2b_known_answer() {
    let input = hex::decode(KAT_INPUT).unwrap();
    assert_eq!(
        blake2b(&input).to_string(),
        "56a8ef7f9d7db21fa29b83eb77551f0c3e312525d6151946261911fc38a508c4"
    );
}

#[test]
fn argon2id_known_answer() {
    let input = hex::decode(KAT_INPUT).unwrap();
    assert_eq!(
        argon2id(&input, 4, 1024, 1).unwrap().to_string(),
        "a6ac954bce48a46bc01a9b16b484ffb745401ae421b1b6f2e22cf474d4cac1c9"
    );
}

#[test]
fn ringct_parity_for_balanced_transaction() {
    let mut rng = thread_rng();

    // two outputs of 1000 each, inputs covering them plus a fee of 100
    let output_blinding = Scalar::random_many(&mut rng, 2);
    let output_commitments = vec![
        generate_pedersen_commitment(&output_blinding[0], 1000),
        generate_pedersen_commitment(&output_blinding[1], 1000),
    ];

    let (pseudo_blinding, pseudo_commitments) =
        generate_pseudo_commitments(&[1000, 1100], &output_blinding).unwrap();
    assert_eq!(pseudo_blinding.len(), 2);

    assert!(check_commitments_parity(&pseudo_commitments, &output_commitments, 100));
    assert!(!check_commitments_parity(&pseudo_commitments, &output_commitments, 101));
}

#[test]
fn bulletproof_out_of_range_amount_fails() {
    let mut rng = thread_rng();
    let blinding = Scalar::random_many(&mut rng, 1);

    // 1000 >= 256, so an 8-bit range claim must not verify
    let (proof, commitments) = bulletproofs::prove(&[1000], &blinding, 8).unwrap();
    assert!(!bulletproofs::verify(&proof, &commitments, 8).unwrap());

    let (proof, commitments) = bulletproofs_plus::prove(&[1000], &blinding, 8).unwrap();
    assert!(!bulletproofs_plus::verify(&proof, &commitments, 8).unwrap());
}

#[test]
fn range_proof_batches_agree_with_individual_verification() {
    let mut rng = thread_rng();
    let blinding_a = Scalar::random_many(&mut rng, 1);
    let blinding_b = Scalar::random_many(&mut rng, 4);

    let (proof_a, commitments_a) = bulletproofs::prove(&[42], &blinding_a, 32).unwrap();
    let (proof_b, commitments_b) =
        bulletproofs::prove(&[1, 2, 3, 2u64.pow(31)], &blinding_b, 32).unwrap();

    assert!(bulletproofs::verify(&proof_a, &commitments_a, 32).unwrap());
    assert!(bulletproofs::verify(&proof_b, &commitments_b, 32).unwrap());
    assert!(bulletproofs::verify_batch(
        &[proof_a, proof_b],
        &[commitments_a, commitments_b],
        32
    )
    .unwrap());

    let (plus_a, plus_commit_a) = bulletproofs_plus::prove(&[42], &blinding_a, 32).unwrap();
    let (plus_b, plus_commit_b) =
        bulletproofs_plus::prove(&[1, 2, 3, 2u64.pow(31)], &blinding_b, 32).unwrap();

    assert!(bulletproofs_plus::verify(&plus_a, &plus_commit_a, 32).unwrap());
    assert!(bulletproofs_plus::verify(&plus_b, &plus_commit_b, 32).unwrap());
    assert!(bulletproofs_plus::verify_batch(
        &[plus_a, plus_b],
        &[plus_commit_a, plus_commit_b],
        32
    )
    .unwrap());
}

#[test]
fn clsag_round_trip_with_tampered_key_image() {
    let mut rng = thread_rng();

    // a 4-ring with the real signer at index 2
    let (ring, secrets) = generate_keys_m(&mut rng, 4);
    let secret = secrets[2];
    let key_image = generate_key_image(&ring[2], &secret).unwrap();

    let digest = sha3(b"spend authorization");
    let signature = clsag::generate_ring_signature(&digest, &secret, &ring, None).unwrap();

    assert!(clsag::check_ring_signature(&digest, &key_image, &ring, &signature, &[]));

    // replacing the key image with any other valid subgroup point fails
    let other_image = EdwardsPoint::random(&mut rng);
    assert!(other_image.check_subgroup());
    assert!(!clsag::check_ring_signature(&digest, &other_image, &ring, &signature, &[]));
}

#[test]
fn audit_proof_over_several_outputs() {
    let mut rng = thread_rng();
    let (public_keys, secret_keys) = generate_keys_m(&mut rng, 5);

    let proof = audit::generate_outputs_proof(&secret_keys).unwrap();

    let key_images = audit::check_outputs_proof(&public_keys, &proof).unwrap();
    assert_eq!(key_images.len(), 5);
    for ((public_key, secret_key), key_image) in
        public_keys.iter().zip(secret_keys.iter()).zip(key_images.iter())
    {
        assert_eq!(*key_image, generate_key_image(public_key, secret_key).unwrap());
    }

    // the bundle is all-or-nothing: fewer ephemerals fail
    assert!(audit::check_outputs_proof(&public_keys[..4], &proof).is_none());
}
