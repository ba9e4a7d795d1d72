//! Lifecycle tests: deposit, withdraw and double-spend against a mock
//! ledger and a mock prover.
//!
//! The mock ledger enforces what the real one does (root freshness,
//! ext-data hash binding, public-amount consistency, nullifier non-reuse)
//! and appends output commitments in submission order. The mock prover
//! re-derives the balance equation from the private inputs the way the
//! circuit's constraints would, then publishes the public signals in the
//! protocol order.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use anyhow::{bail, ensure, Result};
    use ark_bn254::Fr;
    use privacy_pool_lib::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const MINT_A: [u8; 32] = [0x0A; 32];
    const LEVELS: usize = 8;

    /// Prover stand-in: checks the per-slot balance constraint from the
    /// private inputs, then echoes the public signals the circuit would
    /// publish.
    struct MockProver;

    impl Prover for MockProver {
        fn prove(&self, input: &ProofInput) -> std::result::Result<ProofBundle, ProverError> {
            for (slot, mint) in input.mint_address.iter().enumerate() {
                if slot == 1 && input.mint_address[1] == input.mint_address[0] {
                    continue;
                }
                let mut lhs = Fr::from(0u64);
                for i in 0..2 {
                    if &input.in_asset_id[i] == mint {
                        lhs += Fr::from(input.in_amount[i]);
                    }
                }
                let public = match slot {
                    0 => input.public_amount0,
                    _ => input.public_amount1,
                };
                lhs += field::from_be_bytes_mod_order(&public);
                let mut rhs = Fr::from(0u64);
                for i in 0..2 {
                    if &input.out_asset_id[i] == mint {
                        rhs += Fr::from(input.out_amount[i]);
                    }
                }
                if lhs != rhs {
                    return Err(ProverError::Backend(format!(
                        "balance constraint unsatisfied for slot {slot}"
                    )));
                }
            }
            Ok(ProofBundle {
                proof: vec![0xAB; 256],
                public_signals: input.to_public_signals().encode(),
            })
        }
    }

    /// Ledger stand-in: atomic, authoritative nullifier and root checks.
    struct MockLedger {
        tree: MerkleAccumulator,
        spent: HashSet<[u8; 32]>,
    }

    impl MockLedger {
        fn new() -> Self {
            MockLedger {
                tree: MerkleAccumulator::new(LEVELS).unwrap(),
                spent: HashSet::new(),
            }
        }

        fn submit(&mut self, bundle: &ProofBundle, ext_data: &ExtData) -> Result<()> {
            let signals = PublicSignals::decode(&bundle.public_signals)?;

            let root = field::from_be_bytes_mod_order(&signals.root);
            ensure!(self.tree.is_known_root(root), "unknown root");

            let expected_hash = field::to_be_bytes(&ext_data.hash());
            ensure!(
                signals.ext_data_hash == expected_hash,
                "ext data hash mismatch"
            );

            if ext_data.ext_amount != 0 {
                ensure!(
                    check_public_amount(
                        ext_data.ext_amount,
                        ext_data.fee,
                        &signals.public_amount0
                    ),
                    "invalid public amount"
                );
                validate_fee(ext_data.ext_amount, ext_data.fee)?;
            }

            for nullifier in &signals.input_nullifiers {
                if self.spent.contains(nullifier) {
                    bail!("nullifier already spent");
                }
            }
            for nullifier in &signals.input_nullifiers {
                self.spent.insert(*nullifier);
            }

            for commitment in &signals.output_commitments {
                self.tree
                    .insert(field::from_be_bytes_mod_order(commitment))?;
            }
            Ok(())
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(2024)
    }

    fn asset_a() -> Fr {
        field::from_be_bytes_mod_order(&MINT_A)
    }

    fn ext_data(ext_amount: i64, fee: u64, memo: Vec<u8>) -> ExtData {
        ExtData {
            recipient: [0x11; 32],
            ext_amount,
            encrypted_output: memo,
            fee,
            fee_recipient: [0x22; 32],
            mint_a: MINT_A,
            mint_b: MINT_A,
        }
    }

    /// Sync a client mirror from accepted public signals, in ledger order.
    fn advance_mirror(mirror: &mut MerkleAccumulator, bundle: &ProofBundle) {
        let signals = PublicSignals::decode(&bundle.public_signals).unwrap();
        for commitment in &signals.output_commitments {
            mirror
                .insert(field::from_be_bytes_mod_order(commitment))
                .unwrap();
        }
    }

    #[test]
    fn test_deposit_withdraw_lifecycle_with_double_spend_rejection() {
        let mut rng = rng();
        let mut ledger = MockLedger::new();
        let mut mirror = MerkleAccumulator::new(LEVELS).unwrap();
        let prover = MockProver;

        // Deposit 100000 of asset A. Fee is 500, so the shielded note
        // carries 99500.
        let keypair = Keypair::random(&mut rng).unwrap();
        let deposit_fee = deposit_fee(100_000);
        assert_eq!(deposit_fee, 500);
        let deposit_note =
            Note::new(100_000 - deposit_fee, asset_a(), keypair.clone(), &mut rng).unwrap();

        let deposit_ext = ext_data(100_000, deposit_fee, vec![0xC0, 0xDE]);
        let spec = TransactionSpec {
            inputs: vec![],
            outputs: vec![deposit_note.clone()],
            ext_data: deposit_ext.clone(),
            ext_amount1: 0,
        };
        let input = assemble(&mirror, &spec, &mut rng).unwrap();
        let bundle = prover.prove(&input).unwrap();

        ledger.submit(&bundle, &deposit_ext).unwrap();
        // One real output plus one zero-padding output.
        assert_eq!(ledger.tree.leaf_count(), 2);

        advance_mirror(&mut mirror, &bundle);
        assert_eq!(mirror.root(), ledger.tree.root());

        // The deposited note is live at index 0.
        let commitment = deposit_note.commitment().unwrap();
        let index = mirror.index_of(commitment).unwrap();
        let deposit_note = deposit_note.with_index(index);

        // Withdraw 50000 from it. Change is 99500 - 50000 - 125 = 49375.
        let withdraw_fee = withdrawal_fee(50_000);
        assert_eq!(withdraw_fee, 125);
        let change = Note::new(
            100_000 - deposit_fee - 50_000 - withdraw_fee,
            asset_a(),
            keypair,
            &mut rng,
        )
        .unwrap();
        assert_eq!(change.amount, 49_375);

        let withdraw_ext = ext_data(-50_000, withdraw_fee, vec![]);
        let spec = TransactionSpec {
            inputs: vec![deposit_note.clone()],
            outputs: vec![change],
            ext_data: withdraw_ext.clone(),
            ext_amount1: 0,
        };
        let input = assemble(&mirror, &spec, &mut rng).unwrap();
        let bundle = prover.prove(&input).unwrap();
        ledger.submit(&bundle, &withdraw_ext).unwrap();
        assert_eq!(ledger.tree.leaf_count(), 4);
        advance_mirror(&mut mirror, &bundle);

        // Replaying the exact same withdrawal must be rejected.
        let err = ledger.submit(&bundle, &withdraw_ext).unwrap_err();
        assert!(err.to_string().contains("nullifier already spent"));
    }

    #[test]
    fn test_double_spend_rejected_even_with_fresh_outputs() {
        let mut rng = rng();
        let mut ledger = MockLedger::new();
        let mut mirror = MerkleAccumulator::new(LEVELS).unwrap();
        let prover = MockProver;

        let keypair = Keypair::random(&mut rng).unwrap();
        let fee = deposit_fee(100_000);
        let note = Note::new(100_000 - fee, asset_a(), keypair.clone(), &mut rng).unwrap();
        let ext = ext_data(100_000, fee, vec![]);
        let spec = TransactionSpec {
            inputs: vec![],
            outputs: vec![note.clone()],
            ext_data: ext.clone(),
            ext_amount1: 0,
        };
        let bundle = prover.prove(&assemble(&mirror, &spec, &mut rng).unwrap()).unwrap();
        ledger.submit(&bundle, &ext).unwrap();
        advance_mirror(&mut mirror, &bundle);

        let index = mirror.index_of(note.commitment().unwrap()).unwrap();
        let note = note.with_index(index);

        // Two withdrawals of the same note with different blinding on the
        // change notes: different proofs and outputs, same nullifier.
        let wfee = withdrawal_fee(50_000);
        let wext = ext_data(-50_000, wfee, vec![]);
        let build = |rng: &mut StdRng| {
            let change = Note::new(
                note.amount - 50_000 - wfee,
                asset_a(),
                keypair.clone(),
                rng,
            )
            .unwrap();
            let spec = TransactionSpec {
                inputs: vec![note.clone()],
                outputs: vec![change],
                ext_data: wext.clone(),
                ext_amount1: 0,
            };
            prover.prove(&assemble(&mirror, &spec, rng).unwrap()).unwrap()
        };
        let first = build(&mut rng);
        let second = build(&mut rng);

        let s1 = PublicSignals::decode(&first.public_signals).unwrap();
        let s2 = PublicSignals::decode(&second.public_signals).unwrap();
        assert_ne!(s1.output_commitments, s2.output_commitments);
        assert_eq!(s1.input_nullifiers[0], s2.input_nullifiers[0]);

        ledger.submit(&first, &wext).unwrap();
        let err = ledger.submit(&second, &wext).unwrap_err();
        assert!(err.to_string().contains("nullifier already spent"));
    }

    #[test]
    fn test_slightly_stale_root_is_accepted() {
        let mut rng = rng();
        let mut ledger = MockLedger::new();
        let mut mirror = MerkleAccumulator::new(LEVELS).unwrap();
        let prover = MockProver;

        // Build a deposit against the empty root.
        let fee = deposit_fee(10_000);
        let note = Note::new(
            10_000 - fee,
            asset_a(),
            Keypair::random(&mut rng).unwrap(),
            &mut rng,
        )
        .unwrap();
        let ext = ext_data(10_000, fee, vec![]);
        let spec = TransactionSpec {
            inputs: vec![],
            outputs: vec![note],
            ext_data: ext.clone(),
            ext_amount1: 0,
        };
        let stale_bundle = prover.prove(&assemble(&mirror, &spec, &mut rng).unwrap()).unwrap();

        // Another participant's deposit lands first; the ledger root moves.
        let fee2 = deposit_fee(20_000);
        let other = Note::new(
            20_000 - fee2,
            asset_a(),
            Keypair::random(&mut rng).unwrap(),
            &mut rng,
        )
        .unwrap();
        let ext2 = ext_data(20_000, fee2, vec![]);
        let spec2 = TransactionSpec {
            inputs: vec![],
            outputs: vec![other],
            ext_data: ext2.clone(),
            ext_amount1: 0,
        };
        let other_bundle = prover.prove(&assemble(&mirror, &spec2, &mut rng).unwrap()).unwrap();
        ledger.submit(&other_bundle, &ext2).unwrap();

        // Our proof references the previous root; still within history.
        ledger.submit(&stale_bundle, &ext).unwrap();
        assert_eq!(ledger.tree.leaf_count(), 4);
    }

    #[test]
    fn test_desynced_mirror_root_is_rejected() {
        let mut rng = rng();
        let mut ledger = MockLedger::new();
        let mut mirror = MerkleAccumulator::new(LEVELS).unwrap();

        // The client mirror inserts a commitment the ledger never saw; its
        // root never appears in the ledger's history.
        mirror.insert(Fr::from(0xBADu64)).unwrap();

        let fee = deposit_fee(10_000);
        let note = Note::new(
            10_000 - fee,
            asset_a(),
            Keypair::random(&mut rng).unwrap(),
            &mut rng,
        )
        .unwrap();
        let ext = ext_data(10_000, fee, vec![]);
        let spec = TransactionSpec {
            inputs: vec![],
            outputs: vec![note],
            ext_data: ext.clone(),
            ext_amount1: 0,
        };
        let bundle = MockProver.prove(&assemble(&mirror, &spec, &mut rng).unwrap()).unwrap();

        let err = ledger.submit(&bundle, &ext).unwrap_err();
        assert!(err.to_string().contains("unknown root"));
    }

    #[test]
    fn test_ext_data_tamper_breaks_binding() {
        let mut rng = rng();
        let mut ledger = MockLedger::new();
        let mirror = MerkleAccumulator::new(LEVELS).unwrap();

        let fee = deposit_fee(10_000);
        let note = Note::new(
            10_000 - fee,
            asset_a(),
            Keypair::random(&mut rng).unwrap(),
            &mut rng,
        )
        .unwrap();
        let ext = ext_data(10_000, fee, vec![]);
        let spec = TransactionSpec {
            inputs: vec![],
            outputs: vec![note],
            ext_data: ext.clone(),
            ext_amount1: 0,
        };
        let bundle = MockProver.prove(&assemble(&mirror, &spec, &mut rng).unwrap()).unwrap();

        // Redirect the recipient after proving.
        let mut tampered = ext.clone();
        tampered.recipient = [0x66; 32];
        let err = ledger.submit(&bundle, &tampered).unwrap_err();
        assert!(err.to_string().contains("ext data hash mismatch"));
    }

    #[test]
    fn test_mock_prover_rejects_unbalanced_private_inputs() {
        let mut rng = rng();
        let mirror = MerkleAccumulator::new(LEVELS).unwrap();

        let fee = deposit_fee(10_000);
        let note = Note::new(
            10_000 - fee,
            asset_a(),
            Keypair::random(&mut rng).unwrap(),
            &mut rng,
        )
        .unwrap();
        let ext = ext_data(10_000, fee, vec![]);
        let spec = TransactionSpec {
            inputs: vec![],
            outputs: vec![note],
            ext_data: ext,
            ext_amount1: 0,
        };
        let mut input = assemble(&mirror, &spec, &mut rng).unwrap();

        // Inflate an output behind the assembler's back; constraint
        // satisfaction must fail.
        input.out_amount[0] += 1;
        match MockProver.prove(&input) {
            Err(ProverError::Backend(msg)) => assert!(msg.contains("slot 0")),
            other => panic!("expected constraint failure, got {other:?}"),
        }
    }

    #[test]
    fn test_proof_input_serializes_to_json() {
        let mut rng = rng();
        let mirror = MerkleAccumulator::new(LEVELS).unwrap();

        let fee = deposit_fee(10_000);
        let note = Note::new(
            10_000 - fee,
            asset_a(),
            Keypair::random(&mut rng).unwrap(),
            &mut rng,
        )
        .unwrap();
        let spec = TransactionSpec {
            inputs: vec![],
            outputs: vec![note],
            ext_data: ext_data(10_000, fee, vec![1, 2, 3]),
            ext_amount1: 0,
        };
        let input = assemble(&mirror, &spec, &mut rng).unwrap();

        let json = serde_json::to_string_pretty(&input).unwrap();
        let parsed: ProofInput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.out_amount[0], input.out_amount[0]);
        assert_eq!(parsed.root, input.root);
        assert_eq!(hex::encode(parsed.root), hex::encode(input.root));
    }
}
