//! # Signature Attacks
//!
//! Forged, replayed and malleated approvals against `execute_with_signatures`.
//! Every rejected attempt must leave the nonce and balances untouched.

#[cfg(test)]
mod tests {
    use crate::platform::*;
    use ev_01_signature_verification::test_utils::LocalSigner;
    use ev_01_signature_verification::{
        ExecutionPayload, SignatureError, SignatureVerificationApi, SignatureVerificationService,
        SECP256K1_HALF_ORDER,
    };
    use ev_03_escrow::{ChainAccess, EscrowError, ExecutionRequest, MAX_APPROVERS};
    use ev_04_factory::{DeploymentMode, EscrowDirectory, FactoryConfig, FactoryError};
    use ev_telemetry::SIGNATURE_REJECTIONS;
    use shared_types::{Address, Bytes, U256};

    const OTHER_POOL: Address = Address::new([0x92; 20]);

    fn assert_untouched(platform: &Platform, escrow: &ev_03_escrow::Escrow, balance: U256) {
        assert_eq!(escrow.nonce(), U256::zero());
        assert_eq!(platform.chain.native_balance(escrow.address()), balance);
    }

    // =========================================================================
    // MALLEABILITY
    // =========================================================================

    #[test]
    fn test_high_s_twin_is_rejected() {
        let platform = Platform::new();
        let approvers = signers(3);
        let escrow = platform.create(&approvers, 2);
        platform.fund(&escrow, USER, ether(2));

        let mut request = signed_request(
            &escrow,
            &[&approvers[0], &approvers[1]],
            TARGET,
            ether(1),
            &[],
            NOW + 600,
        );
        request.signatures[1] = LocalSigner::malleate(&request.signatures[1]);
        let before = SIGNATURE_REJECTIONS.with_label_values(&["malleable"]).get();

        assert_eq!(
            escrow.execute_with_signatures(OUTSIDER, &request),
            Err(EscrowError::InvalidSignature(
                SignatureError::MalleableSignature
            ))
        );
        assert!(SIGNATURE_REJECTIONS.with_label_values(&["malleable"]).get() > before);
        assert_untouched(&platform, &escrow, ether(2));
    }

    /// x-coordinate of the secp256k1 generator; any on-curve x recovers a key.
    const GENERATOR_X: [u8; 32] = [
        0x79, 0xBE, 0x66, 0x7E, 0xF9, 0xDC, 0xBB, 0xAC, 0x55, 0xA0, 0x62, 0x95, 0xCE, 0x87, 0x0B,
        0x07, 0x02, 0x9B, 0xFC, 0xDB, 0x2D, 0xCE, 0x28, 0xD9, 0x59, 0xF2, 0x81, 0x5B, 0x16, 0xF8,
        0x17, 0x98,
    ];

    fn blob(r: &[u8; 32], s: &[u8; 32], v: u8) -> Vec<u8> {
        let mut out = Vec::with_capacity(65);
        out.extend_from_slice(r);
        out.extend_from_slice(s);
        out.push(v);
        out
    }

    #[test]
    fn test_s_at_half_order_is_canonical() {
        let platform = Platform::new();
        let deadline = NOW + 600;
        let predicted = platform.factory.predict_address(USER, POOL);
        let payload = ExecutionPayload::new(
            predicted,
            USER,
            CHAIN_ID,
            TARGET,
            ether(1),
            &[],
            U256::zero(),
            deadline,
        );

        // Whoever recovers from (Gx, n/2) over this payload is the approver.
        let boundary = blob(&GENERATOR_X, &SECP256K1_HALF_ORDER, 27);
        let approver = SignatureVerificationService::new()
            .recover_signers(&payload.digest(), std::slice::from_ref(&boundary))
            .remove(0)
            .unwrap();

        let created = platform
            .factory
            .create_escrow(USER, POOL, vec![approver], 1, None)
            .unwrap();
        assert_eq!(created.escrow, predicted);
        let escrow = platform.factory.resolve(predicted).unwrap();
        platform.fund(&escrow, USER, ether(2));

        let mut above = SECP256K1_HALF_ORDER;
        above[31] += 1;
        let request = |signature: Vec<u8>| ExecutionRequest {
            target: TARGET,
            value: ether(1),
            data: Bytes::new(),
            signatures: vec![signature],
            deadline,
        };

        assert_eq!(
            escrow.execute_with_signatures(OUTSIDER, &request(blob(&GENERATOR_X, &above, 27))),
            Err(EscrowError::InvalidSignature(
                SignatureError::MalleableSignature
            ))
        );
        escrow
            .execute_with_signatures(OUTSIDER, &request(boundary))
            .unwrap();
        assert_eq!(escrow.nonce(), U256::one());
        assert_eq!(platform.chain.native_balance(TARGET), ether(1));
    }

    #[test]
    fn test_malformed_blob_is_rejected() {
        let platform = Platform::new();
        let approvers = signers(2);
        let escrow = platform.create(&approvers, 1);
        platform.fund(&escrow, USER, ether(1));

        let mut request =
            signed_request(&escrow, &[&approvers[0]], TARGET, ether(1), &[], NOW + 600);
        request.signatures[0].truncate(64);

        assert_eq!(
            escrow.execute_with_signatures(OUTSIDER, &request),
            Err(EscrowError::InvalidSignature(SignatureError::InvalidLength(
                64
            )))
        );
        assert_untouched(&platform, &escrow, ether(1));
    }

    #[test]
    fn test_one_bad_signature_spoils_the_set() {
        let platform = Platform::new();
        let approvers = signers(3);
        let escrow = platform.create(&approvers, 2);
        platform.fund(&escrow, USER, ether(1));

        // Two valid signatures meet the threshold, a third garbage one still aborts.
        let mut request = signed_request(
            &escrow,
            &[&approvers[0], &approvers[1]],
            TARGET,
            ether(1),
            &[],
            NOW + 600,
        );
        let mut garbage = request.signatures[0].clone();
        garbage[64] = 31;
        request.signatures.push(garbage);

        assert_eq!(
            escrow.execute_with_signatures(OUTSIDER, &request),
            Err(EscrowError::InvalidSignature(
                SignatureError::InvalidRecoveryId(31)
            ))
        );
        assert_untouched(&platform, &escrow, ether(1));
    }

    // =========================================================================
    // REPLAY
    // =========================================================================

    #[test]
    fn test_replay_after_success_fails() {
        let platform = Platform::new();
        let approvers = signers(3);
        let escrow = platform.create(&approvers, 2);
        platform.fund(&escrow, USER, ether(3));

        let request = signed_request(
            &escrow,
            &[&approvers[0], &approvers[1]],
            TARGET,
            ether(1),
            &[],
            NOW + 600,
        );
        escrow.execute_with_signatures(OUTSIDER, &request).unwrap();

        assert!(escrow.execute_with_signatures(OUTSIDER, &request).is_err());
        assert_eq!(escrow.nonce(), U256::one());
        assert_eq!(platform.chain.native_balance(escrow.address()), ether(2));
    }

    #[test]
    fn test_signatures_do_not_transfer_between_escrows() {
        let platform = Platform::new();
        let approvers = signers(2);
        let first = platform.create(&approvers, 2);
        let second = platform.create_for(USER, OTHER_POOL, &approvers, 2);
        platform.fund(&first, USER, ether(1));
        platform.fund(&second, USER, ether(1));

        let for_first = signed_request(
            &first,
            &[&approvers[0], &approvers[1]],
            TARGET,
            ether(1),
            &[],
            NOW + 600,
        );

        assert!(second.execute_with_signatures(OUTSIDER, &for_first).is_err());
        assert_untouched(&platform, &second, ether(1));
        first.execute_with_signatures(OUTSIDER, &for_first).unwrap();
    }

    #[test]
    fn test_stale_handle_cannot_replay_after_upgrade() {
        let platform = Platform::with_config(FactoryConfig {
            deployment_mode: DeploymentMode::Proxy,
            ..FactoryConfig::default()
        });
        let approvers = signers(2);
        let stale = platform.create(&approvers, 2);
        let address = stale.address();
        platform.fund(&stale, USER, ether(5));

        platform.factory.upgrade_escrow(ADMIN, address).unwrap();
        let current = platform.factory.resolve(address).unwrap();
        let request = signed_request(
            &current,
            &[&approvers[0], &approvers[1]],
            TARGET,
            ether(2),
            &[],
            NOW + 600,
        );

        assert_eq!(
            stale.execute_with_signatures(OUTSIDER, &request),
            Err(EscrowError::Retired(address))
        );
        current.execute_with_signatures(OUTSIDER, &request).unwrap();
        assert_eq!(
            stale.execute_with_signatures(OUTSIDER, &request),
            Err(EscrowError::Retired(address))
        );
        assert_eq!(
            stale.withdraw_eth(USER, USER),
            Err(EscrowError::Retired(address))
        );

        assert_eq!(current.nonce(), U256::one());
        assert_eq!(platform.chain.native_balance(TARGET), ether(2));
        assert_eq!(platform.chain.native_balance(address), ether(3));
    }

    #[test]
    fn test_tampered_fields_break_every_signature() {
        let platform = Platform::new();
        let approvers = signers(2);
        let escrow = platform.create(&approvers, 2);
        platform.fund(&escrow, USER, ether(5));

        let signed = signed_request(
            &escrow,
            &[&approvers[0], &approvers[1]],
            TARGET,
            ether(1),
            &[0x01],
            NOW + 600,
        );

        let mut value = signed.clone();
        value.value = ether(5);
        let mut data = signed.clone();
        data.data = vec![0x02].into();
        let mut deadline = signed.clone();
        deadline.deadline += 1;

        for tampered in [value, data, deadline] {
            assert!(matches!(
                escrow.execute_with_signatures(OUTSIDER, &tampered),
                Err(EscrowError::NotApprover(_))
            ));
        }
        assert_untouched(&platform, &escrow, ether(5));
    }

    // =========================================================================
    // SIGNER SET
    // =========================================================================

    #[test]
    fn test_duplicated_signer_counts_once() {
        let platform = Platform::new();
        let approvers = signers(3);
        let escrow = platform.create(&approvers, 2);
        platform.fund(&escrow, USER, ether(1));

        let request = signed_request(
            &escrow,
            &[&approvers[0], &approvers[0]],
            TARGET,
            ether(1),
            &[],
            NOW + 600,
        );
        assert_eq!(
            escrow.execute_with_signatures(OUTSIDER, &request),
            Err(EscrowError::DuplicateSigner(approvers[0].address()))
        );
        assert_untouched(&platform, &escrow, ether(1));
    }

    #[test]
    fn test_outsider_signature_is_rejected() {
        let platform = Platform::new();
        let approvers = signers(2);
        let escrow = platform.create(&approvers, 2);
        platform.fund(&escrow, USER, ether(1));
        let intruder = LocalSigner::from_seed(99);

        let request = signed_request(
            &escrow,
            &[&approvers[0], &intruder],
            TARGET,
            ether(1),
            &[],
            NOW + 600,
        );
        assert_eq!(
            escrow.execute_with_signatures(OUTSIDER, &request),
            Err(EscrowError::NotApprover(intruder.address()))
        );
        assert_untouched(&platform, &escrow, ether(1));
    }

    #[test]
    fn test_removed_approver_loses_signing_power() {
        let platform = Platform::new();
        let approvers = signers(3);
        let escrow = platform.create(&approvers, 2);
        platform.fund(&escrow, USER, ether(1));
        escrow.remove_approver(USER, approvers[2].address()).unwrap();

        let request = signed_request(
            &escrow,
            &[&approvers[0], &approvers[2]],
            TARGET,
            ether(1),
            &[],
            NOW + 600,
        );
        assert_eq!(
            escrow.execute_with_signatures(OUTSIDER, &request),
            Err(EscrowError::NotApprover(approvers[2].address()))
        );
    }

    #[test]
    fn test_default_bot_cannot_push_set_past_capacity() {
        let platform = Platform::with_config(FactoryConfig {
            default_bot: Some(BOT),
            ..FactoryConfig::default()
        });
        let full = signers(MAX_APPROVERS as u64);

        let result = platform
            .factory
            .create_escrow(USER, POOL, addresses(&full), 1, None);
        assert!(matches!(
            result,
            Err(FactoryError::Escrow(EscrowError::TooManyApprovers { .. }))
        ));
        assert_eq!(platform.factory.escrow_count(), 0);
        assert_eq!(platform.factory.registry().escrow_for(USER, POOL), None);

        platform
            .factory
            .create_escrow(USER, POOL, addresses(&full[1..]), 1, None)
            .unwrap();
    }
}
