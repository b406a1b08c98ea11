//! # End-to-End Scenarios
//!
//! The four reference flows of the platform:
//!
//! 1. **Signed execution**: 2-of-3 approvers move 1 ETH out of a 5 ETH escrow
//! 2. **Expired deadline**: same request with a past deadline, nonce untouched
//! 3. **Dev mode deposits**: non-whitelisted depositor rejected until live mode
//! 4. **Threshold guard**: removing an approver below the threshold reverts

#[cfg(test)]
mod tests {
    use crate::platform::*;
    use ev_03_escrow::{CallContext, ChainAccess, EscrowError, EscrowEventKind};
    use shared_types::U256;

    // =========================================================================
    // SCENARIO A: SIGNED EXECUTION
    // =========================================================================

    #[test]
    fn test_scenario_a_two_of_three_signed_execution() {
        let platform = Platform::new();
        let approvers = signers(3);
        let escrow = platform.create(&approvers, 2);
        platform.fund(&escrow, USER, ether(5));
        assert_eq!(escrow.nonce(), U256::zero());

        let request = signed_request(
            &escrow,
            &[&approvers[0], &approvers[1]],
            TARGET,
            ether(1),
            &[0xde, 0xad, 0xbe, 0xef],
            NOW + 3_600,
        );
        escrow.execute_with_signatures(OUTSIDER, &request).unwrap();

        assert_eq!(escrow.nonce(), U256::one());
        assert_eq!(platform.chain.native_balance(escrow.address()), ether(4));
        assert_eq!(platform.chain.native_balance(TARGET), ether(1));

        let calls = platform.chain.calls();
        let last = calls.last().unwrap();
        assert_eq!(last.to, TARGET);
        assert_eq!(last.data.as_slice(), [0xde_u8, 0xad, 0xbe, 0xef].as_slice());

        match platform.escrow_log.last().map(|e| e.kind) {
            Some(EscrowEventKind::SignedExecution { signers, nonce, .. }) => {
                assert_eq!(nonce, U256::zero());
                assert_eq!(signers, vec![approvers[0].address(), approvers[1].address()]);
            }
            other => panic!("unexpected last event: {other:?}"),
        }
    }

    // =========================================================================
    // SCENARIO B: EXPIRED DEADLINE
    // =========================================================================

    #[test]
    fn test_scenario_b_past_deadline_reverts() {
        let platform = Platform::new();
        let approvers = signers(3);
        let escrow = platform.create(&approvers, 2);
        platform.fund(&escrow, USER, ether(5));
        let events_before = platform.escrow_log.len();

        let request = signed_request(
            &escrow,
            &[&approvers[0], &approvers[1]],
            TARGET,
            ether(1),
            &[0xde, 0xad],
            NOW - 1,
        );
        let result = escrow.execute_with_signatures(OUTSIDER, &request);

        assert_eq!(
            result,
            Err(EscrowError::DeadlineExpired {
                deadline: NOW - 1,
                now: NOW,
            })
        );
        assert_eq!(escrow.nonce(), U256::zero());
        assert_eq!(platform.chain.native_balance(escrow.address()), ether(5));
        assert_eq!(platform.escrow_log.len(), events_before);
    }

    #[test]
    fn test_scenario_b_deadline_equal_to_now_is_expired() {
        let platform = Platform::new();
        let approvers = signers(3);
        let escrow = platform.create(&approvers, 2);
        platform.fund(&escrow, USER, ether(5));

        let request = signed_request(
            &escrow,
            &[&approvers[0], &approvers[1]],
            TARGET,
            ether(1),
            &[],
            NOW,
        );
        assert!(matches!(
            escrow.execute_with_signatures(OUTSIDER, &request),
            Err(EscrowError::DeadlineExpired { .. })
        ));
    }

    // =========================================================================
    // SCENARIO C: DEV MODE DEPOSITS
    // =========================================================================

    #[test]
    fn test_scenario_c_live_mode_opens_deposits() {
        let platform = Platform::new();
        let escrow = platform.create(&signers(3), 2);
        platform.chain.set_native_balance(OUTSIDER, ether(2));

        let rejected = escrow.deposit_eth(CallContext::new(OUTSIDER).with_value(ether(1)));
        assert_eq!(rejected, Err(EscrowError::DepositorNotWhitelisted(OUTSIDER)));
        assert_eq!(platform.chain.native_balance(escrow.address()), U256::zero());
        assert_eq!(platform.chain.native_balance(OUTSIDER), ether(2));

        platform.factory.enable_live_mode(ADMIN).unwrap();

        escrow
            .deposit_eth(CallContext::new(OUTSIDER).with_value(ether(1)))
            .unwrap();
        assert_eq!(platform.chain.native_balance(escrow.address()), ether(1));
        assert_eq!(platform.chain.native_balance(OUTSIDER), ether(1));
    }

    #[test]
    fn test_scenario_c_only_factory_owner_flips_live_mode() {
        let platform = Platform::new();
        let escrow = platform.create(&signers(3), 2);

        assert!(platform.factory.enable_live_mode(OUTSIDER).is_err());
        assert!(platform.factory.enable_live_mode(USER).is_err());

        platform.chain.set_native_balance(OUTSIDER, ether(1));
        assert!(escrow
            .deposit_eth(CallContext::new(OUTSIDER).with_value(ether(1)))
            .is_err());
    }

    // =========================================================================
    // SCENARIO D: THRESHOLD GUARD
    // =========================================================================

    #[test]
    fn test_scenario_d_removal_below_threshold_reverts() {
        let platform = Platform::new();
        let approvers = signers(2);
        let escrow = platform.create(&approvers, 2);
        let before = escrow.approvers();

        let result = escrow.remove_approver(USER, approvers[0].address());

        assert_eq!(
            result,
            Err(EscrowError::WouldBreakThreshold {
                remaining: 1,
                threshold: 2,
            })
        );
        assert_eq!(escrow.approvers(), before);
        assert_eq!(escrow.threshold(), 2);
        assert!(escrow.is_approver(approvers[0].address()));
        assert!(escrow.approvers_consistent());
    }

    #[test]
    fn test_scenario_d_lower_threshold_then_remove() {
        let platform = Platform::new();
        let approvers = signers(2);
        let escrow = platform.create(&approvers, 2);

        escrow.update_threshold(USER, 1).unwrap();
        escrow.remove_approver(USER, approvers[0].address()).unwrap();

        assert_eq!(escrow.approvers(), vec![approvers[1].address()]);
        assert!(!escrow.is_approver(approvers[0].address()));
        assert!(escrow.approvers_consistent());
    }
}
