//! # Emergency Gate Abuse
//!
//! An absent or hostile admin must not be able to lock funds forever, and
//! a pause must never block the owner from exiting.

#[cfg(test)]
mod tests {
    use crate::platform::*;
    use ev_02_circuit_breaker::{selectors, CircuitBreakerError, GateEvent, PauseScope};
    use ev_03_escrow::{CallContext, ChainAccess, EscrowError};
    use ev_04_factory::FactoryError;
    use shared_types::{Address, Bytes, DAY, U256};

    const EMERGENCY_ADMIN: Address = Address::new([0xEA; 20]);

    // =========================================================================
    // AUTO-EXPIRY
    // =========================================================================

    #[test]
    fn test_anyone_clears_global_pause_after_seven_days() {
        let platform = Platform::new();
        let gate = platform.factory.gate();
        platform.factory.activate_global_pause(ADMIN).unwrap();

        platform.clock.advance(7 * DAY - 1);
        assert!(matches!(
            gate.clear_expired_global_pause(OUTSIDER),
            Err(CircuitBreakerError::PauseNotExpired { .. })
        ));
        assert!(gate.pause_state(PauseScope::Global).is_paused());

        platform.clock.advance(2);
        gate.clear_expired_global_pause(OUTSIDER).unwrap();
        assert!(!gate.pause_state(PauseScope::Global).is_paused());
        assert!(matches!(
            platform.gate_log.last(),
            Some(GateEvent::Unpaused {
                scope: PauseScope::Global,
                by,
                forced: true,
            }) if by == OUTSIDER
        ));
    }

    #[test]
    fn test_expired_function_pause_is_cleared_per_selector() {
        let platform = Platform::new();
        let gate = platform.factory.gate();
        platform.factory.pause_critical_functions(ADMIN).unwrap();

        platform.clock.advance(7 * DAY + 1);
        gate.clear_expired_function_pause(OUTSIDER, selectors::execute())
            .unwrap();

        assert!(!gate.pause_state(PauseScope::Function(selectors::execute())).is_paused());
        assert!(gate.pause_state(PauseScope::Function(selectors::multicall())).is_paused());
        assert_eq!(
            gate.clear_expired_function_pause(OUTSIDER, selectors::execute()),
            Err(CircuitBreakerError::NotPaused)
        );
    }

    #[test]
    fn test_only_owner_or_emergency_admin_pauses() {
        let platform = Platform::new();

        assert!(matches!(
            platform.factory.activate_global_pause(OUTSIDER),
            Err(FactoryError::NotOwner(OUTSIDER))
        ));
        assert!(matches!(
            platform.factory.gate().activate_global_pause(OUTSIDER),
            Err(CircuitBreakerError::NotAuthorized(OUTSIDER))
        ));

        platform
            .factory
            .set_emergency_admin(ADMIN, Some(EMERGENCY_ADMIN))
            .unwrap();
        platform
            .factory
            .gate()
            .activate_global_pause(EMERGENCY_ADMIN)
            .unwrap();
        assert!(platform
            .factory
            .gate()
            .pause_state(PauseScope::Global)
            .is_paused());
    }

    // =========================================================================
    // WITHDRAWALS UNDER PAUSE
    // =========================================================================

    #[test]
    fn test_owner_withdraws_through_every_pause() {
        let platform = Platform::new();
        let approvers = signers(2);
        let escrow = platform.create(&approvers, 1);
        platform.fund(&escrow, USER, ether(3));
        platform.chain.mint_token(TOKEN, escrow.address(), U256::from(500u64)).unwrap();

        let request =
            signed_request(&escrow, &[&approvers[0]], TARGET, ether(1), &[], NOW + 600);

        escrow.pause(USER).unwrap();
        platform.factory.activate_global_pause(ADMIN).unwrap();
        platform.factory.pause_critical_functions(ADMIN).unwrap();

        assert_eq!(
            escrow.execute(CallContext::new(USER), TARGET, U256::zero(), Bytes::new()),
            Err(EscrowError::EscrowPaused)
        );
        assert_eq!(
            escrow.multicall(
                CallContext::new(USER),
                &[TARGET],
                &[U256::zero()],
                &[Bytes::new()],
            ),
            Err(EscrowError::EscrowPaused)
        );
        assert_eq!(
            escrow.execute_with_signatures(OUTSIDER, &request),
            Err(EscrowError::EscrowPaused)
        );
        assert_eq!(
            escrow.deposit_eth(CallContext::new(USER).with_value(1u64)),
            Err(EscrowError::EscrowPaused)
        );

        assert_eq!(escrow.withdraw_eth(USER, USER), Ok(ether(3)));
        assert_eq!(
            escrow.withdraw_token(USER, TOKEN, USER),
            Ok(U256::from(500u64))
        );
        assert_eq!(platform.chain.native_balance(USER), ether(3));
        assert_eq!(platform.chain.token_balance(TOKEN, USER), U256::from(500u64));
        assert_eq!(escrow.nonce(), U256::zero());
    }

    #[test]
    fn test_global_pause_alone_blocks_execution_paths() {
        let platform = Platform::new();
        let approvers = signers(2);
        let escrow = platform.create(&approvers, 1);
        platform.fund(&escrow, USER, ether(1));
        platform.factory.activate_global_pause(ADMIN).unwrap();

        let request =
            signed_request(&escrow, &[&approvers[0]], TARGET, ether(1), &[], NOW + 600);
        assert_eq!(
            escrow.execute_with_signatures(OUTSIDER, &request),
            Err(EscrowError::GlobalEmergencyActive)
        );
        assert_eq!(
            escrow.add_approver(USER, OUTSIDER),
            Err(EscrowError::GlobalEmergencyActive)
        );
        assert!(escrow.operational_status().global_emergency);
        assert!(!escrow.operational_status().is_operational());

        platform.factory.deactivate_global_pause(ADMIN).unwrap();
        escrow.execute_with_signatures(OUTSIDER, &request).unwrap();
        assert_eq!(escrow.nonce(), U256::one());
    }

    #[test]
    fn test_function_pause_targets_one_entry_point() {
        let platform = Platform::new();
        let approvers = signers(2);
        let escrow = platform.create(&approvers, 1);
        platform.fund(&escrow, USER, ether(1));
        platform
            .factory
            .pause_function(ADMIN, selectors::execute_with_signatures())
            .unwrap();

        let request =
            signed_request(&escrow, &[&approvers[0]], TARGET, ether(1), &[], NOW + 600);
        assert_eq!(
            escrow.execute_with_signatures(OUTSIDER, &request),
            Err(EscrowError::FunctionPaused(selectors::execute_with_signatures()))
        );

        escrow
            .execute(CallContext::new(USER), TARGET, U256::zero(), Bytes::new())
            .unwrap();
        assert_eq!(escrow.nonce(), U256::zero());
    }
}
