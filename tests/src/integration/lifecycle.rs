//! # Platform Lifecycle Flows
//!
//! Longer flows that cross every subsystem: proxy upgrades, bot execution
//! through the manager, fee-on-transfer withdrawals and ownership handover.

#[cfg(test)]
mod tests {
    use crate::platform::*;
    use ev_03_escrow::{CallContext, ChainAccess, EscrowError};
    use ev_04_factory::{
        DeploymentMode, EscrowDirectory, FactoryConfig, FactoryError, FactoryEvent,
    };
    use ev_05_manager::{BatchItem, ManagerError};
    use shared_types::{Address, DAY, U256};

    const SECOND_USER: Address = Address::new([0x0E; 20]);
    const SECOND_POOL: Address = Address::new([0x91; 20]);
    const NEW_OWNER: Address = Address::new([0x0D; 20]);

    // =========================================================================
    // PROXY DEPLOYMENTS
    // =========================================================================

    #[test]
    fn test_proxy_escrow_keeps_state_across_upgrade() {
        let platform = Platform::with_config(FactoryConfig {
            deployment_mode: DeploymentMode::Proxy,
            ..FactoryConfig::default()
        });
        let approvers = signers(3);
        let escrow = platform.create(&approvers, 2);
        let address = escrow.address();
        platform.fund(&escrow, USER, ether(5));

        let request = signed_request(
            &escrow,
            &[&approvers[0], &approvers[2]],
            TARGET,
            ether(1),
            &[],
            NOW + 600,
        );
        escrow.execute_with_signatures(USER, &request).unwrap();

        assert_eq!(
            platform.factory.upgrade_escrow(OUTSIDER, address),
            Err(FactoryError::NotOwner(OUTSIDER))
        );
        // Initialization binds revision 1; the first upgrade binds revision 2.
        assert_eq!(platform.factory.upgrade_escrow(ADMIN, address), Ok(2));
        assert!(matches!(
            platform.factory_log.last(),
            Some(FactoryEvent::EscrowUpgraded { revision: 2, .. })
        ));

        let upgraded = platform.factory.resolve(address).unwrap();
        assert_eq!(upgraded.address(), address);
        assert_eq!(upgraded.nonce(), U256::one());
        assert_eq!(upgraded.approvers(), addresses(&approvers));
        assert_eq!(upgraded.threshold(), 2);
        assert_eq!(platform.chain.native_balance(address), ether(4));

        // The consumed nonce stays consumed after the upgrade.
        assert!(upgraded.execute_with_signatures(USER, &request).is_err());

        let next = signed_request(
            &upgraded,
            &[&approvers[1], &approvers[2]],
            TARGET,
            ether(1),
            &[],
            NOW + 600,
        );
        upgraded.execute_with_signatures(USER, &next).unwrap();
        assert_eq!(upgraded.nonce(), U256::from(2u64));
        assert_eq!(platform.chain.native_balance(TARGET), ether(2));
    }

    #[test]
    fn test_direct_escrow_is_not_upgradeable() {
        let platform = Platform::new();
        let escrow = platform.create(&signers(2), 1);

        assert_eq!(
            platform.factory.deployment_mode_of(escrow.address()),
            Some(DeploymentMode::Direct)
        );
        assert_eq!(
            platform.factory.upgrade_escrow(ADMIN, escrow.address()),
            Err(FactoryError::NotUpgradeable(escrow.address()))
        );
    }

    // =========================================================================
    // FACTORY AND REGISTRY
    // =========================================================================

    #[test]
    fn test_one_escrow_per_user_and_pool() {
        let platform = Platform::new();
        let approvers = signers(2);
        let first = platform.create(&approvers, 1);

        let duplicate =
            platform
                .factory
                .create_escrow(USER, POOL, addresses(&approvers), 1, None);
        assert_eq!(
            duplicate.map(|c| c.escrow),
            Err(FactoryError::EscrowAlreadyExists {
                user: USER,
                pool: POOL,
            })
        );

        let second = platform.create_for(USER, SECOND_POOL, &approvers, 1);
        assert_ne!(first.address(), second.address());

        let registry = platform.factory.registry();
        assert_eq!(registry.escrows_of(USER), vec![first.address(), second.address()]);
        assert_eq!(registry.escrow_for(USER, POOL), Some(first.address()));
        assert_eq!(registry.pool_of(second.address()), Some(SECOND_POOL));
        assert_eq!(platform.factory.escrow_count(), 2);
    }

    #[test]
    fn test_default_bot_joins_every_new_escrow() {
        let platform = Platform::with_config(FactoryConfig {
            default_bot: Some(BOT),
            ..FactoryConfig::default()
        });
        let approvers = signers(3);

        let escrow = platform.create(&approvers, 3);
        assert_eq!(escrow.approver_count(), 4);
        assert!(escrow.is_approver(BOT));
        assert_eq!(escrow.threshold(), 3);

        // Threshold is checked against the caller's list, before the bot is added.
        let rejected =
            platform
                .factory
                .create_escrow(SECOND_USER, POOL, addresses(&approvers), 4, None);
        assert!(matches!(
            rejected,
            Err(FactoryError::Escrow(EscrowError::ThresholdOutOfRange {
                threshold: 4,
                approvers: 3,
            }))
        ));
    }

    // =========================================================================
    // MANAGER
    // =========================================================================

    #[test]
    fn test_bot_executes_for_opted_in_users() {
        let platform = Platform::new();
        platform.factory.enable_live_mode(ADMIN).unwrap();
        let approvers = signers(3);
        let first = platform.create(&approvers, 2);
        let second = platform.create_for(SECOND_USER, SECOND_POOL, &approvers, 2);
        platform.fund(&first, USER, ether(3));
        platform.fund(&second, SECOND_USER, ether(2));

        let manager = platform.manager();
        manager.authorize_bot(ADMIN, BOT).unwrap();
        manager.grant_bot_permission(USER, USER, BOT).unwrap();

        let request = signed_request(
            &first,
            &[&approvers[0], &approvers[1]],
            TARGET,
            ether(1),
            &[],
            NOW + 600,
        );
        manager
            .execute_for_user(BOT, USER, first.address(), &request, 0)
            .unwrap();
        assert_eq!(manager.bot_nonce(USER), 1);
        assert_eq!(first.nonce(), U256::one());

        let foreign = signed_request(
            &second,
            &[&approvers[0], &approvers[1]],
            TARGET,
            ether(1),
            &[],
            NOW + 600,
        );
        assert_eq!(
            manager.execute_for_user(BOT, SECOND_USER, second.address(), &foreign, 0),
            Err(ManagerError::BotPermissionNotGranted {
                user: SECOND_USER,
                bot: BOT,
            })
        );
        assert_eq!(second.nonce(), U256::zero());

        let tvl = manager.total_value_locked(&[]).unwrap();
        assert_eq!(tvl.escrows, 2);
        assert_eq!(tvl.native, ether(4));
    }

    #[test]
    fn test_batch_reports_each_item() {
        let platform = Platform::new();
        platform.factory.enable_live_mode(ADMIN).unwrap();
        let approvers = signers(2);
        let first = platform.create(&approvers, 2);
        let second = platform.create_for(SECOND_USER, SECOND_POOL, &approvers, 2);
        platform.fund(&first, USER, ether(2));
        platform.fund(&second, SECOND_USER, ether(2));

        let manager = platform.manager();
        manager.authorize_bot(ADMIN, BOT).unwrap();
        manager.grant_bot_permission(USER, USER, BOT).unwrap();
        manager.grant_bot_permission(SECOND_USER, SECOND_USER, BOT).unwrap();

        let signed = |escrow: &ev_03_escrow::Escrow| {
            signed_request(
                escrow,
                &[&approvers[0], &approvers[1]],
                TARGET,
                ether(1),
                &[],
                NOW + 600,
            )
        };
        let items = vec![
            BatchItem {
                user: USER,
                escrow: first.address(),
                request: signed(&first),
                bot_nonce: 0,
            },
            BatchItem {
                user: SECOND_USER,
                escrow: second.address(),
                request: signed(&second),
                bot_nonce: 7,
            },
        ];

        let report = manager.batch_execute(BOT, &items).unwrap();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(
            report.results[1],
            Err(ManagerError::NonceMismatch {
                expected: 0,
                provided: 7,
            })
        );
        assert_eq!(first.nonce(), U256::one());
        assert_eq!(second.nonce(), U256::zero());
        assert_eq!(manager.bot_nonce(SECOND_USER), 0);
    }

    // =========================================================================
    // TOKENS
    // =========================================================================

    #[test]
    fn test_fee_on_transfer_withdrawal_tolerance() {
        let platform = Platform::new();
        let escrow = platform.create(&signers(2), 1);
        let amount = U256::from(10_000u64);

        platform.chain.mint_token(TOKEN, USER, amount).unwrap();
        platform
            .chain
            .approve(TOKEN, USER, escrow.address(), amount)
            .unwrap();
        assert_eq!(escrow.deposit_token(USER, TOKEN, amount), Ok(amount));

        // 6% fee: recipient would get 9400, below the 95% floor.
        platform.chain.set_token_fee(TOKEN, 600);
        assert_eq!(
            escrow.withdraw_token(USER, TOKEN, USER),
            Err(EscrowError::TransferShortfall {
                received: U256::from(9_400u64),
                minimum: U256::from(9_500u64),
            })
        );
        assert_eq!(platform.chain.token_balance(TOKEN, escrow.address()), amount);

        platform.chain.set_token_fee(TOKEN, 400);
        assert_eq!(
            escrow.withdraw_token(USER, TOKEN, USER),
            Ok(U256::from(9_600u64))
        );
        assert_eq!(
            platform.chain.token_balance(TOKEN, escrow.address()),
            U256::zero()
        );
    }

    // =========================================================================
    // OWNERSHIP
    // =========================================================================

    #[test]
    fn test_two_step_ownership_handover() {
        let platform = Platform::new();
        let approvers = signers(2);
        let escrow = platform.create(&approvers, 2);
        platform.fund(&escrow, USER, ether(2));

        let stale = signed_request(
            &escrow,
            &[&approvers[0], &approvers[1]],
            TARGET,
            ether(1),
            &[],
            NOW + 10 * DAY,
        );

        let available_at = escrow.propose_ownership_transfer(USER, NEW_OWNER).unwrap();
        assert_eq!(available_at, NOW + 2 * DAY);
        assert!(matches!(
            escrow.accept_ownership(NEW_OWNER),
            Err(EscrowError::OwnershipDelayNotElapsed { .. })
        ));
        assert_eq!(
            escrow.accept_ownership(OUTSIDER),
            Err(EscrowError::NotPendingOwner(OUTSIDER))
        );

        platform.clock.advance(2 * DAY + 1);
        escrow.accept_ownership(NEW_OWNER).unwrap();
        assert_eq!(escrow.owner(), NEW_OWNER);
        assert_eq!(escrow.pending_ownership(), None);

        assert_eq!(
            escrow.withdraw_eth(USER, USER),
            Err(EscrowError::NotOwner(USER))
        );

        // Signatures bind the owner, so ones collected before the handover no longer verify.
        assert!(escrow.execute_with_signatures(NEW_OWNER, &stale).is_err());
        assert_eq!(escrow.nonce(), U256::zero());

        assert_eq!(escrow.withdraw_eth(NEW_OWNER, NEW_OWNER), Ok(ether(2)));
        assert_eq!(platform.chain.native_balance(NEW_OWNER), ether(2));
    }

    #[test]
    fn test_owner_direct_execute_requires_exact_value() {
        let platform = Platform::new();
        let escrow = platform.create(&signers(2), 1);
        platform.chain.set_native_balance(USER, ether(1));

        assert!(matches!(
            escrow.execute(
                CallContext::new(USER).with_value(ether(1)),
                TARGET,
                U256::zero(),
                Default::default(),
            ),
            Err(EscrowError::ValueMismatch { .. })
        ));

        escrow
            .execute(
                CallContext::new(USER).with_value(ether(1)),
                TARGET,
                ether(1),
                Default::default(),
            )
            .unwrap();
        assert_eq!(platform.chain.native_balance(TARGET), ether(1));
        assert_eq!(platform.chain.native_balance(escrow.address()), U256::zero());
    }
}
