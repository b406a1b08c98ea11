//! # Approver Set Properties
//!
//! Random add/remove/update-threshold sequences against a live escrow,
//! checked step by step against a plain `Vec` model.
//!
//! After every operation:
//! - `1 <= threshold <= approvers.len()`
//! - an address is in the sequence exactly when its membership flag is set
//! - a rejected operation changed nothing

#[cfg(test)]
mod tests {
    use crate::platform::*;
    use ev_03_escrow::{Escrow, EscrowError, MAX_APPROVERS};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use shared_types::Address;

    const STEPS: usize = 400;
    const SEEDS: [u64; 4] = [7, 42, 1_337, 0xE5C0];

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Model {
        approvers: Vec<Address>,
        threshold: usize,
    }

    impl Model {
        fn of(escrow: &Escrow) -> Self {
            Self {
                approvers: escrow.approvers(),
                threshold: escrow.threshold(),
            }
        }

        fn add(&mut self, approver: Address) -> bool {
            if approver.is_zero()
                || self.approvers.contains(&approver)
                || self.approvers.len() >= MAX_APPROVERS
            {
                return false;
            }
            self.approvers.push(approver);
            true
        }

        fn remove(&mut self, approver: Address) -> bool {
            if !self.approvers.contains(&approver) || self.approvers.len() - 1 < self.threshold {
                return false;
            }
            self.approvers.retain(|a| *a != approver);
            true
        }

        fn set_threshold(&mut self, threshold: usize) -> bool {
            if threshold == 0 || threshold > self.approvers.len() {
                return false;
            }
            self.threshold = threshold;
            true
        }
    }

    /// Mostly small addresses so adds and removes collide often.
    fn pick(rng: &mut StdRng) -> Address {
        if rng.gen_ratio(1, 20) {
            Address::ZERO
        } else {
            Address::from_low_u64(rng.gen_range(1..=14))
        }
    }

    fn assert_invariants(escrow: &Escrow, step: usize) {
        let approvers = escrow.approvers();
        let threshold = escrow.threshold();
        assert!(
            threshold >= 1 && threshold <= approvers.len(),
            "step {step}: threshold {threshold} for {} approvers",
            approvers.len()
        );
        assert!(escrow.approvers_consistent(), "step {step}: set out of sync");
        assert_eq!(escrow.approver_count(), approvers.len());
        for candidate in (0..=15).map(Address::from_low_u64) {
            assert_eq!(
                escrow.is_approver(candidate),
                approvers.contains(&candidate),
                "step {step}: membership of {candidate:?}"
            );
        }
    }

    fn run_sweep(seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let platform = Platform::new();
        let initial = vec![
            Address::from_low_u64(1),
            Address::from_low_u64(2),
            Address::from_low_u64(3),
        ];
        let created = platform
            .factory
            .create_escrow(USER, POOL, initial, 2, None)
            .unwrap();
        let escrow = {
            use ev_04_factory::EscrowDirectory;
            platform.factory.resolve(created.escrow).unwrap()
        };
        let mut model = Model::of(&escrow);

        for step in 0..STEPS {
            let before = Model::of(&escrow);
            let (expected, outcome) = match rng.gen_range(0..3) {
                0 => {
                    let approver = pick(&mut rng);
                    (model.add(approver), escrow.add_approver(USER, approver))
                }
                1 => {
                    let approver = if rng.gen_bool(0.8) && !model.approvers.is_empty() {
                        model.approvers[rng.gen_range(0..model.approvers.len())]
                    } else {
                        pick(&mut rng)
                    };
                    (model.remove(approver), escrow.remove_approver(USER, approver))
                }
                _ => {
                    let threshold = rng.gen_range(0..=MAX_APPROVERS + 1);
                    (
                        model.set_threshold(threshold),
                        escrow.update_threshold(USER, threshold),
                    )
                }
            };

            assert_eq!(
                outcome.is_ok(),
                expected,
                "seed {seed} step {step}: escrow said {outcome:?}"
            );
            if outcome.is_err() {
                assert_eq!(Model::of(&escrow), before, "seed {seed} step {step}: partial write");
            }
            assert_eq!(Model::of(&escrow), model, "seed {seed} step {step}: model diverged");
            assert_invariants(&escrow, step);
        }
    }

    #[test]
    fn test_random_membership_sequences_keep_invariants() {
        for seed in SEEDS {
            run_sweep(seed);
        }
    }

    #[test]
    fn test_non_owner_mutations_never_apply() {
        let mut rng = StdRng::seed_from_u64(99);
        let platform = Platform::new();
        let escrow = platform.create(&signers(3), 2);
        let before = Model::of(&escrow);

        for _ in 0..50 {
            let result = match rng.gen_range(0..3) {
                0 => escrow.add_approver(OUTSIDER, pick(&mut rng)),
                1 => escrow.remove_approver(OUTSIDER, before.approvers[0]),
                _ => escrow.update_threshold(OUTSIDER, 1),
            };
            assert_eq!(result, Err(EscrowError::NotOwner(OUTSIDER)));
        }
        assert_eq!(Model::of(&escrow), before);
    }

    #[test]
    fn test_removed_address_leaves_no_trace() {
        let platform = Platform::new();
        let approvers = signers(4);
        let escrow = platform.create(&approvers, 2);
        let gone = approvers[1].address();

        escrow.remove_approver(USER, gone).unwrap();
        assert!(!escrow.approvers().contains(&gone));
        assert!(!escrow.is_approver(gone));

        // Re-adding appends at the end.
        escrow.add_approver(USER, gone).unwrap();
        assert_eq!(escrow.approvers().last(), Some(&gone));
        assert!(escrow.approvers_consistent());
    }
}
