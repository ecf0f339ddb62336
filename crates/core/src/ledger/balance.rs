//! Running balance chain for the audit view of a holder's ledger.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Running balance information for a ledger movement.
///
/// - sequence: position of the movement in chronological order (1-based)
/// - previous_balance: balance before this movement
/// - current_balance: balance after this movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningBalance {
    /// Position in chronological order (monotonically increasing).
    pub sequence: i64,
    /// Balance before this movement.
    pub previous_balance: Decimal,
    /// Balance after this movement.
    pub current_balance: Decimal,
}

impl RunningBalance {
    /// Creates the running balance for the first movement on a holder.
    ///
    /// Returns `None` if the balance overflows.
    #[must_use]
    pub fn first_entry(baseline: Decimal, change: Decimal) -> Option<Self> {
        Some(Self {
            sequence: 1,
            previous_balance: baseline,
            current_balance: baseline.checked_add(change)?,
        })
    }

    /// Creates the running balance following `previous`.
    ///
    /// - current_balance[N] = previous_balance[N] + change
    /// - previous_balance[N] = current_balance[N-1]
    #[must_use]
    pub fn next_entry(previous: &Self, change: Decimal) -> Option<Self> {
        Some(Self {
            sequence: previous.sequence + 1,
            previous_balance: previous.current_balance,
            current_balance: previous.current_balance.checked_add(change)?,
        })
    }

    /// Folds a sequence of changes into a chain starting at `baseline`.
    ///
    /// Returns `None` if any step overflows.
    #[must_use]
    pub fn chain(baseline: Decimal, changes: &[Decimal]) -> Option<Vec<Self>> {
        let mut chain: Vec<Self> = Vec::with_capacity(changes.len());
        for change in changes {
            let next = match chain.last() {
                Some(previous) => Self::next_entry(previous, *change)?,
                None => Self::first_entry(baseline, *change)?,
            };
            chain.push(next);
        }
        Some(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    /// Strategy for generating balance changes (can be positive or negative)
    fn balance_change_strategy() -> impl Strategy<Value = Decimal> {
        (-100_000i64..100_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    /// Strategy for generating a sequence of balance changes
    fn balance_changes_strategy(max_len: usize) -> impl Strategy<Value = Vec<Decimal>> {
        prop::collection::vec(balance_change_strategy(), 1..=max_len)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Current balance equals previous plus change.
        #[test]
        fn prop_current_equals_previous_plus_change(
            baseline in balance_change_strategy(),
            change in balance_change_strategy(),
        ) {
            let rb = RunningBalance::first_entry(baseline, change).unwrap();
            prop_assert_eq!(rb.current_balance, rb.previous_balance + change);
            prop_assert_eq!(rb.previous_balance, baseline);
        }

        /// Previous balance equals prior current balance.
        #[test]
        fn prop_previous_equals_prior_current(
            change1 in balance_change_strategy(),
            change2 in balance_change_strategy(),
        ) {
            let rb1 = RunningBalance::first_entry(Decimal::ZERO, change1).unwrap();
            let rb2 = RunningBalance::next_entry(&rb1, change2).unwrap();
            prop_assert_eq!(rb2.previous_balance, rb1.current_balance);
        }

        /// The chain ends at baseline plus the sum of all changes.
        #[test]
        fn prop_final_balance_equals_baseline_plus_sum(
            baseline in balance_change_strategy(),
            changes in balance_changes_strategy(20),
        ) {
            let chain = RunningBalance::chain(baseline, &changes).unwrap();
            let expected: Decimal = baseline + changes.iter().copied().sum::<Decimal>();
            prop_assert_eq!(chain.last().unwrap().current_balance, expected);
        }

        /// Sequence numbers form [1, 2, ..., N].
        #[test]
        fn prop_sequence_contiguous(
            changes in balance_changes_strategy(20),
        ) {
            let chain = RunningBalance::chain(Decimal::ZERO, &changes).unwrap();
            let sequences: Vec<i64> = chain.iter().map(|rb| rb.sequence).collect();
            let expected: Vec<i64> = (1..=changes.len() as i64).collect();
            prop_assert_eq!(sequences, expected);
        }
    }

    #[test]
    fn test_running_balance_chain() {
        let chain = RunningBalance::chain(dec!(1000.00), &[dec!(500.00), dec!(-200.00)]).unwrap();

        assert_eq!(chain[0].previous_balance, dec!(1000.00));
        assert_eq!(chain[0].current_balance, dec!(1500.00));
        assert_eq!(chain[1].sequence, 2);
        assert_eq!(chain[1].previous_balance, dec!(1500.00));
        assert_eq!(chain[1].current_balance, dec!(1300.00));
    }

    #[test]
    fn test_empty_chain() {
        assert_eq!(RunningBalance::chain(dec!(10), &[]), Some(vec![]));
    }

    #[test]
    fn test_overflow_is_reported() {
        assert_eq!(RunningBalance::first_entry(Decimal::MAX, dec!(1)), None);
    }
}
