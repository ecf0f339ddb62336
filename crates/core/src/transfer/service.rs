//! Transfer engine.

use chrono::Utc;
use moneybox_shared::types::TransferId;
use rust_decimal::Decimal;

use super::error::TransferError;
use super::types::{Transfer, TransferKind, TransferRequest};
use crate::ledger::{LedgerBook, LedgerMovement, NewMovement};

/// Transfer service.
pub struct TransferService;

impl TransferService {
    /// Validates a request.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not positive or both sides are the
    /// same holder.
    pub fn validate(request: &TransferRequest) -> Result<(), TransferError> {
        if request.amount <= Decimal::ZERO {
            return Err(TransferError::NonPositiveAmount(request.amount));
        }
        if request.source == request.destination {
            return Err(TransferError::SameHolder(request.source));
        }
        Ok(())
    }

    /// Builds the transfer record and its two legs, `-amount` at the source
    /// and `+amount` at the destination.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid request.
    pub fn prepare(request: &TransferRequest) -> Result<(Transfer, [NewMovement; 2]), TransferError> {
        Self::validate(request)?;

        let kind = TransferKind::between(request.source, request.destination);
        let (out_kind, in_kind) = kind.leg_kinds();
        let transfer = Transfer {
            id: TransferId::new(),
            source: request.source,
            destination: request.destination,
            amount: request.amount,
            kind,
            date: request.date,
            description: request.description.clone(),
            created_at: Utc::now(),
        };

        let legs = [
            NewMovement {
                holder: request.source,
                amount: -request.amount,
                kind: out_kind,
                description: request.description.clone(),
                effective_date: request.date,
                instance_id: None,
                transfer_id: Some(transfer.id),
            },
            NewMovement {
                holder: request.destination,
                amount: request.amount,
                kind: in_kind,
                description: request.description.clone(),
                effective_date: request.date,
                instance_id: None,
                transfer_id: Some(transfer.id),
            },
        ];

        Ok((transfer, legs))
    }

    /// Executes a transfer against a ledger book. Both legs are appended or
    /// neither is.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid request, or the ledger
    /// error that prevented either leg from being appended.
    pub fn execute(
        book: &mut LedgerBook,
        request: &TransferRequest,
    ) -> Result<(Transfer, Vec<LedgerMovement>), TransferError> {
        let (transfer, legs) = Self::prepare(request)?;
        let movements = book.append_all(legs.into())?;
        Ok((transfer, movements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{HolderAccount, HolderRef, LedgerError, MovementKind};
    use chrono::NaiveDate;
    use moneybox_shared::types::{BankAccountId, BoxId};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn holder_account(holder: HolderRef, balance: Decimal) -> HolderAccount {
        HolderAccount {
            holder,
            name: holder.to_string(),
            baseline: balance,
            cached_balance: balance,
            is_active: true,
        }
    }

    fn request(source: HolderRef, destination: HolderRef, amount: Decimal) -> TransferRequest {
        TransferRequest {
            source,
            destination,
            amount,
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            description: "top-up".to_string(),
        }
    }

    #[test]
    fn test_contribution_moves_money_into_box() {
        let account = HolderRef::BankAccount(BankAccountId::new());
        let money_box = HolderRef::Box(BoxId::new());
        let mut book = LedgerBook::new();
        book.open(holder_account(account, dec!(1000.00))).unwrap();
        book.open(holder_account(money_box, dec!(0))).unwrap();

        let (transfer, movements) =
            TransferService::execute(&mut book, &request(account, money_box, dec!(300.00)))
                .unwrap();

        assert_eq!(transfer.kind, TransferKind::BoxContribution);
        assert_eq!(movements.len(), 2);
        assert_eq!(movements[0].amount, dec!(-300.00));
        assert_eq!(movements[1].amount, dec!(300.00));
        assert!(movements.iter().all(|m| m.kind == MovementKind::BoxContribution));
        assert!(movements.iter().all(|m| m.transfer_id == Some(transfer.id)));
        assert_eq!(book.cached_balance(account).unwrap(), dec!(700.00));
        assert_eq!(book.cached_balance(money_box).unwrap(), dec!(300.00));
    }

    #[test]
    fn test_failed_second_leg_leaves_source_untouched() {
        let account = HolderRef::BankAccount(BankAccountId::new());
        let mut closed_box = holder_account(HolderRef::Box(BoxId::new()), dec!(0));
        closed_box.is_active = false;
        let destination = closed_box.holder;
        let mut book = LedgerBook::new();
        book.open(holder_account(account, dec!(500.00))).unwrap();
        book.open(closed_box).unwrap();

        let result =
            TransferService::execute(&mut book, &request(account, destination, dec!(300.00)));

        assert_eq!(
            result.unwrap_err(),
            TransferError::Ledger(LedgerError::HolderInactive(destination))
        );
        assert_eq!(book.cached_balance(account).unwrap(), dec!(500.00));
        assert!(book.movements().is_empty());
    }

    #[test]
    fn test_validation() {
        let account = HolderRef::BankAccount(BankAccountId::new());
        let other = HolderRef::BankAccount(BankAccountId::new());

        assert_eq!(
            TransferService::validate(&request(account, other, dec!(0))),
            Err(TransferError::NonPositiveAmount(dec!(0)))
        );
        assert_eq!(
            TransferService::validate(&request(account, other, dec!(-5))),
            Err(TransferError::NonPositiveAmount(dec!(-5)))
        );
        let err = TransferService::validate(&request(account, account, dec!(5))).unwrap_err();
        assert_eq!(err, TransferError::SameHolder(account));
        assert!(err.is_validation());
        assert_eq!(err.error_code(), "SAME_HOLDER");
    }

    #[test]
    fn test_kinds_by_endpoints() {
        let a = HolderRef::BankAccount(BankAccountId::new());
        let b = HolderRef::Box(BoxId::new());
        assert_eq!(TransferKind::between(a, a), TransferKind::AccountToAccount);
        assert_eq!(TransferKind::between(b, a), TransferKind::BoxWithdrawal);
        assert_eq!(TransferKind::between(b, b), TransferKind::BoxToBox);
        assert_eq!(
            TransferKind::AccountToAccount.leg_kinds(),
            (MovementKind::TransferOut, MovementKind::TransferIn)
        );
    }

    #[test]
    fn test_effect_on() {
        let a = HolderRef::BankAccount(BankAccountId::new());
        let b = HolderRef::Box(BoxId::new());
        let (transfer, _) = TransferService::prepare(&request(a, b, dec!(40))).unwrap();
        assert_eq!(transfer.effect_on(a), dec!(-40));
        assert_eq!(transfer.effect_on(b), dec!(40));
        assert_eq!(
            transfer.effect_on(HolderRef::Box(BoxId::new())),
            Decimal::ZERO
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Every transfer yields exactly two movements summing to zero.
        #[test]
        fn prop_transfer_zero_sum(
            cents in 1i64..100_000_000i64,
            source_is_box in any::<bool>(),
            destination_is_box in any::<bool>(),
        ) {
            let make = |is_box: bool| if is_box {
                HolderRef::Box(BoxId::new())
            } else {
                HolderRef::BankAccount(BankAccountId::new())
            };
            let source = make(source_is_box);
            let destination = make(destination_is_box);
            let amount = Decimal::new(cents, 2);

            let (_, legs) = TransferService::prepare(&request(source, destination, amount)).unwrap();

            prop_assert_eq!(legs.len(), 2);
            prop_assert_eq!(legs[0].amount + legs[1].amount, Decimal::ZERO);
            prop_assert_eq!(legs[0].amount, -amount);
        }
    }
}
