//! Order lifecycle.
//!
//! ```text
//! PENDING_PAYMENT -> PENDING_CONFIRMATION -> CONFIRMED -> SOURCED -> OUT_FOR_DELIVERY -> DELIVERED
//!        |                   |                  |
//!        +-------------------+------------------+--> CANCELLED -> WAIT_FOR_REFUND -> REFUNDED
//! ```
//!
//! Every status change goes through [`transition`], which is the only place that knows the
//! legal `(from, to)` pairs.

use thiserror::Error;

use super::payment::{PaymentProvider, PaymentStatus, PaymentVerdict};

text_enum! {
    pub enum OrderStatus {
        PendingPayment => "PENDING_PAYMENT",
        PendingConfirmation => "PENDING_CONFIRMATION",
        Confirmed => "CONFIRMED",
        Sourced => "SOURCED",
        OutForDelivery => "OUT_FOR_DELIVERY",
        Delivered => "DELIVERED",
        Cancelled => "CANCELLED",
        WaitForRefund => "WAIT_FOR_REFUND",
        Refunded => "REFUNDED",
    }
}

impl OrderStatus {
    pub fn next_states(self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            PendingPayment => &[PendingConfirmation, Cancelled],
            PendingConfirmation => &[Confirmed, Cancelled],
            Confirmed => &[Sourced, Cancelled],
            Sourced => &[OutForDelivery],
            OutForDelivery => &[Delivered],
            Cancelled => &[WaitForRefund],
            WaitForRefund => &[Refunded],
            Delivered | Refunded => &[],
        }
    }

    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        self.next_states().contains(&to)
    }

    pub fn is_final(self) -> bool {
        self.next_states().is_empty()
    }

    /// Awaiting payment or admin confirmation.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            OrderStatus::PendingPayment | OrderStatus::PendingConfirmation
        )
    }

    /// Stages handled by delivery staff.
    pub fn is_delivery_stage(self) -> bool {
        matches!(self, OrderStatus::Sourced | OrderStatus::OutForDelivery)
    }
}

/// Payment fields of an order that gate its transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaymentState {
    pub provider: Option<PaymentProvider>,
    pub status: Option<PaymentStatus>,
}

impl PaymentState {
    pub fn requires_verification(&self) -> bool {
        self.provider.is_some_and(PaymentProvider::is_mobile_money)
    }

    pub fn is_verified(&self) -> bool {
        self.status == Some(PaymentStatus::Verified)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl Transition {
    /// Profit is only ever written on entry to DELIVERED.
    pub fn records_profit(&self) -> bool {
        self.to == OrderStatus::Delivered
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Order is already {0}")]
    Unchanged(OrderStatus),
    #[error("Order cannot move from {from} to {to}")]
    Illegal { from: OrderStatus, to: OrderStatus },
    #[error("Mobile money payment must be verified before the order is confirmed")]
    PaymentNotVerified,
    #[error("Order has no mobile money payment to verify")]
    NoMobileMoneyPayment,
    #[error("Payment can only be verified while the order is {}", OrderStatus::PendingPayment)]
    NotAwaitingPayment(OrderStatus),
    #[error("Payment was already marked {0}")]
    PaymentAlreadyDecided(PaymentStatus),
}

pub fn transition(
    from: OrderStatus,
    to: OrderStatus,
    payment: PaymentState,
) -> Result<Transition, TransitionError> {
    if from == to {
        return Err(TransitionError::Unchanged(from));
    }
    if !from.can_transition_to(to) {
        return Err(TransitionError::Illegal { from, to });
    }
    if from == OrderStatus::PendingPayment
        && to == OrderStatus::PendingConfirmation
        && payment.requires_verification()
        && !payment.is_verified()
    {
        return Err(TransitionError::PaymentNotVerified);
    }
    Ok(Transition { from, to })
}

/// Decides a pending mobile money payment. Returns the payment status to store.
pub fn verify_payment(
    status: OrderStatus,
    payment: PaymentState,
    verdict: PaymentVerdict,
) -> Result<PaymentStatus, TransitionError> {
    if !payment.requires_verification() {
        return Err(TransitionError::NoMobileMoneyPayment);
    }
    if status != OrderStatus::PendingPayment {
        return Err(TransitionError::NotAwaitingPayment(status));
    }
    match payment.status {
        Some(PaymentStatus::Pending) | None => Ok(verdict.into()),
        Some(decided) => Err(TransitionError::PaymentAlreadyDecided(decided)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    fn cash() -> PaymentState {
        PaymentState {
            provider: Some(PaymentProvider::Cash),
            status: None,
        }
    }

    fn mtn(status: PaymentStatus) -> PaymentState {
        PaymentState {
            provider: Some(PaymentProvider::Mtn),
            status: Some(status),
        }
    }

    #[test]
    fn happy_path_is_accepted_step_by_step() {
        let path = [
            PendingPayment,
            PendingConfirmation,
            Confirmed,
            Sourced,
            OutForDelivery,
            Delivered,
        ];
        for pair in path.windows(2) {
            let step = transition(pair[0], pair[1], cash()).unwrap();
            assert_eq!(step.records_profit(), pair[1] == Delivered);
        }
    }

    #[test]
    fn refund_branch_follows_cancellation() {
        for from in [PendingPayment, PendingConfirmation, Confirmed] {
            assert!(transition(from, Cancelled, cash()).is_ok());
        }
        assert!(transition(Cancelled, WaitForRefund, cash()).is_ok());
        assert!(transition(WaitForRefund, Refunded, cash()).is_ok());
    }

    #[test]
    fn illegal_pairs_are_rejected() {
        assert_eq!(
            transition(Delivered, PendingPayment, cash()),
            Err(TransitionError::Illegal {
                from: Delivered,
                to: PendingPayment
            })
        );
        assert!(transition(Sourced, Cancelled, cash()).is_err());
        assert!(transition(PendingPayment, Delivered, cash()).is_err());
        assert!(transition(Cancelled, Refunded, cash()).is_err());
        assert_eq!(
            transition(Confirmed, Confirmed, cash()),
            Err(TransitionError::Unchanged(Confirmed))
        );
    }

    #[test]
    fn final_states_have_no_exits() {
        assert!(Delivered.is_final());
        assert!(Refunded.is_final());
        assert!(!Cancelled.is_final());
        for to in OrderStatus::ALL {
            assert!(!Delivered.can_transition_to(*to));
        }
    }

    #[test]
    fn mobile_money_must_be_verified_before_confirmation() {
        assert_eq!(
            transition(PendingPayment, PendingConfirmation, mtn(PaymentStatus::Pending)),
            Err(TransitionError::PaymentNotVerified)
        );
        assert_eq!(
            transition(PendingPayment, PendingConfirmation, mtn(PaymentStatus::Rejected)),
            Err(TransitionError::PaymentNotVerified)
        );
        assert!(transition(PendingPayment, PendingConfirmation, mtn(PaymentStatus::Verified)).is_ok());
        // an unverified order can still be cancelled
        assert!(transition(PendingPayment, Cancelled, mtn(PaymentStatus::Pending)).is_ok());
    }

    #[test]
    fn orders_without_provider_confirm_directly() {
        assert!(transition(PendingPayment, PendingConfirmation, PaymentState::default()).is_ok());
    }

    #[test]
    fn payment_verification_rules() {
        assert_eq!(
            verify_payment(PendingPayment, mtn(PaymentStatus::Pending), PaymentVerdict::Verified),
            Ok(PaymentStatus::Verified)
        );
        assert_eq!(
            verify_payment(PendingPayment, mtn(PaymentStatus::Pending), PaymentVerdict::Rejected),
            Ok(PaymentStatus::Rejected)
        );
        assert_eq!(
            verify_payment(PendingPayment, cash(), PaymentVerdict::Verified),
            Err(TransitionError::NoMobileMoneyPayment)
        );
        assert_eq!(
            verify_payment(Confirmed, mtn(PaymentStatus::Pending), PaymentVerdict::Verified),
            Err(TransitionError::NotAwaitingPayment(Confirmed))
        );
        assert_eq!(
            verify_payment(PendingPayment, mtn(PaymentStatus::Verified), PaymentVerdict::Rejected),
            Err(TransitionError::PaymentAlreadyDecided(PaymentStatus::Verified))
        );
    }
}
