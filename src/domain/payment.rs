text_enum! {
    /// How the customer settles the order total.
    pub enum PaymentMethod {
        Deposit => "DEPOSIT",
        Cod => "COD",
        Full => "FULL",
    }
}

text_enum! {
    pub enum PaymentProvider {
        Mtn => "MTN",
        Airtel => "AIRTEL",
        Cash => "CASH",
    }
}

text_enum! {
    pub enum PaymentStatus {
        Pending => "PENDING",
        Verified => "VERIFIED",
        Rejected => "REJECTED",
    }
}

text_enum! {
    /// Outcome of an admin checking a mobile money receipt.
    pub enum PaymentVerdict {
        Verified => "VERIFIED",
        Rejected => "REJECTED",
    }
}

impl PaymentProvider {
    /// Phone-based rails whose receipts an admin has to verify by hand.
    pub fn is_mobile_money(self) -> bool {
        matches!(self, PaymentProvider::Mtn | PaymentProvider::Airtel)
    }
}

impl From<PaymentVerdict> for PaymentStatus {
    fn from(verdict: PaymentVerdict) -> Self {
        match verdict {
            PaymentVerdict::Verified => PaymentStatus::Verified,
            PaymentVerdict::Rejected => PaymentStatus::Rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_mtn_and_airtel_are_mobile_money() {
        assert!(PaymentProvider::Mtn.is_mobile_money());
        assert!(PaymentProvider::Airtel.is_mobile_money());
        assert!(!PaymentProvider::Cash.is_mobile_money());
    }
}
