text_enum! {
    /// Role carried on a user's profile.
    pub enum Role {
        Customer => "customer",
        Admin => "admin",
        Delivery => "delivery",
    }
}
