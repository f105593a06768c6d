//! Authenticatable principal capability.

/// Something that can authenticate against the store: it has a stable
/// identifier, a set of roles and a stored credential hash.
pub trait Principal {
    /// Identifier used to look the principal up (the email for users).
    fn identifier(&self) -> &str;

    /// Roles granted to the principal.
    fn roles(&self) -> &[&'static str];

    /// Stored credential hash in PHC string format.
    fn credential_hash(&self) -> &str;

    fn has_role(&self, role: &str) -> bool {
        self.roles().iter().any(|r| *r == role)
    }
}
