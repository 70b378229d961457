use crate::Result;

/// Source of per-user access tokens for a hosting provider.
pub trait CredentialLookup {
    /// Return the access token `user_id` granted for `provider`.
    ///
    /// `Ok(None)` means the user never connected that provider, which is an expected
    /// state. `Err` is reserved for failures of the token store itself.
    fn lookup(&self, provider: &str, user_id: i64) -> Result<Option<String>>;
}
