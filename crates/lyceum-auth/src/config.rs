//! Authentication configuration.

/// Configuration for token issuance and the account lifecycle.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Process-wide signing secret. Purpose-specific keys are derived
    /// from it, so auth and activation tokens never cross over.
    pub secret_key: String,
    /// Auth (login) token lifetime in seconds (default: 3600 = 1 hour).
    pub auth_token_ttl_secs: i64,
    /// Activation/reset/invitation token lifetime in seconds
    /// (default: 604_800 = 7 days).
    pub email_token_ttl_secs: i64,
    /// Optional pepper prepended to passwords before Argon2id hashing.
    pub pepper: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            auth_token_ttl_secs: 3_600,
            email_token_ttl_secs: 604_800,
            pepper: None,
        }
    }
}
