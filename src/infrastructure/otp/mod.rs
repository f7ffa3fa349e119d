//! One-time codes for GitHub's second factor.

use anyhow::Context;
use totp_rs::{Algorithm, Secret, TOTP};

const DIGITS: usize = 6;
const STEP_SECS: u64 = 30;

/// Produces the current one-time code for a shared secret
pub trait OtpProvider: Send + Sync {
    fn current_code(&self, secret: &str) -> anyhow::Result<String>;
}

/// RFC 6238 TOTP (SHA-1, 6 digits, 30s step), the scheme GitHub uses
#[derive(Debug, Clone, Copy, Default)]
pub struct TotpProvider;

impl TotpProvider {
    pub fn new() -> Self {
        Self
    }

    fn totp(secret: &str) -> anyhow::Result<TOTP> {
        let bytes = Secret::Encoded(normalize_secret(secret))
            .to_bytes()
            .map_err(|e| anyhow::anyhow!("Invalid base32 TOTP secret: {:?}", e))?;
        // GitHub secrets are 80 bits, below the 128-bit minimum enforced by TOTP::new
        Ok(TOTP::new_unchecked(Algorithm::SHA1, DIGITS, 1, STEP_SECS, bytes))
    }

    /// Code for an explicit unix time
    pub fn code_at(&self, secret: &str, unix_secs: u64) -> anyhow::Result<String> {
        Ok(Self::totp(secret)?.generate(unix_secs))
    }
}

impl OtpProvider for TotpProvider {
    fn current_code(&self, secret: &str) -> anyhow::Result<String> {
        Self::totp(secret)?
            .generate_current()
            .context("System clock is before the unix epoch")
    }
}

/// Strip whitespace and padding, upper-case for base32 decoding
fn normalize_secret(secret: &str) -> String {
    secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
