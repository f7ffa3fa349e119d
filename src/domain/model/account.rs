use std::fmt;

/// Separator between accounts in the account list string
const ACCOUNT_SEPARATOR: &str = "&";

/// Separator between fields of a single account
const FIELD_SEPARATOR: &str = "----";

/// Account entity - a ClawCloud identity signed in through GitHub
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub username: String,
    pub password: String,
    pub totp_secret: Option<String>,
}

impl Account {
    pub fn new(username: String, password: String, totp_secret: Option<String>) -> Self {
        Self {
            username,
            password,
            totp_secret,
        }
    }

    /// Parse an account list in the form `user----pass[----totp]&user----pass...`.
    /// Entries with fewer than two fields are dropped.
    pub fn parse_list(input: &str) -> Vec<Account> {
        input
            .split(ACCOUNT_SEPARATOR)
            .enumerate()
            .filter_map(|(position, entry)| {
                let account = Self::parse_entry(entry);
                if account.is_none() && !entry.trim().is_empty() {
                    tracing::debug!(position, "Dropping malformed account entry");
                }
                account
            })
            .collect()
    }

    fn parse_entry(entry: &str) -> Option<Account> {
        let mut fields = entry.split(FIELD_SEPARATOR);
        let username = fields.next()?.trim();
        // Passwords may legitimately start or end with spaces
        let password = fields.next()?;
        let totp_secret = fields
            .next()
            .map(str::trim)
            .filter(|secret| !secret.is_empty())
            .map(str::to_string);

        Some(Self::new(username.to_string(), password.to_string(), totp_secret))
    }

    pub fn has_second_factor(&self) -> bool {
        self.totp_secret.is_some()
    }
}

// Secrets never reach the logs
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("totp_secret", &self.totp_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
