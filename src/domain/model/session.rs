use std::fmt;

/// Stages of one login attempt against ClawCloud
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStage {
    Open,
    Landing,
    OAuthTrigger,
    CredentialEntry,
    SecondFactor,
    AuthorizePrompt,
    PostAuthNavigation,
    Authenticated,
}

impl fmt::Display for LoginStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Landing => "landing",
            Self::OAuthTrigger => "oauth_trigger",
            Self::CredentialEntry => "credential_entry",
            Self::SecondFactor => "second_factor",
            Self::AuthorizePrompt => "authorize_prompt",
            Self::PostAuthNavigation => "post_auth_navigation",
            Self::Authenticated => "authenticated",
        };
        f.write_str(name)
    }
}

/// Status tag embedded in screenshot file names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    Success,
    Timeout,
    Error,
}

impl CaptureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Timeout => "timeout",
            Self::Error => "error",
        }
    }
}
