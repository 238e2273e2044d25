//! Password flow for encrypted documents

use std::path::PathBuf;

/// Default bound on passphrase attempts per open request
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// Authentication state of a viewer session
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    AwaitingPassword {
        path: PathBuf,
        attempt: u32,
        max_attempts: u32,
    },
    Authenticated,
    /// Attempts exhausted for `path`; the pending session has been torn down
    Failed { path: PathBuf, attempts: u32 },
}

/// What the caller should do after a passphrase was checked
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated,
    Retry { remaining: u32 },
    Exhausted { attempts: u32 },
}

/// Text and counters for a password prompt
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PasswordPrompt {
    pub path: PathBuf,
    /// 1-based number of the attempt being asked for
    pub attempt: u32,
    pub max_attempts: u32,
    /// Set after a rejected passphrase
    pub remaining: Option<u32>,
}

impl PasswordPrompt {
    #[must_use]
    pub fn message(&self) -> String {
        let mut msg = String::new();
        if let Some(remaining) = self.remaining {
            msg.push_str(&format!(
                "Incorrect password, {remaining} attempts remaining.\n"
            ));
        }
        msg.push_str(&format!(
            "This PDF is password protected.\nEnter password to open (Attempt {}/{})",
            self.attempt, self.max_attempts
        ));
        msg
    }
}

/// Bounded passphrase retry state machine. Holds no document handle; the
/// caller checks the passphrase and reports the result.
#[derive(Clone, Debug)]
pub struct AuthFlow {
    state: AuthState,
    max_attempts: u32,
}

impl Default for AuthFlow {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl AuthFlow {
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            state: AuthState::Unauthenticated,
            max_attempts: max_attempts.max(1),
        }
    }

    #[must_use]
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    #[must_use]
    pub fn is_awaiting(&self) -> bool {
        matches!(self.state, AuthState::AwaitingPassword { .. })
    }

    /// An encrypted document was opened
    pub fn begin(&mut self, path: PathBuf) -> PasswordPrompt {
        self.state = AuthState::AwaitingPassword {
            path,
            attempt: 0,
            max_attempts: self.max_attempts,
        };
        self.prompt(None)
    }

    /// A document is open and usable (unencrypted, or unlocked earlier)
    pub fn mark_authenticated(&mut self) {
        self.state = AuthState::Authenticated;
    }

    /// Prompt for the next attempt, `None` unless awaiting a password
    #[must_use]
    pub fn prompt(&self, remaining: Option<u32>) -> PasswordPrompt {
        match &self.state {
            AuthState::AwaitingPassword {
                path,
                attempt,
                max_attempts,
            } => PasswordPrompt {
                path: path.clone(),
                attempt: attempt + 1,
                max_attempts: *max_attempts,
                remaining,
            },
            _ => PasswordPrompt {
                path: PathBuf::new(),
                attempt: 0,
                max_attempts: self.max_attempts,
                remaining,
            },
        }
    }

    /// Feed the result of one passphrase check. Ignored unless awaiting.
    pub fn record(&mut self, accepted: bool) -> Option<AuthOutcome> {
        let AuthState::AwaitingPassword {
            path,
            attempt,
            max_attempts,
        } = &mut self.state
        else {
            return None;
        };

        if accepted {
            self.state = AuthState::Authenticated;
            return Some(AuthOutcome::Authenticated);
        }

        *attempt += 1;
        if *attempt >= *max_attempts {
            let attempts = *attempt;
            let path = std::mem::take(path);
            self.state = AuthState::Failed { path, attempts };
            Some(AuthOutcome::Exhausted { attempts })
        } else {
            Some(AuthOutcome::Retry {
                remaining: *max_attempts - *attempt,
            })
        }
    }

    /// Abandon the pending file without consuming an attempt
    pub fn cancel(&mut self) -> Option<PathBuf> {
        if let AuthState::AwaitingPassword { path, .. } = std::mem::take(&mut self.state) {
            Some(path)
        } else {
            None
        }
    }

    /// Forget everything, e.g. after the document was closed
    pub fn reset(&mut self) {
        self.state = AuthState::Unauthenticated;
    }

    /// Attempts used so far on the pending file
    #[must_use]
    pub fn attempts_used(&self) -> u32 {
        match self.state {
            AuthState::AwaitingPassword { attempt, .. } => attempt,
            AuthState::Failed { attempts, .. } => attempts,
            _ => 0,
        }
    }
}
