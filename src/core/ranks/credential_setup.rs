// Interactive setup of the backend credentials, as an explicit state machine.
//
// The command layer asks the prompt, waits for a reply and feeds it back
// with `supply`. Each step has its own deadline. Nothing is produced until
// all three answers are in, so a timeout mid-way leaves no partial state.

use super::ranks_errors::RanksError;
use super::ranks_models::BackendCredentials;
use std::time::{Duration, Instant};

/// How long each question waits for an answer.
pub const SETUP_STEP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupStep {
    AwaitingHost,
    AwaitingUser {
        host: String,
    },
    AwaitingPassword {
        host: String,
        username: String,
    },
    Committed(BackendCredentials),
}

#[derive(Debug, Clone)]
pub struct CredentialSetup {
    step: SetupStep,
    deadline: Instant,
    step_timeout: Duration,
}

impl CredentialSetup {
    pub fn start(now: Instant) -> Self {
        Self::with_timeout(now, SETUP_STEP_TIMEOUT)
    }

    pub fn with_timeout(now: Instant, step_timeout: Duration) -> Self {
        Self {
            step: SetupStep::AwaitingHost,
            deadline: now + step_timeout,
            step_timeout,
        }
    }

    pub fn step(&self) -> &SetupStep {
        &self.step
    }

    /// Question to show for the current step, `None` once committed.
    pub fn prompt(&self) -> Option<&'static str> {
        match self.step {
            SetupStep::AwaitingHost => Some("What is the host you wish to connect to?"),
            SetupStep::AwaitingUser { .. } => {
                Some("What is the username you want to use to connect?")
            }
            SetupStep::AwaitingPassword { .. } => Some(
                "What is the password you want to use to connect? You can use a dummy \
                 password and change it in the settings file later.",
            ),
            SetupStep::Committed(_) => None,
        }
    }

    /// Time left to answer the current step.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }

    /// Feed the answer to the current step.
    ///
    /// Consumes the setup: on `Timeout` the whole sequence is gone.
    pub fn supply(self, answer: &str, now: Instant) -> Result<Self, RanksError> {
        if now > self.deadline {
            return Err(RanksError::Timeout(self.step_timeout));
        }

        let answer = answer.trim().to_string();
        let next = match self.step {
            SetupStep::AwaitingHost => SetupStep::AwaitingUser { host: answer },
            SetupStep::AwaitingUser { host } => SetupStep::AwaitingPassword {
                host,
                username: answer,
            },
            SetupStep::AwaitingPassword { host, username } => {
                SetupStep::Committed(BackendCredentials {
                    host,
                    username,
                    password: answer,
                })
            }
            SetupStep::Committed(_) => {
                return Err(RanksError::InvalidArgument(
                    "credential setup is already complete".to_string(),
                ))
            }
        };

        Ok(Self {
            step: next,
            deadline: now + self.step_timeout,
            step_timeout: self.step_timeout,
        })
    }

    /// The collected credentials, once every step has been answered.
    pub fn into_credentials(self) -> Option<BackendCredentials> {
        match self.step {
            SetupStep::Committed(credentials) => Some(credentials),
            _ => None,
        }
    }

    /// Called when the wait for an answer ran out without a reply.
    pub fn abort(self) -> RanksError {
        RanksError::Timeout(self.step_timeout)
    }
}
