//! Administrative control surface.

use std::fmt;

use gloomhold_instance::{InstanceError, TeardownReport};
use gloomhold_protocol::{Codec, InstanceId, ParticipantId};
use gloomhold_space::{AreaBackend, SpaceError, SpaceState};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{DungeonService, ServiceStatus};

/// A command from an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AdminCommand {
    /// Tear down every run, then destroy and recreate the instance space.
    ResetSpace,
    DestroyAll,
    Destroy { instance: InstanceId },
    RemoveParticipant { participant: ParticipantId },
    Status,
}

/// Why an admin command failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AdminFailure {
    NoSuchRun { instance: InstanceId },
    NotInRun { participant: ParticipantId },
    NotReady { state: SpaceState },
    /// The space could not be allocated; `detail` is the backend's message.
    Allocation { detail: String },
}

impl fmt::Display for AdminFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuchRun { instance } => write!(f, "no such run: {instance}"),
            Self::NotInRun { participant } => write!(f, "{participant} is not in any run"),
            Self::NotReady { state } => write!(f, "not ready (space {state})"),
            Self::Allocation { detail } => write!(f, "not ready: {detail}"),
        }
    }
}

/// The result of an admin command, rendered for the operator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdminOutcome {
    SpaceReset { report: TeardownReport },
    Destroyed { report: TeardownReport },
    ParticipantRemoved { participant: ParticipantId },
    Status { status: ServiceStatus },
    Failed { failure: AdminFailure },
}

impl AdminOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    fn failed(failure: AdminFailure) -> Self {
        Self::Failed { failure }
    }
}

impl fmt::Display for AdminOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpaceReset { report } => write!(
                f,
                "instance space reset ({} runs destroyed)",
                report.destroyed.len()
            ),
            Self::Destroyed { report } if report.is_clean() => {
                write!(f, "{} runs destroyed", report.destroyed.len())
            }
            Self::Destroyed { report } => write!(
                f,
                "{} runs destroyed, {} participants could not be evacuated",
                report.destroyed.len(),
                report.failures.len()
            ),
            Self::ParticipantRemoved { participant } => write!(f, "{participant} removed from their run"),
            Self::Status { status } => write!(
                f,
                "space {}, {} active runs, {}/{} slots",
                status.space, status.active_runs, status.slots_in_use, status.capacity
            ),
            Self::Failed { failure } => write!(f, "failed: {failure}"),
        }
    }
}

impl<B, C> DungeonService<B, C>
where
    B: AreaBackend + Send + 'static,
    C: Codec,
{
    /// Runs an admin command. Failures come back as
    /// [`AdminOutcome::Failed`], never as errors.
    pub async fn execute(&self, command: AdminCommand) -> AdminOutcome {
        info!(?command, "admin command");
        let outcome = match command {
            AdminCommand::Status => AdminOutcome::Status {
                status: self.status().await,
            },
            AdminCommand::ResetSpace => self.reset_space().await,
            AdminCommand::DestroyAll => {
                let mut manager = self.state.manager.lock().await;
                let report = manager.destroy_all();
                self.publish(&mut manager);
                AdminOutcome::Destroyed { report }
            }
            AdminCommand::Destroy { instance } => {
                let result = {
                    let mut manager = self.state.manager.lock().await;
                    let result = manager.destroy(instance);
                    self.publish(&mut manager);
                    result
                };
                match result {
                    Ok(report) => AdminOutcome::Destroyed { report },
                    Err(_) => AdminOutcome::failed(AdminFailure::NoSuchRun { instance }),
                }
            }
            AdminCommand::RemoveParticipant { participant } => {
                if self.leave(participant).await {
                    AdminOutcome::ParticipantRemoved { participant }
                } else {
                    AdminOutcome::failed(AdminFailure::NotInRun { participant })
                }
            }
        };
        if !outcome.is_success() {
            warn!(%outcome, "admin command failed");
        }
        outcome
    }

    async fn reset_space(&self) -> AdminOutcome {
        let result = {
            let mut manager = self.state.manager.lock().await;
            let result = manager.reset_space();
            self.publish(&mut manager);
            result
        };
        match result {
            Ok(report) => AdminOutcome::SpaceReset { report },
            Err(InstanceError::Space(SpaceError::Allocation { area, source })) => {
                AdminOutcome::failed(AdminFailure::Allocation {
                    detail: format!("failed to allocate area {area}: {source}"),
                })
            }
            Err(InstanceError::Space(SpaceError::Destroyed)) => {
                AdminOutcome::failed(AdminFailure::NotReady {
                    state: SpaceState::Destroyed,
                })
            }
            Err(e) => AdminOutcome::failed(AdminFailure::Allocation {
                detail: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_messages() {
        let no_run = AdminOutcome::failed(AdminFailure::NoSuchRun {
            instance: InstanceId(4),
        });
        assert!(!no_run.is_success());
        assert_eq!(no_run.to_string(), "failed: no such run: I-4");

        let not_ready = AdminOutcome::failed(AdminFailure::NotReady {
            state: SpaceState::Uninitialized,
        });
        assert_eq!(not_ready.to_string(), "failed: not ready (space UNINITIALIZED)");
    }

    #[test]
    fn test_command_json_shape() {
        let cmd: AdminCommand =
            serde_json::from_str(r#"{"command": "destroy", "instance": 3}"#).unwrap();
        assert_eq!(
            cmd,
            AdminCommand::Destroy {
                instance: InstanceId(3)
            }
        );
        let cmd: AdminCommand = serde_json::from_str(r#"{"command": "reset_space"}"#).unwrap();
        assert_eq!(cmd, AdminCommand::ResetSpace);
    }
}
