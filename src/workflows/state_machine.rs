// Upload workflow state machine
// Linear: each state carries every id acquired so far, and any step failure aborts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::platform::{AssessmentId, CreatedAssessment, NetworkId, UploadId};

/// The five remote steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowStage {
    ResolveNetwork,
    CreateAssessment,
    AllocateUpload,
    TransmitFile,
    StartParsing,
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            WorkflowStage::ResolveNetwork => "resolve network",
            WorkflowStage::CreateAssessment => "create assessment",
            WorkflowStage::AllocateUpload => "allocate upload slot",
            WorkflowStage::TransmitFile => "transmit report file",
            WorkflowStage::StartParsing => "start parsing",
        };
        f.write_str(label)
    }
}

/// Resources this run created that remain on the platform after an abort
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanedResources {
    pub assessment: Option<AssessmentId>,
    pub upload: Option<UploadId>,
}

impl OrphanedResources {
    pub fn is_empty(&self) -> bool {
        self.assessment.is_none() && self.upload.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadWorkflowState {
    Start,
    NetworkResolved {
        network: NetworkId,
    },
    AssessmentCreated {
        network: NetworkId,
        assessment: CreatedAssessment,
    },
    UploadAllocated {
        network: NetworkId,
        assessment: CreatedAssessment,
        upload: UploadId,
    },
    FileSent {
        network: NetworkId,
        assessment: CreatedAssessment,
        upload: UploadId,
    },
    ParsingStarted {
        network: NetworkId,
        assessment: CreatedAssessment,
        upload: UploadId,
    },
    Aborted {
        stage: WorkflowStage,
        reason: String,
        orphaned: OrphanedResources,
    },
}

impl UploadWorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            UploadWorkflowState::Start => "START",
            UploadWorkflowState::NetworkResolved { .. } => "NETWORK_RESOLVED",
            UploadWorkflowState::AssessmentCreated { .. } => "ASSESSMENT_CREATED",
            UploadWorkflowState::UploadAllocated { .. } => "UPLOAD_ALLOCATED",
            UploadWorkflowState::FileSent { .. } => "FILE_SENT",
            UploadWorkflowState::ParsingStarted { .. } => "PARSING_STARTED",
            UploadWorkflowState::Aborted { .. } => "ABORTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadWorkflowState::ParsingStarted { .. } | UploadWorkflowState::Aborted { .. }
        )
    }

    /// Stage that runs from this state, `None` once terminal
    pub fn next_stage(&self) -> Option<WorkflowStage> {
        match self {
            UploadWorkflowState::Start => Some(WorkflowStage::ResolveNetwork),
            UploadWorkflowState::NetworkResolved { .. } => Some(WorkflowStage::CreateAssessment),
            UploadWorkflowState::AssessmentCreated { .. } => Some(WorkflowStage::AllocateUpload),
            UploadWorkflowState::UploadAllocated { .. } => Some(WorkflowStage::TransmitFile),
            UploadWorkflowState::FileSent { .. } => Some(WorkflowStage::StartParsing),
            UploadWorkflowState::ParsingStarted { .. } | UploadWorkflowState::Aborted { .. } => None,
        }
    }

    /// Platform resources created so far
    pub fn created_resources(&self) -> OrphanedResources {
        match self {
            UploadWorkflowState::Start | UploadWorkflowState::NetworkResolved { .. } => {
                OrphanedResources::default()
            }
            UploadWorkflowState::AssessmentCreated { assessment, .. } => OrphanedResources {
                assessment: Some(assessment.id.clone()),
                upload: None,
            },
            UploadWorkflowState::UploadAllocated { assessment, upload, .. }
            | UploadWorkflowState::FileSent { assessment, upload, .. }
            | UploadWorkflowState::ParsingStarted { assessment, upload, .. } => OrphanedResources {
                assessment: Some(assessment.id.clone()),
                upload: Some(upload.clone()),
            },
            UploadWorkflowState::Aborted { orphaned, .. } => orphaned.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowEvent {
    NetworkResolved(NetworkId),
    AssessmentCreated(CreatedAssessment),
    UploadAllocated(UploadId),
    FileSent,
    ParsingStarted,
    StepFailed { stage: WorkflowStage, reason: String },
}

impl WorkflowEvent {
    pub fn label(&self) -> &'static str {
        match self {
            WorkflowEvent::NetworkResolved(_) => "NetworkResolved",
            WorkflowEvent::AssessmentCreated(_) => "AssessmentCreated",
            WorkflowEvent::UploadAllocated(_) => "UploadAllocated",
            WorkflowEvent::FileSent => "FileSent",
            WorkflowEvent::ParsingStarted => "ParsingStarted",
            WorkflowEvent::StepFailed { .. } => "StepFailed",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("event {event} is not allowed in state {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },
    #[error("stage '{stage}' cannot start in state {state}")]
    StageNotReady {
        state: &'static str,
        stage: WorkflowStage,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct StateTransitionRecord {
    pub from_state: &'static str,
    pub to_state: &'static str,
    pub event: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
pub struct UploadWorkflowMachine {
    state: UploadWorkflowState,
    history: Vec<StateTransitionRecord>,
}

impl Default for UploadWorkflowMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadWorkflowMachine {
    pub fn new() -> Self {
        Self {
            state: UploadWorkflowState::Start,
            history: Vec::new(),
        }
    }

    pub fn current_state(&self) -> &UploadWorkflowState {
        &self.state
    }

    pub fn state_history(&self) -> &[StateTransitionRecord] {
        &self.history
    }

    /// Check `stage` is the one the current state leads to, before any of its work starts
    pub fn ensure_ready(&self, stage: WorkflowStage) -> Result<(), TransitionError> {
        if self.state.next_stage() == Some(stage) {
            return Ok(());
        }
        warn!(state = self.state.name(), %stage, "Refusing to start stage out of order");
        Err(TransitionError::StageNotReady {
            state: self.state.name(),
            stage,
        })
    }

    /// Apply an event. Illegal events are rejected and leave the state untouched.
    pub fn handle_event(&mut self, event: WorkflowEvent) -> Result<&UploadWorkflowState, TransitionError> {
        let next = match (&self.state, &event) {
            (UploadWorkflowState::Start, WorkflowEvent::NetworkResolved(network)) => {
                UploadWorkflowState::NetworkResolved {
                    network: network.clone(),
                }
            }
            (UploadWorkflowState::NetworkResolved { network }, WorkflowEvent::AssessmentCreated(assessment)) => {
                UploadWorkflowState::AssessmentCreated {
                    network: network.clone(),
                    assessment: assessment.clone(),
                }
            }
            (
                UploadWorkflowState::AssessmentCreated { network, assessment },
                WorkflowEvent::UploadAllocated(upload),
            ) => UploadWorkflowState::UploadAllocated {
                network: network.clone(),
                assessment: assessment.clone(),
                upload: upload.clone(),
            },
            (
                UploadWorkflowState::UploadAllocated {
                    network,
                    assessment,
                    upload,
                },
                WorkflowEvent::FileSent,
            ) => UploadWorkflowState::FileSent {
                network: network.clone(),
                assessment: assessment.clone(),
                upload: upload.clone(),
            },
            (
                UploadWorkflowState::FileSent {
                    network,
                    assessment,
                    upload,
                },
                WorkflowEvent::ParsingStarted,
            ) => UploadWorkflowState::ParsingStarted {
                network: network.clone(),
                assessment: assessment.clone(),
                upload: upload.clone(),
            },
            (state, WorkflowEvent::StepFailed { stage, reason }) if state.next_stage() == Some(*stage) => {
                UploadWorkflowState::Aborted {
                    stage: *stage,
                    reason: reason.clone(),
                    orphaned: state.created_resources(),
                }
            }
            (state, event) => {
                warn!(state = state.name(), event = event.label(), "Rejected workflow transition");
                return Err(TransitionError::InvalidTransition {
                    state: state.name(),
                    event: event.label(),
                });
            }
        };

        let record = StateTransitionRecord {
            from_state: self.state.name(),
            to_state: next.name(),
            event: event.label(),
            timestamp: Utc::now(),
        };
        info!(
            from_state = record.from_state,
            to_state = record.to_state,
            event = record.event,
            "Upload workflow state transition"
        );

        self.history.push(record);
        self.state = next;
        Ok(&self.state)
    }
}
