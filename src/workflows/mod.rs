// Upload workflow: the ordered state machine and the orchestrator that drives it

pub mod orchestrator;
pub mod state_machine;

pub use orchestrator::{UploadWorkflow, WorkflowError, WorkflowReport};
pub use state_machine::{
    OrphanedResources, StateTransitionRecord, TransitionError, UploadWorkflowMachine, UploadWorkflowState,
    WorkflowEvent, WorkflowStage,
};
