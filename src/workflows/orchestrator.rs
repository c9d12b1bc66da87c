// Upload workflow orchestration
// Runs the five platform steps strictly in order and stops at the first failure.
// Nothing created before a failure is rolled back.

use std::future::Future;
use thiserror::Error;
use tracing::{error, Instrument};

use super::state_machine::{
    OrphanedResources, StateTransitionRecord, TransitionError, UploadWorkflowMachine, UploadWorkflowState,
    WorkflowEvent, WorkflowStage,
};
use crate::clock::Clock;
use crate::http::Transport;
use crate::platform::{CreatedAssessment, NetworkId, PlatformClient, PlatformContext, PlatformError, ReportFile, UploadId};
use crate::telemetry::{create_workflow_span, generate_correlation_id, StepTimer};

/// What a successful run created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowReport {
    pub correlation_id: String,
    pub network: NetworkId,
    pub assessment: CreatedAssessment,
    pub upload: UploadId,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{stage} failed: {source}")]
    StepFailed {
        stage: WorkflowStage,
        #[source]
        source: PlatformError,
        orphaned: OrphanedResources,
    },
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl WorkflowError {
    pub fn stage(&self) -> Option<WorkflowStage> {
        match self {
            WorkflowError::StepFailed { stage, .. } => Some(*stage),
            WorkflowError::Transition(_) => None,
        }
    }

    pub fn orphaned(&self) -> Option<&OrphanedResources> {
        match self {
            WorkflowError::StepFailed { orphaned, .. } => Some(orphaned),
            WorkflowError::Transition(_) => None,
        }
    }

    pub fn platform_error(&self) -> Option<&PlatformError> {
        match self {
            WorkflowError::StepFailed { source, .. } => Some(source),
            WorkflowError::Transition(_) => None,
        }
    }
}

/// One publication of a report: resolve network, create assessment, allocate upload,
/// transmit file, start parsing.
pub struct UploadWorkflow<'a> {
    client: PlatformClient<'a>,
    clock: &'a dyn Clock,
    machine: UploadWorkflowMachine,
}

impl<'a> UploadWorkflow<'a> {
    pub fn new(transport: &'a dyn Transport, context: &'a PlatformContext, clock: &'a dyn Clock) -> Self {
        Self {
            client: PlatformClient::new(transport, context),
            clock,
            machine: UploadWorkflowMachine::new(),
        }
    }

    pub fn current_state(&self) -> &UploadWorkflowState {
        self.machine.current_state()
    }

    pub fn state_history(&self) -> &[StateTransitionRecord] {
        self.machine.state_history()
    }

    pub async fn run(&mut self, network_name: &str, report: &ReportFile) -> Result<WorkflowReport, WorkflowError> {
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span(&correlation_id, network_name, report.file_name());

        async {
            let client = &self.client;
            let machine = &mut self.machine;

            let network = run_step(machine, WorkflowStage::ResolveNetwork, client.networks().resolve(network_name)).await?;
            machine.handle_event(WorkflowEvent::NetworkResolved(network.clone()))?;

            let assessment =
                run_step(machine, WorkflowStage::CreateAssessment, client.assessments().create(self.clock)).await?;
            machine.handle_event(WorkflowEvent::AssessmentCreated(assessment.clone()))?;

            let upload = run_step(
                machine,
                WorkflowStage::AllocateUpload,
                client.uploads().allocate(self.clock, &assessment.id, &network),
            )
            .await?;
            machine.handle_event(WorkflowEvent::UploadAllocated(upload.clone()))?;

            run_step(machine, WorkflowStage::TransmitFile, client.uploads().transmit(&upload, report)).await?;
            machine.handle_event(WorkflowEvent::FileSent)?;

            run_step(machine, WorkflowStage::StartParsing, client.uploads().start_parsing(&upload)).await?;
            machine.handle_event(WorkflowEvent::ParsingStarted)?;

            Ok(WorkflowReport {
                correlation_id: correlation_id.clone(),
                network,
                assessment,
                upload,
            })
        }
        .instrument(span)
        .await
    }
}

async fn run_step<T>(
    machine: &mut UploadWorkflowMachine,
    stage: WorkflowStage,
    step: impl Future<Output = Result<T, PlatformError>>,
) -> Result<T, WorkflowError> {
    machine.ensure_ready(stage)?;

    let timer = StepTimer::new(stage.to_string());
    match step.await {
        Ok(value) => {
            timer.finish(true);
            Ok(value)
        }
        Err(source) => {
            timer.finish(false);
            error!(%stage, error = %source, "Workflow step failed");
            machine.handle_event(WorkflowEvent::StepFailed {
                stage,
                reason: source.to_string(),
            })?;
            let orphaned = machine.current_state().created_resources();
            Err(WorkflowError::StepFailed {
                stage,
                source,
                orphaned,
            })
        }
    }
}
