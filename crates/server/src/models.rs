use chrono::{DateTime, Utc};
use compliance_core::{AnalysisSession, FacilityRecord, Message, VerificationOutcome, WorkflowStep};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    pub compliance_report: String,
}

/// Client view of an analysis session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub step: WorkflowStep,
    pub step_number: u32,
    pub total_steps: u32,
    pub progress: u32,
    /// Record key awaiting a proof document at the current step.
    pub pending_field: Option<String>,
    pub source_file: Option<String>,
    pub record: Option<FacilityRecord>,
    pub verifications: Vec<VerificationOutcome>,
    pub report: Option<String>,
    pub log: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AnalysisSession> for SessionSnapshot {
    fn from(session: AnalysisSession) -> Self {
        Self {
            session_id: session.id,
            step: session.step,
            step_number: session.step.number(),
            total_steps: WorkflowStep::TOTAL_STEPS,
            progress: session.step.progress_percentage(),
            pending_field: session.pending_field().map(str::to_string),
            source_file: session.source_file,
            record: session.record,
            verifications: session.verifications,
            report: session.report,
            log: session.log,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}
