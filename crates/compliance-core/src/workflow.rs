use crate::record::FacilityRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    Upload,
    Analysis,
    AreaVerification,
    EmployeeVerification,
    EnergyVerification,
    WaterVerification,
    ReportGeneration,
    Complete,
}

impl WorkflowStep {
    pub const TOTAL_STEPS: u32 = 7;

    pub fn total_steps() -> u32 {
        Self::TOTAL_STEPS
    }

    pub fn number(self) -> u32 {
        match self {
            WorkflowStep::Upload => 1,
            WorkflowStep::Analysis => 2,
            WorkflowStep::AreaVerification => 3,
            WorkflowStep::EmployeeVerification => 4,
            WorkflowStep::EnergyVerification => 5,
            WorkflowStep::WaterVerification => 6,
            WorkflowStep::ReportGeneration | WorkflowStep::Complete => 7,
        }
    }

    pub fn next(self) -> Self {
        match self {
            WorkflowStep::Upload => WorkflowStep::Analysis,
            WorkflowStep::Analysis => WorkflowStep::AreaVerification,
            WorkflowStep::AreaVerification => WorkflowStep::EmployeeVerification,
            WorkflowStep::EmployeeVerification => WorkflowStep::EnergyVerification,
            WorkflowStep::EnergyVerification => WorkflowStep::WaterVerification,
            WorkflowStep::WaterVerification => WorkflowStep::ReportGeneration,
            WorkflowStep::ReportGeneration | WorkflowStep::Complete => WorkflowStep::Complete,
        }
    }

    pub fn progress_percentage(self) -> u32 {
        if self == WorkflowStep::Complete {
            return 100;
        }
        self.number() * 100 / Self::TOTAL_STEPS
    }

    /// Record field checked against a proof document at this step.
    pub fn verified_field(self) -> Option<&'static str> {
        match self {
            WorkflowStep::AreaVerification => Some(FacilityRecord::SQUARE_FEET),
            WorkflowStep::EmployeeVerification => Some(FacilityRecord::NUMBER_OF_EMPLOYEES),
            WorkflowStep::EnergyVerification => Some(FacilityRecord::POWER_CONSUMPTION),
            WorkflowStep::WaterVerification => Some(FacilityRecord::WATER_SOURCE),
            _ => None,
        }
    }

    pub fn is_verification(self) -> bool {
        self.verified_field().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Verified,
    Mismatch,
    Inconclusive,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub field: String,
    pub status: VerificationStatus,
    pub claimed: Value,
    pub observed: Value,
    pub details: Value,
}

impl VerificationOutcome {
    pub fn new(field: &str, status: VerificationStatus, claimed: Value, observed: Value) -> Self {
        Self {
            field: field.to_string(),
            status,
            claimed,
            observed,
            details: Value::Null,
        }
    }

    pub fn skipped(field: &str) -> Self {
        Self::new(field, VerificationStatus::Skipped, Value::Null, Value::Null)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    pub fn is_verified(&self) -> bool {
        self.status == VerificationStatus::Verified
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSession {
    pub id: Uuid,
    pub step: WorkflowStep,
    pub source_file: Option<String>,
    pub extracted_text: Option<String>,
    pub record: Option<FacilityRecord>,
    pub verifications: Vec<VerificationOutcome>,
    pub report: Option<String>,
    pub log: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped by `SessionStore` on every conditional update.
    #[serde(default)]
    pub revision: u64,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisSession {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            step: WorkflowStep::Upload,
            source_file: None,
            extracted_text: None,
            record: None,
            verifications: Vec::new(),
            report: None,
            log: Vec::new(),
            created_at: now,
            updated_at: now,
            revision: 0,
        }
    }

    pub fn log_debug(&mut self, message: impl Into<String>) {
        self.log.push(message.into());
        self.updated_at = Utc::now();
    }

    pub fn advance(&mut self) {
        self.step = self.step.next();
        self.updated_at = Utc::now();
    }

    /// Returns to the upload step keeping the current results, as after a failed analysis.
    pub fn reset_to_upload(&mut self) {
        self.step = WorkflowStep::Upload;
        self.updated_at = Utc::now();
    }

    pub fn record_verification(&mut self, outcome: VerificationOutcome) {
        self.verifications.retain(|existing| existing.field != outcome.field);
        self.verifications.push(outcome);
        self.updated_at = Utc::now();
    }

    /// Record key whose value is checked at the current step. The area step
    /// checks the second extracted key, `square_feet` in a well-formed record.
    pub fn pending_field(&self) -> Option<&str> {
        let field = self.step.verified_field()?;
        if self.step == WorkflowStep::AreaVerification {
            if let Some(key) = self.record.as_ref().and_then(FacilityRecord::key_to_verify) {
                return Some(key);
            }
        }
        Some(field)
    }

    /// Value of the pending field, `null` when the record lacks it.
    pub fn claimed_value(&self) -> Value {
        self.pending_field()
            .and_then(|field| self.record.as_ref()?.get(field))
            .cloned()
            .unwrap_or(Value::Null)
    }

    pub fn verification_for(&self, field: &str) -> Option<&VerificationOutcome> {
        self.verifications.iter().find(|outcome| outcome.field == field)
    }

    /// Back to step one with every derived result cleared; the debug log survives.
    pub fn restart(&mut self) {
        self.step = WorkflowStep::Upload;
        self.source_file = None;
        self.extracted_text = None;
        self.record = None;
        self.verifications.clear();
        self.report = None;
        self.log_debug("Restarting process: session state reset.");
    }
}
