use crate::error::VerificationError;
use crate::verifier::{compare_quantities, proof_text, Verifier};
use async_trait::async_trait;
use compliance_core::{FacilityRecord, VerificationOutcome, VerificationStatus};
use documents::{estimate_area, OcrEngine};
use extraction::{extract_employee_count, extract_power_consumption, extract_water_certification};
use llm::ChatModel;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// `square_feet` against the floor area measured on a blueprint.
pub struct BlueprintAreaVerifier {
    ocr: Arc<dyn OcrEngine>,
    tolerance: f64,
}

impl BlueprintAreaVerifier {
    pub fn new(ocr: Arc<dyn OcrEngine>, tolerance: f64) -> Self {
        Self { ocr, tolerance }
    }
}

#[async_trait]
impl Verifier for BlueprintAreaVerifier {
    fn field(&self) -> &str {
        FacilityRecord::SQUARE_FEET
    }

    fn description(&self) -> &str {
        "Measures the floor area on a blueprint drawing"
    }

    async fn verify(
        &self,
        claimed: &Value,
        proof: &Path,
    ) -> Result<VerificationOutcome, VerificationError> {
        let estimate = estimate_area(proof, self.ocr.as_ref()).await?;
        info!(
            "Blueprint area {} against claimed {}",
            estimate.estimated_area, claimed
        );

        Ok(compare_quantities(
            self.field(),
            claimed,
            Some(estimate.estimated_area),
            self.tolerance,
        )
        .with_details(estimate.to_json()))
    }
}

/// `number_of_employees` against a payroll or registration report.
pub struct EmployeeCountVerifier {
    model: Arc<dyn ChatModel>,
    ocr: Arc<dyn OcrEngine>,
    tolerance: f64,
}

impl EmployeeCountVerifier {
    pub fn new(model: Arc<dyn ChatModel>, ocr: Arc<dyn OcrEngine>, tolerance: f64) -> Self {
        Self {
            model,
            ocr,
            tolerance,
        }
    }
}

#[async_trait]
impl Verifier for EmployeeCountVerifier {
    fn field(&self) -> &str {
        FacilityRecord::NUMBER_OF_EMPLOYEES
    }

    fn description(&self) -> &str {
        "Reads the total headcount from a payroll report"
    }

    async fn verify(
        &self,
        claimed: &Value,
        proof: &Path,
    ) -> Result<VerificationOutcome, VerificationError> {
        let text = proof_text(proof, self.ocr.as_ref()).await?;
        let report = extract_employee_count(self.model.as_ref(), &text).await?;
        info!(
            "Payroll employee count {:?} against claimed {}",
            report.employee_count, claimed
        );

        Ok(compare_quantities(
            self.field(),
            claimed,
            report.employee_count,
            self.tolerance,
        )
        .with_details(json!({ "employee_count": report.employee_count })))
    }
}

/// `power_consumption` against the total of an energy consumption report.
pub struct PowerConsumptionVerifier {
    model: Arc<dyn ChatModel>,
    ocr: Arc<dyn OcrEngine>,
    tolerance: f64,
}

impl PowerConsumptionVerifier {
    pub fn new(model: Arc<dyn ChatModel>, ocr: Arc<dyn OcrEngine>, tolerance: f64) -> Self {
        Self {
            model,
            ocr,
            tolerance,
        }
    }
}

#[async_trait]
impl Verifier for PowerConsumptionVerifier {
    fn field(&self) -> &str {
        FacilityRecord::POWER_CONSUMPTION
    }

    fn description(&self) -> &str {
        "Reads total consumption from an energy report"
    }

    async fn verify(
        &self,
        claimed: &Value,
        proof: &Path,
    ) -> Result<VerificationOutcome, VerificationError> {
        let text = proof_text(proof, self.ocr.as_ref()).await?;
        let report = extract_power_consumption(self.model.as_ref(), &text).await?;
        info!(
            "Reported consumption {:?} against claimed {}",
            report.total_consumption, claimed
        );

        let details = serde_json::to_value(&report).unwrap_or(Value::Null);
        Ok(compare_quantities(
            self.field(),
            claimed,
            report.total_consumption,
            self.tolerance,
        )
        .with_details(details))
    }
}

/// `water_source` against the sources named on a water certification.
pub struct WaterSourceVerifier {
    model: Arc<dyn ChatModel>,
    ocr: Arc<dyn OcrEngine>,
}

impl WaterSourceVerifier {
    pub fn new(model: Arc<dyn ChatModel>, ocr: Arc<dyn OcrEngine>) -> Self {
        Self { model, ocr }
    }
}

/// Case-insensitive containment in either direction.
fn sources_match(claimed: &str, source: &str) -> bool {
    let claimed = claimed.trim().to_lowercase();
    let source = source.trim().to_lowercase();
    !claimed.is_empty() && !source.is_empty() && (source.contains(&claimed) || claimed.contains(&source))
}

#[async_trait]
impl Verifier for WaterSourceVerifier {
    fn field(&self) -> &str {
        FacilityRecord::WATER_SOURCE
    }

    fn description(&self) -> &str {
        "Matches the water source against a supply certification"
    }

    async fn verify(
        &self,
        claimed: &Value,
        proof: &Path,
    ) -> Result<VerificationOutcome, VerificationError> {
        let text = proof_text(proof, self.ocr.as_ref()).await?;
        let certification = extract_water_certification(self.model.as_ref(), &text).await?;
        let sources = certification.sources();

        let claimed_source = claimed.as_str().filter(|s| !s.trim().is_empty());
        let status = match claimed_source {
            Some(_) if sources.is_empty() => VerificationStatus::Inconclusive,
            Some(claimed) if sources.iter().any(|source| sources_match(claimed, source)) => {
                VerificationStatus::Verified
            }
            Some(_) => VerificationStatus::Mismatch,
            None => VerificationStatus::Inconclusive,
        };
        info!("Certified water sources {:?}: {:?}", sources, status);

        let observed = json!(sources);
        let details = serde_json::to_value(&certification).unwrap_or(Value::Null);
        Ok(
            VerificationOutcome::new(self.field(), status, claimed.clone(), observed)
                .with_details(details),
        )
    }
}
