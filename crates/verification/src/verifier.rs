use crate::error::VerificationError;
use crate::tolerance::{parse_quantity, within_tolerance};
use async_trait::async_trait;
use compliance_core::{VerificationOutcome, VerificationStatus};
use documents::{extract_text, OcrEngine};
use serde_json::{json, Value};
use std::path::Path;

/// Checks one claimed facility field against an uploaded proof document.
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Record field this verifier checks.
    fn field(&self) -> &str;
    fn description(&self) -> &str;

    async fn verify(
        &self,
        claimed: &Value,
        proof: &Path,
    ) -> Result<VerificationOutcome, VerificationError>;
}

/// Compares a claimed quantity with the value read from the proof.
/// Either side missing makes the outcome inconclusive.
pub(crate) fn compare_quantities(
    field: &str,
    claimed: &Value,
    observed: Option<f64>,
    tolerance: f64,
) -> VerificationOutcome {
    let observed_json = observed.map(|v| json!(v)).unwrap_or(Value::Null);

    let status = match (parse_quantity(claimed), observed) {
        (Some(claimed), Some(observed)) if within_tolerance(claimed, observed, tolerance) => {
            VerificationStatus::Verified
        }
        (Some(_), Some(_)) => VerificationStatus::Mismatch,
        _ => VerificationStatus::Inconclusive,
    };

    VerificationOutcome::new(field, status, claimed.clone(), observed_json)
}

/// Proof text through the shared extraction path; empty text is an error.
pub(crate) async fn proof_text(
    proof: &Path,
    ocr: &dyn OcrEngine,
) -> Result<String, VerificationError> {
    let text = extract_text(proof, ocr).await?;
    if text.is_empty() {
        return Err(VerificationError::NoText);
    }
    Ok(text)
}
