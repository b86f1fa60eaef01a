use crate::error::VerificationError;
use crate::verifier::Verifier;
use crate::verifiers::{
    BlueprintAreaVerifier, EmployeeCountVerifier, PowerConsumptionVerifier, WaterSourceVerifier,
};
use anyhow::Result;
use compliance_core::VerificationOutcome;
use documents::OcrEngine;
use llm::ChatModel;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

pub type BoxedVerifier = Box<dyn Verifier>;

/// Verifiers keyed by the record field they check.
pub struct VerifierRegistry {
    verifiers: HashMap<String, Arc<BoxedVerifier>>,
}

impl VerifierRegistry {
    pub fn new() -> Self {
        Self {
            verifiers: HashMap::new(),
        }
    }

    /// Registry with the blueprint, payroll, energy and water verifiers.
    pub fn standard(
        model: Arc<dyn ChatModel>,
        ocr: Arc<dyn OcrEngine>,
        tolerance: f64,
    ) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Box::new(BlueprintAreaVerifier::new(ocr.clone(), tolerance)))?;
        registry.register(Box::new(EmployeeCountVerifier::new(
            model.clone(),
            ocr.clone(),
            tolerance,
        )))?;
        registry.register(Box::new(PowerConsumptionVerifier::new(
            model.clone(),
            ocr.clone(),
            tolerance,
        )))?;
        registry.register(Box::new(WaterSourceVerifier::new(model, ocr)))?;
        Ok(registry)
    }

    pub fn register(&mut self, verifier: BoxedVerifier) -> Result<()> {
        let field = verifier.field().to_string();

        if self.verifiers.contains_key(&field) {
            anyhow::bail!("A verifier for '{}' is already registered", field);
        }

        self.verifiers.insert(field, Arc::new(verifier));
        Ok(())
    }

    pub fn get(&self, field: &str) -> Option<Arc<BoxedVerifier>> {
        self.verifiers.get(field).cloned()
    }

    /// Registered fields, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut fields: Vec<String> = self.verifiers.keys().cloned().collect();
        fields.sort();
        fields
    }

    pub fn len(&self) -> usize {
        self.verifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verifiers.is_empty()
    }

    pub async fn verify(
        &self,
        field: &str,
        claimed: &Value,
        proof: &Path,
    ) -> Result<VerificationOutcome, VerificationError> {
        let verifier = self
            .get(field)
            .ok_or_else(|| VerificationError::UnknownField(field.to_string()))?;

        verifier.verify(claimed, proof).await
    }
}

impl Default for VerifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}
