pub mod employees;
pub mod error;
pub mod facility;
mod lenient;
pub mod power;
pub mod prompts;
pub mod report;
pub mod water;

pub use employees::{extract_employee_count, EmployeeCountReport};
pub use error::ExtractionError;
pub use facility::analyze_text;
pub use power::{extract_power_consumption, MachineDetail, PowerConsumptionReport};
pub use report::{
    generate_compliance_report, render_application_query, render_report_prompt,
    IndustrialApplication,
};
pub use water::{extract_water_certification, UsageBreakdown, WaterCertification, WaterQuality};

use llm::{ChatMessage, ChatModel, CompletionParams};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Sends a templated extraction prompt and returns the JSON object the model produced.
pub(crate) async fn request_object(
    model: &dyn ChatModel,
    system: &str,
    template: &str,
    text: &str,
    params: CompletionParams,
) -> Result<Value, ExtractionError> {
    if text.trim().is_empty() {
        return Err(ExtractionError::NoText);
    }

    let messages = vec![
        ChatMessage::system(system),
        ChatMessage::user(prompts::render(template, text)),
    ];
    let value = model.complete_json(messages, params).await?;
    debug!("Model extraction result: {}", value);

    if !value.is_object() {
        return Err(ExtractionError::Shape(format!(
            "expected a JSON object, got {}",
            value
        )));
    }
    Ok(value)
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ExtractionError> {
    serde_json::from_value(value).map_err(|e| ExtractionError::Shape(e.to_string()))
}
