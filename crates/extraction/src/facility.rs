use crate::prompts::{FACILITY_FIELDS, FACILITY_SYSTEM};
use crate::{request_object, ExtractionError};
use compliance_core::FacilityRecord;
use llm::{ChatModel, CompletionParams};
use tracing::info;

/// Extracts the application's facility fields from document text.
pub async fn analyze_text(
    model: &dyn ChatModel,
    text: &str,
) -> Result<FacilityRecord, ExtractionError> {
    let value = request_object(
        model,
        FACILITY_SYSTEM,
        FACILITY_FIELDS,
        text,
        CompletionParams::FIELD_EXTRACTION,
    )
    .await?;

    let record =
        FacilityRecord::from_json(value).map_err(|e| ExtractionError::Shape(e.to_string()))?;
    info!("Extracted facility fields: {:?}", record.keys());
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;
    use llm::LlmError;

    #[tokio::test]
    async fn should_extract_facility_record() {
        let model = ScriptedModel::replying(
            r#"{"name": "Acme Steel", "square_feet": 1200, "number_of_employees": 57,
                "power_consumption": {"total": "6,000"}, "water_source": "Borewell",
                "waste_disposal": null}"#,
        );

        let record = analyze_text(&model, "Application for Acme Steel ...").await.unwrap();

        assert_eq!(record.name(), Some("Acme Steel"));
        assert_eq!(record.key_to_verify(), Some("square_feet"));
        assert!(record.get("waste_disposal").is_none());

        let (messages, params) = model.last_request();
        assert_eq!(params, CompletionParams::FIELD_EXTRACTION);
        assert_eq!(messages[0].content, FACILITY_SYSTEM);
        assert!(messages[1].content.contains("Application for Acme Steel ..."));
    }

    #[tokio::test]
    async fn should_reject_empty_text_without_calling_model() {
        let model = ScriptedModel::replying("{}");

        let result = analyze_text(&model, "  \n ").await;

        assert!(matches!(result, Err(ExtractionError::NoText)));
        assert!(model.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_reject_non_object_json() {
        let model = ScriptedModel::replying("[1, 2, 3]");
        let result = analyze_text(&model, "text").await;
        assert!(matches!(result, Err(ExtractionError::Shape(_))));
    }

    #[tokio::test]
    async fn should_surface_invalid_json() {
        let model = ScriptedModel::replying("Sure! Here is the data you asked for.");
        let result = analyze_text(&model, "text").await;

        let error = result.unwrap_err();
        assert!(matches!(error, ExtractionError::Llm(LlmError::InvalidJson(_))));
        assert!(error.to_error_json()["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid JSON response"));
    }

    #[tokio::test]
    async fn should_surface_connection_failures() {
        let model = ScriptedModel::failing(|| LlmError::Connection("refused".to_string()));
        let result = analyze_text(&model, "text").await;
        assert!(matches!(result, Err(ExtractionError::Llm(LlmError::Connection(_)))));
    }
}
