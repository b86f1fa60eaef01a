use crate::prompts::{EMPLOYEE_COUNT, EMPLOYEE_SYSTEM};
use crate::{decode, lenient, request_object, ExtractionError};
use llm::{ChatModel, CompletionParams};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeCountReport {
    #[serde(default, deserialize_with = "lenient::number")]
    pub employee_count: Option<f64>,
}

/// Reads the total headcount from a payroll or registration report.
pub async fn extract_employee_count(
    model: &dyn ChatModel,
    text: &str,
) -> Result<EmployeeCountReport, ExtractionError> {
    let value = request_object(
        model,
        EMPLOYEE_SYSTEM,
        EMPLOYEE_COUNT,
        text,
        CompletionParams::EMPLOYEE_COUNT,
    )
    .await?;
    decode(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;

    #[tokio::test]
    async fn should_extract_employee_count() {
        let model = ScriptedModel::replying(r#"{"employee_count": 57}"#);

        let report = extract_employee_count(&model, "Total Number of Employees: 57")
            .await
            .unwrap();

        assert_eq!(report.employee_count, Some(57.0));
        assert_eq!(model.last_request().1, CompletionParams::EMPLOYEE_COUNT);
    }

    #[tokio::test]
    async fn should_accept_string_and_null_counts() {
        let model = ScriptedModel::replying(r#"{"employee_count": "1,204"}"#);
        let report = extract_employee_count(&model, "payroll").await.unwrap();
        assert_eq!(report.employee_count, Some(1204.0));

        let model = ScriptedModel::replying(r#"{"employee_count": null}"#);
        let report = extract_employee_count(&model, "payroll").await.unwrap();
        assert_eq!(report.employee_count, None);
    }
}
