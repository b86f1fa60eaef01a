use crate::prompts::{POWER_CONSUMPTION, POWER_SYSTEM};
use crate::{decode, lenient, request_object, ExtractionError};
use llm::{ChatModel, CompletionParams};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineDetail {
    #[serde(default, deserialize_with = "lenient::string")]
    pub machine_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub machine_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub power_kw: Option<f64>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub pollution_rate: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub manufacturer: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub purchase_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerConsumptionReport {
    #[serde(
        rename = "Total_consumption",
        default,
        deserialize_with = "lenient::number"
    )]
    pub total_consumption: Option<f64>,
    #[serde(default)]
    pub details_of_machine: Vec<MachineDetail>,
}

impl PowerConsumptionReport {
    /// Sum of the per-machine ratings, when any machine lists one.
    pub fn machine_power_kw(&self) -> Option<f64> {
        let ratings: Vec<f64> = self
            .details_of_machine
            .iter()
            .filter_map(|machine| machine.power_kw)
            .collect();
        (!ratings.is_empty()).then(|| ratings.iter().sum())
    }
}

/// Reads total consumption and machinery details from an energy report.
pub async fn extract_power_consumption(
    model: &dyn ChatModel,
    text: &str,
) -> Result<PowerConsumptionReport, ExtractionError> {
    let value = request_object(
        model,
        POWER_SYSTEM,
        POWER_CONSUMPTION,
        text,
        CompletionParams::DETAILED_REPORT,
    )
    .await?;
    decode(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;

    const REPLY: &str = r#"{
        "Total_consumption": "120,000",
        "details_of_machine": [
            {"machine_id": "M-01", "machine_name": "Arc Furnace", "power_kw": 450,
             "pollution_rate": "High", "manufacturer": "Siemens", "purchase_date": "2019-04-01"},
            {"machine_id": 2, "machine_name": "Conveyor", "power_kw": "15.5 kW",
             "pollution_rate": null}
        ]
    }"#;

    #[tokio::test]
    async fn should_extract_power_report() {
        let model = ScriptedModel::replying(REPLY);

        let report = extract_power_consumption(&model, "energy report").await.unwrap();

        assert_eq!(report.total_consumption, Some(120000.0));
        assert_eq!(report.details_of_machine.len(), 2);
        assert_eq!(report.details_of_machine[1].machine_id.as_deref(), Some("2"));
        assert_eq!(report.details_of_machine[1].pollution_rate, None);
        assert_eq!(report.machine_power_kw(), Some(465.5));
        assert_eq!(model.last_request().1, CompletionParams::DETAILED_REPORT);
    }

    #[tokio::test]
    async fn should_default_missing_fields() {
        let model = ScriptedModel::replying("{}");

        let report = extract_power_consumption(&model, "energy report").await.unwrap();

        assert_eq!(report, PowerConsumptionReport::default());
        assert_eq!(report.machine_power_kw(), None);
    }

    #[tokio::test]
    async fn should_reject_wrong_machine_list_type() {
        let model = ScriptedModel::replying(r#"{"details_of_machine": "none"}"#);
        let result = extract_power_consumption(&model, "energy report").await;
        assert!(matches!(result, Err(ExtractionError::Shape(_))));
    }

    #[test]
    fn should_serialize_with_prompt_key_names() {
        let report = PowerConsumptionReport {
            total_consumption: Some(6000.0),
            details_of_machine: vec![],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["Total_consumption"], 6000.0);
    }
}
