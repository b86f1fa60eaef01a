use crate::prompts::{WATER_CERTIFICATION, WATER_SYSTEM};
use crate::{decode, lenient, request_object, ExtractionError};
use llm::{ChatModel, CompletionParams};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageBreakdown {
    #[serde(default, deserialize_with = "lenient::number")]
    pub manufacturing_processes: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub cooling_systems: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub sanitation: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaterQuality {
    #[serde(default, deserialize_with = "lenient::number")]
    pub ph_level: Option<f64>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub turbidity: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub contaminants: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaterCertification {
    #[serde(
        rename = "Total_monthly_water_consumption",
        default,
        deserialize_with = "lenient::number"
    )]
    pub total_monthly_water_consumption: Option<f64>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub primary_water_source: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub secondary_water_source: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub average_ph_level: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub monthly_water_cost: Option<f64>,
    #[serde(default)]
    pub usage_breakdown: UsageBreakdown,
    #[serde(default)]
    pub water_quality: WaterQuality,
    #[serde(default, deserialize_with = "lenient::string")]
    pub testing_authority: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub test_date: Option<String>,
}

impl WaterCertification {
    pub fn sources(&self) -> Vec<&str> {
        [&self.primary_water_source, &self.secondary_water_source]
            .into_iter()
            .filter_map(|source| source.as_deref())
            .collect()
    }
}

/// Reads a water supply certification and usage report.
pub async fn extract_water_certification(
    model: &dyn ChatModel,
    text: &str,
) -> Result<WaterCertification, ExtractionError> {
    let value = request_object(
        model,
        WATER_SYSTEM,
        WATER_CERTIFICATION,
        text,
        CompletionParams::DETAILED_REPORT,
    )
    .await?;
    decode(value)
}
