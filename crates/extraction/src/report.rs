use crate::prompts::REPORT_SYSTEM;
use crate::ExtractionError;
use compliance_core::FacilityRecord;
use llm::{ChatMessage, ChatModel, CompletionParams};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

const NOT_AVAILABLE: &str = "N/A";

/// Attributes rendered into the report, in prompt order.
const REPORT_FIELDS: [(&str, &str); 8] = [
    ("industry_name", "Industry Name"),
    ("square_feet", "Square Footage"),
    ("water_source", "Water Source"),
    ("drainage", "Drainage System"),
    ("air_pollution", "Air Pollution"),
    ("waste_management", "Waste Management"),
    ("nearby_homes", "Nearby Homes"),
    ("water_level_depth", "Water Level Depth"),
];

const QUERY_FIELDS: [(&str, &str); 8] = [
    ("industry_name", "Industry Name"),
    ("square_feet", "Square Feet"),
    ("water_source", "Water Source"),
    ("drainage", "Drainage"),
    ("air_pollution", "Air Pollution"),
    ("waste_management", "Waste Management"),
    ("nearby_homes", "Nearby Homes"),
    ("water_level_depth", "Water Level Depth"),
];

/// Flat facility attributes submitted for a compliance report. Any subset of
/// the known keys may be present and unknown keys are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndustrialApplication {
    fields: Map<String, Value>,
}

impl IndustrialApplication {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Builds an application from an analyzed record. `name` and
    /// `waste_disposal` map onto their report equivalents.
    pub fn from_record(record: &FacilityRecord) -> Self {
        let fields = record
            .fields()
            .iter()
            .map(|(key, value)| {
                let key = match key.as_str() {
                    FacilityRecord::NAME => "industry_name",
                    FacilityRecord::WASTE_DISPOSAL => "waste_management",
                    other => other,
                };
                (key.to_string(), value.clone())
            })
            .collect();
        Self { fields }
    }

    /// Display value of a field, `N/A` when missing or null.
    pub fn field(&self, key: &str) -> String {
        match self.fields.get(key) {
            None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        }
    }

    fn additional_fields(&self) -> Vec<(&str, String)> {
        self.fields
            .keys()
            .filter(|key| !REPORT_FIELDS.iter().any(|(known, _)| known == key))
            .map(|key| (key.as_str(), self.field(key)))
            .collect()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Text embedded to retrieve the rules most relevant to an application.
pub fn render_application_query(app: &IndustrialApplication) -> String {
    let mut query = String::from("\n");
    for (key, label) in QUERY_FIELDS {
        query.push_str(&format!("{}: {}\n", label, app.field(key)));
    }
    query
}

pub fn render_report_prompt(app: &IndustrialApplication, rules: &[String]) -> Vec<ChatMessage> {
    let mut body = String::from("\nIndustrial Compliance Report:\n\n");
    for (key, label) in REPORT_FIELDS {
        let value = app.field(key);
        if key == "square_feet" {
            body.push_str(&format!("- **{}:** {} sq. ft.\n", label, value));
        } else {
            body.push_str(&format!("- **{}:** {}\n", label, value));
        }
    }

    let additional = app.additional_fields();
    if !additional.is_empty() {
        body.push_str("\n**Additional Details:**\n");
        for (key, value) in additional {
            body.push_str(&format!("- {}: {}\n", key, value));
        }
    }

    body.push_str("\n**Top Relevant Compliance Rules:**\n");
    if rules.is_empty() {
        body.push_str("No matching rules were found.\n");
    }
    for rule in rules {
        body.push_str(&format!("- {}\n", rule));
    }

    body.push_str(
        "\n**Task:**\n\
         1. Analyze whether the industrial application follows these compliance rules.\n\
         2. Identify any potential violations.\n\
         3. Highlight environmental concerns.\n\
         4. Recommend corrective actions if necessary.\n\
         5. Provide a final approval decision (Approve/Reject/Needs Review).\n\
         \n\
         **Provide a structured and concise response.**\n",
    );

    vec![ChatMessage::system(REPORT_SYSTEM), ChatMessage::user(body)]
}

/// Asks the model for a compliance report over the retrieved rules.
pub async fn generate_compliance_report(
    model: &dyn ChatModel,
    app: &IndustrialApplication,
    rules: &[String],
) -> Result<String, ExtractionError> {
    info!(
        "Generating compliance report for {} with {} rules",
        app.field("industry_name"),
        rules.len()
    );
    let messages = render_report_prompt(app, rules);
    let report = model
        .complete(messages, CompletionParams::CONVERSATION)
        .await?;
    Ok(report)
}
