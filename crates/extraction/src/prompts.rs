//! Instruction templates sent to the language model. `{text}` marks where the
//! document text is inserted.

pub const FACILITY_SYSTEM: &str = "Extract structured data from this text and return valid JSON";

pub const FACILITY_FIELDS: &str = r#"Extract structured data from the following document and return it in valid JSON format.
The JSON should only include these specific fields:

- name: Name of the facility/building
- square_feet: Total square footage of the facility
- number_of_employees: Number of employees working in the facility
- power_consumption: Power consumption details
- water_source: Source of water supply
- waste_disposal: Waste management and disposal methods

TEXT:
{text}

Return **only** the extracted information as a well-formatted JSON object with the above fields.
If a field's information is not found in the text, use null as the value.
Do not include any additional text or markdown code blocks in the response.
"#;

pub const EMPLOYEE_SYSTEM: &str = "Extract the total number of employees from the document.";

pub const EMPLOYEE_COUNT: &str = r#"Please analyze the following company payroll and registration report. The report may contain an explicit field such as "Total Number of Employees" or require deducing the total employee count from the context (for example, by interpreting payroll summaries or employee listings).

Extract and return the total number of employees in the following JSON format:
{
    "employee_count": <number or null>
}

TEXT:
{text}
"#;

pub const POWER_SYSTEM: &str = "Extract the power consumption report from the document.";

pub const POWER_CONSUMPTION: &str = r#"Please analyze the following energy consumption and machinery report. The report may contain explicit fields or require deducing the following details:

- Total Energy Consumption (e.g., "120,000 kWh (Monthly)") - extract the numeric value and return it as Total_consumption.
- Machinery details: For each machine, extract the following:
    - machine_id
    - machine_name
    - power_kw (in kW)
    - pollution_rate (e.g., Low, Moderate, High)
    - manufacturer
    - purchase_date

Return the extracted information as a well-formatted JSON object with the following structure:
{
    "Total_consumption": <number or null>,
    "details_of_machine": [
        {
            "machine_id": <string or null>,
            "machine_name": <string or null>,
            "power_kw": <number or null>,
            "pollution_rate": <string or null>,
            "manufacturer": <string or null>,
            "purchase_date": <string or null>
        },
        ...
    ]
}

Do not include any additional text or markdown code blocks in the response.

TEXT:
{text}
"#;

pub const WATER_SYSTEM: &str = "Extract the water supply certification details from the document.";

pub const WATER_CERTIFICATION: &str = r#"Please analyze the following water supply certification and usage report. The report may contain explicit fields or require deducing the following details:

- Total Monthly Water Consumption (e.g., "1,50,000 Liters") - extract the numeric value and return it as Total_monthly_water_consumption.
- Primary Water Source (e.g., "Dedicated Borewell (70%)") - extract as primary_water_source.
- Secondary Water Source (e.g., "Municipal Water Supply (30%)") - extract as secondary_water_source.
- Average pH Level (e.g., "7.2") - extract as average_ph_level.
- Monthly Water Cost (e.g., "INR 75,000") - extract the numeric value as monthly_water_cost.
- Usage Breakdown - extract percentages for:
    - Manufacturing Processes (e.g., 80) as manufacturing_processes.
    - Cooling Systems (e.g., 15) as cooling_systems.
    - Sanitation (e.g., 5) as sanitation.
- Water Quality details - extract:
    - pH Level (e.g., "7.2") as ph_level.
    - Turbidity (e.g., "Low") as turbidity.
    - Contaminants (e.g., "Within permissible limits") as contaminants.
- Testing Authority (e.g., "National Water Quality Board") as testing_authority.
- Test Date (e.g., "Conducted on March 5, 2025") as test_date.

Return the extracted information as a well-formatted JSON object with the following structure:
{
    "Total_monthly_water_consumption": <number or null>,
    "primary_water_source": <string or null>,
    "secondary_water_source": <string or null>,
    "average_ph_level": <number or null>,
    "monthly_water_cost": <number or null>,
    "usage_breakdown": {
        "manufacturing_processes": <number or null>,
        "cooling_systems": <number or null>,
        "sanitation": <number or null>
    },
    "water_quality": {
        "ph_level": <number or null>,
        "turbidity": <string or null>,
        "contaminants": <string or null>
    },
    "testing_authority": <string or null>,
    "test_date": <string or null>
}

Do not include any additional text or markdown code blocks in the response.

TEXT:
{text}
"#;

pub const REPORT_SYSTEM: &str =
    "You are an AI expert in industrial compliance. Analyze the given industrial application.";

pub fn render(template: &str, text: &str) -> String {
    template.replace("{text}", text)
}
