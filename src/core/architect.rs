//! High-level schema authoring tasks built on the LLM layer. Each
//! operation assembles a prompt, routes it through the manager, and
//! parses the reply. When run inside a job, requests and responses are
//! mirrored onto the job record through the [`JobContext`].

use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use serde_json::Value;
use tracing::{debug, error};

use crate::core::jobs::JobContext;
use crate::core::llm::{LlmManager, parse_json_response};
use crate::core::workspace::SchemaImprovement;

/// Schema work needs the strongest available model.
pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";

const SERVICE_NAME: &str = "Gemini";

const MAX_SOURCE_CHARS: usize = 15_000;
const MAX_CONTEXT_CHARS: usize = 5_000;
const MAX_MAPPING_CHARS: usize = 10_000;

pub const SYSTEM_INSTRUCTIONS: &str = "\
# System Instructions for Katje JSON Schemes

**Role**: You are the core intelligence of the Katje JSON Schemes.
**Objective**: Assist the user in generating content and analysis while strictly adhering to the user's constraints.

**Constraints**:
1. **Tone**: Professional, helpful, and concise.
2. **Formatting**: Use Markdown for all text output. Code blocks must specify the language.
3. **Accuracy**: When analyzing errors, provide a root cause and a suggested fix.
";

const SCHEMA_VALIDATION_PROMPT: &str = "\
You are a Senior Data Architect. Validate the following JSON Schema.

1. **Validity Check**: Verify the schema is a valid JSON Schema (Draft 2020-12).
2. **Logic Analysis**: specific checks for:
   - Missing types.
   - Illogical nesting.
   - Poor naming conventions.
   - Potential optimization improvements.
3. **Report Generation**: Generate a comprehensive **Markdown** report.
   - **Header**: Validation Result (Pass/Fail/Warning).
   - **Overview**: A human-readable nested list of all nodes, their types, and constraints.
   - **Issues**: A list of invalid or problematic areas.
   - **Recommendations**: actionable steps to improve the schema.

Return ONLY the Markdown content.
";

const IMPROVEMENT_ANALYSIS_PROMPT: &str = "\
You are a Senior Data Architect. Analyze the provided JSON Schema for professional improvements.

Identify weaknesses and opportunities in:
1. **Naming**: Inconsistent casing, vague names.
2. **Documentation**: Missing 'description' or 'title' fields.
3. **Types**: Use of 'any' or missing format constraints (e.g. email, date-time).
4. **Structure**: Redundant nesting or unnecessary complexity.
5. **Validation**: Missing required fields or constraints (min/max).
6. **Extension**: Suggest missing standard fields based on the domain (e.g. if 'address' exists but lacks 'zip_code', suggest adding it; if 'user' exists, suggest 'id' or 'email' if missing).

Return a **JSON Array** of improvement objects. Each object must have:
- \"id\": A unique string ID.
- \"category\": One of \"Naming\", \"Documentation\", \"Type\", \"Structure\", \"Validation\", \"Optimization\", \"Extension\".
- \"title\": Short title of the improvement.
- \"description\": Detailed explanation of what to change and why.

Return ONLY the JSON Array. No markdown.
";

const IMPROVEMENT_APPLY_PROMPT: &str = "\
You are a Data Architect. Apply the following selected improvements to the JSON Schema.

Rules:
1. Strictly apply the requested improvements.
2. Ensure the resulting schema is a valid JSON Schema (Draft 2020-12).
3. Do not remove existing valid fields unless the improvement specifically asks for structural changes.
4. If the improvement is \"Extension\", add the suggested fields with appropriate types and descriptions.
5. Return ONLY the modified JSON Schema object. No markdown.
";

pub struct SchemaArchitect {
    llm: Arc<LlmManager>,
}

impl SchemaArchitect {
    pub fn new(llm: Arc<LlmManager>) -> Self {
        Self { llm }
    }

    async fn generate_content(
        &self,
        kind: &str,
        prompt: &str,
        system_instruction: Option<&str>,
        ctx: Option<&JobContext>,
    ) -> Result<String> {
        debug!(kind, prompt_len = prompt.len(), "dispatching generation");
        if let Some(ctx) = ctx {
            ctx.log_request(SERVICE_NAME, kind, DEFAULT_MODEL, prompt, system_instruction)
                .await;
        }
        match self
            .llm
            .generate(DEFAULT_MODEL, prompt, system_instruction)
            .await
        {
            Ok(text) => {
                if let Some(ctx) = ctx {
                    ctx.log_response(SERVICE_NAME, Some(Value::String(text.clone())), None)
                        .await;
                }
                Ok(text)
            }
            Err(e) => {
                error!(kind, error = %e, "generation failed");
                if let Some(ctx) = ctx {
                    ctx.log_response(SERVICE_NAME, None, Some(e.to_string())).await;
                }
                Err(e)
            }
        }
    }

    /// Merge new fields from a source sample into the current schema.
    /// Existing schema fields always win over same-named source fields.
    pub async fn analyze_and_extend(
        &self,
        source: &Value,
        current_schema: &Value,
        ctx: Option<&JobContext>,
    ) -> Result<Value> {
        let context_description = if source.is_array() {
            "Source JSON Data (Array of samples from file group)"
        } else {
            "Source JSON Data"
        };
        let prompt = format!(
            "You are a Data Architect.\n\
             Analyze the following SOURCE JSON data.\n\
             Update the TARGET JSON SCHEMA (Draft 2020-12) to include fields from the source data.\n\
             \n\
             Rules:\n\
             1. The output must be a valid JSON Schema object.\n\
             2. **MANDATORY**: Every property in the schema MUST have a 'type' and a 'description' field explaining its purpose.\n\
             3. **MANDATORY**: Determine a professional and descriptive 'title' for the root schema based on the context of the Source JSON (e.g. \"CustomerProfile\", \"InvoiceData\"). Set this in the root 'title' property.\n\
             4. MERGE STRATEGY:\n\
                - Keep all existing fields in the Current Target Schema. Do NOT delete anything.\n\
                - If a field in the Source JSON exists in the Schema with the same name, keep the Schema version.\n\
                - Only add NEW fields that are missing from the Schema.\n\
                - If Source Data is an array of samples, assume the schema represents a single object of that type (unless the root itself is an array). Ensure the schema covers all variations found in samples.\n\
             5. Return ONLY the JSON Schema object. No markdown.\n\
             \n\
             Current Target Schema:\n{current}\n\
             \n\
             {context_description}:\n{source}",
            current = serialize(current_schema),
            source = truncated(source, MAX_SOURCE_CHARS),
        );
        let res = self
            .generate_content("analyzeAndExtend", &prompt, None, ctx)
            .await?;
        parse_json_response(&res)
    }

    pub async fn modify_schema(
        &self,
        current_schema: &Value,
        user_prompt: &str,
        source: Option<&Value>,
        system_instruction: Option<&str>,
        ctx: Option<&JobContext>,
    ) -> Result<Value> {
        let context = match source {
            Some(source) => format!(
                "\n\nContext - Source JSON Data Sample:\n{}",
                truncated(source, MAX_CONTEXT_CHARS)
            ),
            None => String::new(),
        };
        let prompt = format!(
            "You are a Data Architect.\n\
             Modify the following JSON SCHEMA based on the user's instructions.\n\
             \n\
             User Instructions: {user_prompt}\n\
             \n\
             Rules:\n\
             1. **MANDATORY**: Every property/field in the schema MUST have a 'type' and a 'description'.\n\
             2. Ensure valid JSON Schema structure (properties, types).\n\
             3. Return ONLY the modified JSON Schema as a valid JSON object. No markdown.\n\
             \n\
             Current Schema:\n{current}{context}",
            current = serialize(current_schema),
        );
        let res = self
            .generate_content("modifySchema", &prompt, system_instruction, ctx)
            .await?;
        parse_json_response(&res)
    }

    /// Transform source data into an instance of the target schema.
    pub async fn map_json(
        &self,
        source: &Value,
        target_schema: &Value,
        ctx: Option<&JobContext>,
    ) -> Result<Value> {
        let prompt = format!(
            "Transform the SOURCE JSON data into a new JSON object that validates against the TARGET JSON SCHEMA.\n\
             \n\
             Rules:\n\
             1. Map fields from Source to Target based on semantic meaning.\n\
             2. The output must be a valid JSON instance of the Schema.\n\
             3. Return ONLY the new JSON object. No markdown.\n\
             \n\
             Target JSON Schema:\n{target}\n\
             \n\
             Source JSON:\n{source}",
            target = serialize(target_schema),
            source = truncated(source, MAX_MAPPING_CHARS),
        );
        let res = self.generate_content("mapJson", &prompt, None, ctx).await?;
        parse_json_response(&res)
    }

    /// Markdown validation report; returned verbatim.
    pub async fn validate_schema(&self, schema: &Value, ctx: Option<&JobContext>) -> Result<String> {
        let prompt = format!(
            "{SCHEMA_VALIDATION_PROMPT}\n\nSchema to Validate:\n{}",
            serialize_pretty(schema)
        );
        self.generate_content("validateSchema", &prompt, None, ctx)
            .await
    }

    pub async fn improvements(
        &self,
        schema: &Value,
        ctx: Option<&JobContext>,
    ) -> Result<Vec<SchemaImprovement>> {
        let prompt = format!(
            "{IMPROVEMENT_ANALYSIS_PROMPT}\n\nSchema:\n{}",
            serialize_pretty(schema)
        );
        let res = self
            .generate_content("getImprovements", &prompt, None, ctx)
            .await?;
        parse_improvements(&res)
    }

    pub async fn apply_improvements(
        &self,
        schema: &Value,
        improvements: &[SchemaImprovement],
        ctx: Option<&JobContext>,
    ) -> Result<Value> {
        let improvement_list = improvements
            .iter()
            .map(|i| format!("- [{:?}] {}: {}", i.category, i.title, i.description))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "{IMPROVEMENT_APPLY_PROMPT}\n\nImprovements to Apply:\n{improvement_list}\n\nCurrent Schema:\n{}",
            serialize_pretty(schema)
        );
        let res = self
            .generate_content("applyImprovements", &prompt, None, ctx)
            .await?;
        parse_json_response(&res)
    }

    pub async fn synthetic_data(
        &self,
        schema: &Value,
        instruction: &str,
        ctx: Option<&JobContext>,
    ) -> Result<Value> {
        let prompt = format!(
            "You are a Data Generator.\n\
             Generate a COMPLETE, LOGICAL, and REALISTIC JSON file that strictly follows the provided JSON Schema.\n\
             \n\
             Instructions: {instruction}\n\
             \n\
             Rules:\n\
             1. Fill ALL defined fields in the schema.\n\
             2. Use realistic data (names, dates, addresses, etc.).\n\
             3. If arrays are defined, populate them with at least 3-5 items.\n\
             4. Ensure the data looks \"proper\" and professional.\n\
             5. Return ONLY the JSON object. No markdown.\n\
             \n\
             JSON Schema:\n{schema}",
            schema = serialize(schema),
        );
        let res = self
            .generate_content("generateSyntheticData", &prompt, None, ctx)
            .await?;
        parse_json_response(&res)
    }
}

/// Accept a bare array or an `{"improvements": [...]}` wrapper.
fn parse_improvements(raw: &str) -> Result<Vec<SchemaImprovement>> {
    let json = parse_json_response(raw)?;
    let list = match json {
        Value::Array(_) => json,
        Value::Object(mut map) => match map.remove("improvements") {
            Some(inner @ Value::Array(_)) => inner,
            _ => bail!("Invalid improvement response format"),
        },
        _ => bail!("Invalid improvement response format"),
    };
    serde_json::from_value(list).map_err(|e| anyhow!("Invalid improvement response format: {e}"))
}

fn serialize(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn serialize_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

fn truncated(value: &Value, max: usize) -> String {
    let serialized = serialize(value);
    if serialized.chars().count() > max {
        let cut: String = serialized.chars().take(max).collect();
        format!("{cut} ... (truncated)")
    } else {
        serialized
    }
}
