//! Per-call inference parameters. Never stored on a session.
//!
//! ```rust
//! use cprovider::{InferenceParameters, ToolChoice, ValidationErrorKind};
//!
//! let parameters = InferenceParameters::builder()
//!     .model_id("gpt-4o-mini")
//!     .temperature(0.2)
//!     .max_tokens(256)
//!     .tool_choice(ToolChoice::function("lookup").expect("named tool"))
//!     .build()
//!     .expect("parameters should validate");
//! assert_eq!(parameters.max_tokens, Some(256));
//!
//! let error = InferenceParameters::builder().top_p(1.5).build().unwrap_err();
//! assert_eq!(error.kind, ValidationErrorKind::InvalidParameter);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolChoice {
    Auto,
    None,
    Required,
    Function { name: String },
}

impl ToolChoice {
    pub fn function(name: impl Into<String>) -> Result<Self, ValidationError> {
        let choice = Self::Function { name: name.into() };
        choice.validate()?;
        Ok(choice)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Function { name } if name.trim().is_empty() => Err(
                ValidationError::invalid_tool_choice("forced tool choice requires a function name"),
            ),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    Text,
    JsonObject,
    JsonSchema {
        name: String,
        schema_json: String,
        strict: bool,
    },
}

impl ResponseFormat {
    pub fn json_schema(
        name: impl Into<String>,
        schema_json: impl Into<String>,
        strict: bool,
    ) -> Result<Self, ValidationError> {
        let format = Self::JsonSchema {
            name: name.into(),
            schema_json: schema_json.into(),
            strict,
        };
        format.validate()?;
        Ok(format)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let Self::JsonSchema {
            name, schema_json, ..
        } = self
        else {
            return Ok(());
        };

        if name.trim().is_empty() {
            return Err(ValidationError::invalid_response_format(
                "json schema response format requires a name",
            ));
        }

        match serde_json::from_str::<Value>(schema_json) {
            Ok(schema) if schema.is_object() => Ok(()),
            Ok(_) => Err(ValidationError::invalid_response_format(
                "json schema must be a JSON object",
            )),
            Err(error) => Err(ValidationError::invalid_response_format(format!(
                "json schema is not valid JSON: {error}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InferenceParameters {
    pub model_id: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub stop_sequences: Vec<String>,
    pub response_format: Option<ResponseFormat>,
    pub tool_choice: Option<ToolChoice>,
    pub system_prompt_override: Option<String>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
    pub seed: Option<u64>,
    /// Token id to bias.
    pub logit_bias: BTreeMap<u32, f32>,
    pub completion_count: Option<u32>,
    pub log_probabilities: bool,
    pub top_log_probabilities: Option<u8>,
}

impl InferenceParameters {
    pub const MAX_TOP_LOG_PROBABILITIES: u8 = 20;

    pub fn builder() -> InferenceParametersBuilder {
        InferenceParametersBuilder::default()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("temperature", self.temperature, 0.0, 2.0)?;
        check_range("top_p", self.top_p, 0.0, 1.0)?;
        check_range("frequency_penalty", self.frequency_penalty, -2.0, 2.0)?;
        check_range("presence_penalty", self.presence_penalty, -2.0, 2.0)?;

        if self.max_tokens == Some(0) {
            return Err(ValidationError::invalid_parameter(
                "max_tokens must be greater than zero",
            ));
        }

        if self.completion_count == Some(0) {
            return Err(ValidationError::invalid_parameter(
                "completion_count must be greater than zero",
            ));
        }

        if let Some(model_id) = &self.model_id
            && model_id.trim().is_empty()
        {
            return Err(ValidationError::invalid_parameter(
                "model_id must not be blank when set",
            ));
        }

        if self.stop_sequences.iter().any(String::is_empty) {
            return Err(ValidationError::invalid_parameter(
                "stop sequences must not be empty",
            ));
        }

        for (token, bias) in &self.logit_bias {
            if !(-100.0..=100.0).contains(bias) {
                return Err(ValidationError::invalid_parameter(format!(
                    "logit bias for token {token} must be in the inclusive range -100.0..=100.0"
                )));
            }
        }

        if let Some(top) = self.top_log_probabilities {
            if !self.log_probabilities {
                return Err(ValidationError::invalid_parameter(
                    "top_log_probabilities requires log_probabilities",
                ));
            }

            if top > Self::MAX_TOP_LOG_PROBABILITIES {
                return Err(ValidationError::invalid_parameter(format!(
                    "top_log_probabilities must be at most {}",
                    Self::MAX_TOP_LOG_PROBABILITIES
                )));
            }
        }

        if let Some(choice) = &self.tool_choice {
            choice.validate()?;
        }

        if let Some(format) = &self.response_format {
            format.validate()?;
        }

        Ok(())
    }
}

fn check_range(name: &str, value: Option<f32>, min: f32, max: f32) -> Result<(), ValidationError> {
    match value {
        Some(value) if !(min..=max).contains(&value) => Err(ValidationError::invalid_parameter(
            format!("{name} must be in the inclusive range {min:.1}..={max:.1}"),
        )),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InferenceParametersBuilder {
    parameters: InferenceParameters,
}

impl InferenceParametersBuilder {
    pub fn model_id(mut self, model_id: impl Into<String>) -> Self {
        self.parameters.model_id = Some(model_id.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.parameters.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.parameters.max_tokens = Some(max_tokens);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.parameters.top_p = Some(top_p);
        self
    }

    pub fn stop_sequence(mut self, stop: impl Into<String>) -> Self {
        self.parameters.stop_sequences.push(stop.into());
        self
    }

    pub fn response_format(mut self, format: ResponseFormat) -> Self {
        self.parameters.response_format = Some(format);
        self
    }

    pub fn tool_choice(mut self, choice: ToolChoice) -> Self {
        self.parameters.tool_choice = Some(choice);
        self
    }

    pub fn system_prompt_override(mut self, prompt: impl Into<String>) -> Self {
        self.parameters.system_prompt_override = Some(prompt.into());
        self
    }

    pub fn frequency_penalty(mut self, penalty: f32) -> Self {
        self.parameters.frequency_penalty = Some(penalty);
        self
    }

    pub fn presence_penalty(mut self, penalty: f32) -> Self {
        self.parameters.presence_penalty = Some(penalty);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.parameters.seed = Some(seed);
        self
    }

    pub fn logit_bias(mut self, token: u32, bias: f32) -> Self {
        self.parameters.logit_bias.insert(token, bias);
        self
    }

    pub fn completion_count(mut self, count: u32) -> Self {
        self.parameters.completion_count = Some(count);
        self
    }

    pub fn log_probabilities(mut self, top: Option<u8>) -> Self {
        self.parameters.log_probabilities = true;
        self.parameters.top_log_probabilities = top;
        self
    }

    pub fn build(self) -> Result<InferenceParameters, ValidationError> {
        self.parameters.validate()?;
        Ok(self.parameters)
    }
}
