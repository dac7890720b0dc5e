//! Message content parts, resource references, and tool definitions.
//!
//! ```rust
//! use cprovider::{ContentPart, Modality, ResourceRef};
//!
//! let image = ContentPart::media(Modality::Image, ResourceRef::local_path("cat.png"))
//!     .expect("image is a media modality");
//! assert_eq!(image.modality(), Modality::Image);
//!
//! let bad = ContentPart::media(Modality::Json, ResourceRef::remote_url("https://x.test/a"));
//! assert!(bad.is_err());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Text,
    Image,
    Audio,
    Video,
    Document,
    Json,
    ToolCall,
    ToolResult,
}

impl Modality {
    pub fn is_media(self) -> bool {
        matches!(
            self,
            Self::Image | Self::Audio | Self::Video | Self::Document
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    RemoteUrl,
    LocalPath,
    ProviderFileId,
    InlineBase64,
}

/// Indirection to external content.
///
/// How `value` is read depends on `kind`: a URL, a filesystem path, an opaque provider file id, or a
/// base64 payload. `mime_type` and `length_bytes` are advisory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_bytes: Option<u64>,
}

impl ResourceRef {
    pub fn new(kind: ResourceKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            mime_type: None,
            length_bytes: None,
        }
    }

    pub fn remote_url(url: impl Into<String>) -> Self {
        Self::new(ResourceKind::RemoteUrl, url)
    }

    pub fn local_path(path: impl Into<String>) -> Self {
        Self::new(ResourceKind::LocalPath, path)
    }

    pub fn provider_file(file_id: impl Into<String>) -> Self {
        Self::new(ResourceKind::ProviderFileId, file_id)
    }

    pub fn inline_base64(payload: impl Into<String>) -> Self {
        Self::new(ResourceKind::InlineBase64, payload)
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_length_bytes(mut self, length_bytes: u64) -> Self {
        self.length_bytes = Some(length_bytes);
        self
    }

    pub fn requires_local_io(&self) -> bool {
        self.kind == ResourceKind::LocalPath
    }
}

/// A media attachment whose modality is guaranteed to be a media modality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMediaPart")]
pub struct MediaPart {
    modality: Modality,
    resource: ResourceRef,
}

impl MediaPart {
    pub fn new(modality: Modality, resource: ResourceRef) -> Result<Self, ValidationError> {
        if !modality.is_media() {
            return Err(ValidationError::modality_mismatch(format!(
                "{modality:?} cannot be carried by a media part"
            )));
        }

        Ok(Self { modality, resource })
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    /// Same modality, different resource. Used when a reference is resolved into another form.
    pub fn with_resource(&self, resource: ResourceRef) -> Self {
        Self {
            modality: self.modality,
            resource,
        }
    }
}

#[derive(Deserialize)]
struct RawMediaPart {
    modality: Modality,
    resource: ResourceRef,
}

impl TryFrom<RawMediaPart> for MediaPart {
    type Error = ValidationError;

    fn try_from(value: RawMediaPart) -> Result<Self, Self::Error> {
        MediaPart::new(value.modality, value.resource)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub function_name: String,
    pub arguments_json: String,
}

impl ToolCallRequest {
    pub fn new(
        id: impl Into<String>,
        function_name: impl Into<String>,
        arguments_json: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            function_name: function_name.into(),
            arguments_json: arguments_json.into(),
        }
    }

    /// Parses the accumulated arguments. Nothing upstream guarantees they are valid JSON.
    pub fn parse_arguments(&self) -> Result<Value, ValidationError> {
        serde_json::from_str(&self.arguments_json).map_err(|error| {
            ValidationError::invalid_json(format!(
                "arguments for tool call '{}' are not valid JSON: {error}",
                self.id
            ))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResultPart {
    pub tool_call_id: String,
    pub content: String,
}

impl ToolResultPart {
    pub fn new(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ContentPart {
    Text(String),
    Media(MediaPart),
    Json(String),
    ToolCall(Vec<ToolCallRequest>),
    ToolResult(ToolResultPart),
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn media(modality: Modality, resource: ResourceRef) -> Result<Self, ValidationError> {
        MediaPart::new(modality, resource).map(Self::Media)
    }

    pub fn json(payload: impl Into<String>) -> Result<Self, ValidationError> {
        let payload = payload.into();
        serde_json::from_str::<Value>(&payload).map_err(|error| {
            ValidationError::invalid_json(format!("json part is not valid JSON: {error}"))
        })?;
        Ok(Self::Json(payload))
    }

    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self::ToolCall(calls)
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ToolResult(ToolResultPart::new(tool_call_id, content))
    }

    pub fn modality(&self) -> Modality {
        match self {
            Self::Text(_) => Modality::Text,
            Self::Media(media) => media.modality(),
            Self::Json(_) => Modality::Json,
            Self::ToolCall(_) => Modality::ToolCall,
            Self::ToolResult(_) => Modality::ToolResult,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub function_name: String,
    pub description: String,
    pub parameters_schema_json: String,
}

impl ToolDefinition {
    pub fn new(
        function_name: impl Into<String>,
        description: impl Into<String>,
        parameters_schema_json: impl Into<String>,
    ) -> Self {
        Self {
            function_name: function_name.into(),
            description: description.into(),
            parameters_schema_json: parameters_schema_json.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.function_name.trim().is_empty() {
            return Err(ValidationError::invalid_tool_definition(
                "function_name must not be empty",
            ));
        }

        let schema = serde_json::from_str::<Value>(&self.parameters_schema_json).map_err(|error| {
            ValidationError::invalid_tool_definition(format!(
                "parameters schema for '{}' is not valid JSON: {error}",
                self.function_name
            ))
        })?;

        if !schema.is_object() {
            return Err(ValidationError::invalid_tool_definition(format!(
                "parameters schema for '{}' must be a JSON object",
                self.function_name
            )));
        }

        Ok(())
    }
}
