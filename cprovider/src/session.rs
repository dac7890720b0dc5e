//! Append-only conversation sessions, tool catalogs, and per-message context overrides.
//!
//! Sessions are values: every operation that "changes" one returns a new `Session` and leaves the
//! receiver untouched, so a snapshot taken before an append stays valid afterwards.
//!
//! ```rust
//! use cprovider::{ContentPart, Message, Role, Session};
//!
//! let first = Message::text(Role::User, "a very long question");
//! let v1 = Session::new().append(first.clone()).expect("append");
//! let v2 = v1
//!     .replace_message_parts(first.id(), vec![ContentPart::text("short")])
//!     .expect("override");
//!
//! assert!(v1.override_for(first.id()).is_none());
//! assert!(v2.override_for(first.id()).is_some());
//! assert_eq!(v2.messages()[0].text_content(), "a very long question");
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ccommon::MetadataMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ContentPart, Message, Role, ToolDefinition, ValidationError};

/// Request-time view transform for one message.
///
/// Exclusion wins: when `is_excluded` is set, `alternate_parts` is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageContextOverride {
    pub is_excluded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_parts: Option<Vec<ContentPart>>,
}

impl MessageContextOverride {
    pub fn exclude() -> Self {
        Self {
            is_excluded: true,
            alternate_parts: None,
        }
    }

    pub fn replace(parts: Vec<ContentPart>) -> Self {
        Self {
            is_excluded: false,
            alternate_parts: Some(parts),
        }
    }

    /// The message as it should appear in a request, or `None` when it is excluded.
    pub fn apply(&self, message: &Message) -> Option<Message> {
        if self.is_excluded {
            return None;
        }

        match &self.alternate_parts {
            Some(parts) => Some(message.with_parts(parts.clone())),
            None => Some(message.clone()),
        }
    }
}

/// Ordered tool definitions with unique function names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<ToolDefinition>", into = "Vec<ToolDefinition>")]
pub struct ToolCatalog {
    tools: Vec<ToolDefinition>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tools(
        tools: impl IntoIterator<Item = ToolDefinition>,
    ) -> Result<Self, ValidationError> {
        let mut catalog = Self::new();
        for tool in tools {
            catalog.insert(tool)?;
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, tool: ToolDefinition) -> Result<(), ValidationError> {
        tool.validate()?;
        if self.contains(&tool.function_name) {
            return Err(ValidationError::duplicate_tool_name(&tool.function_name));
        }

        self.tools.push(tool);
        Ok(())
    }

    pub fn with_tool(mut self, tool: ToolDefinition) -> Result<Self, ValidationError> {
        self.insert(tool)?;
        Ok(self)
    }

    pub fn get(&self, function_name: &str) -> Option<&ToolDefinition> {
        self.tools
            .iter()
            .find(|tool| tool.function_name == function_name)
    }

    pub fn contains(&self, function_name: &str) -> bool {
        self.get(function_name).is_some()
    }

    pub fn as_slice(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl TryFrom<Vec<ToolDefinition>> for ToolCatalog {
    type Error = ValidationError;

    fn try_from(value: Vec<ToolDefinition>) -> Result<Self, Self::Error> {
        Self::from_tools(value)
    }
}

impl From<ToolCatalog> for Vec<ToolDefinition> {
    fn from(value: ToolCatalog) -> Self {
        value.tools
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSession")]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    messages: Arc<[Message]>,
    available_tools: ToolCatalog,
    metadata: MetadataMap,
    context_overrides: HashMap<Uuid, MessageContextOverride>,
}

/// Wire shape of a [`Session`]; replayed through the validating operations on the way in.
#[derive(Deserialize)]
struct RawSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    messages: Vec<Message>,
    available_tools: ToolCatalog,
    metadata: MetadataMap,
    context_overrides: HashMap<Uuid, MessageContextOverride>,
}

impl TryFrom<RawSession> for Session {
    type Error = ValidationError;

    fn try_from(raw: RawSession) -> Result<Self, Self::Error> {
        let mut session = Self::with_id(raw.id).append_all(raw.messages)?;
        session.created_at = raw.created_at;
        session.available_tools = raw.available_tools;
        session.metadata = raw.metadata;

        for (message_id, context_override) in raw.context_overrides {
            session = session.with_override(message_id, context_override)?;
        }

        Ok(session)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            messages: Arc::from(Vec::new()),
            available_tools: ToolCatalog::new(),
            metadata: MetadataMap::new(),
            context_overrides: HashMap::new(),
        }
    }

    pub fn with_tools(mut self, tools: ToolCatalog) -> Self {
        self.available_tools = tools;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn available_tools(&self) -> &ToolCatalog {
        &self.available_tools
    }

    pub fn metadata(&self) -> &MetadataMap {
        &self.metadata
    }

    pub fn context_overrides(&self) -> &HashMap<Uuid, MessageContextOverride> {
        &self.context_overrides
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn message(&self, message_id: Uuid) -> Option<&Message> {
        self.messages
            .iter()
            .find(|message| message.id() == message_id)
    }

    pub fn override_for(&self, message_id: Uuid) -> Option<&MessageContextOverride> {
        self.context_overrides.get(&message_id)
    }

    pub fn first_system_message(&self) -> Option<&Message> {
        self.messages
            .iter()
            .find(|message| message.role() == Role::System)
    }

    /// A new session with `message` appended to the log.
    pub fn append(&self, message: Message) -> Result<Self, ValidationError> {
        self.append_all(std::iter::once(message))
    }

    pub fn append_all(
        &self,
        messages: impl IntoIterator<Item = Message>,
    ) -> Result<Self, ValidationError> {
        let mut seen = self
            .messages
            .iter()
            .map(Message::id)
            .collect::<HashSet<_>>();
        let mut log = self.messages.to_vec();

        for message in messages {
            message.validate()?;
            if !seen.insert(message.id()) {
                return Err(ValidationError::duplicate_message_id(message.id()));
            }
            log.push(message);
        }

        Ok(Self {
            messages: log.into(),
            ..self.clone()
        })
    }

    pub fn with_override(
        &self,
        message_id: Uuid,
        context_override: MessageContextOverride,
    ) -> Result<Self, ValidationError> {
        let Some(message) = self.message(message_id) else {
            return Err(ValidationError::unknown_message(message_id));
        };
        if let Some(parts) = &context_override.alternate_parts {
            message.with_parts(parts.clone()).validate()?;
        }

        let mut next = self.clone();
        next.context_overrides.insert(message_id, context_override);
        Ok(next)
    }

    pub fn exclude_message(&self, message_id: Uuid) -> Result<Self, ValidationError> {
        self.with_override(message_id, MessageContextOverride::exclude())
    }

    pub fn replace_message_parts(
        &self,
        message_id: Uuid,
        parts: Vec<ContentPart>,
    ) -> Result<Self, ValidationError> {
        self.with_override(message_id, MessageContextOverride::replace(parts))
    }

    pub fn without_override(&self, message_id: Uuid) -> Self {
        let mut next = self.clone();
        next.context_overrides.remove(&message_id);
        next
    }
}
