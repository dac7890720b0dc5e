//! Provider-agnostic data model and client contracts.
//!
//! A caller holds a [`Session`], supplies [`InferenceParameters`] per call, and hands a
//! [`RequestContext`] to a [`StreamingClient`] (or the session itself to a [`CompletionClient`]).
//! Wire formats for individual providers live in adapters outside this crate.
//!
//! ```rust
//! use cprovider::{Message, Role, Session, ToolCatalog, ToolDefinition};
//!
//! let tools = ToolCatalog::from_tools(vec![ToolDefinition::new(
//!     "lookup",
//!     "Look up a term",
//!     r#"{"type":"object","properties":{"q":{"type":"string"}}}"#,
//! )])
//! .expect("catalog should validate");
//!
//! let session = Session::new()
//!     .with_tools(tools)
//!     .append(Message::text(Role::User, "What is a cat?"))
//!     .expect("append should validate");
//!
//! assert_eq!(session.len(), 1);
//! assert!(session.available_tools().contains("lookup"));
//! ```

mod content;
mod context;
mod error;
mod message;
mod parameters;
mod provider;
mod registry;
mod session;
mod stream;

pub mod prelude;

pub use content::{
    ContentPart, MediaPart, Modality, ResourceKind, ResourceRef, ToolCallRequest, ToolDefinition,
    ToolResultPart,
};
pub use context::RequestContext;
pub use error::{ProviderError, ProviderErrorKind, ValidationError, ValidationErrorKind};
pub use message::{Message, Role};
pub use parameters::{InferenceParameters, InferenceParametersBuilder, ResponseFormat, ToolChoice};
pub use provider::{
    CompletionClient, ProviderClient, ProviderFuture, ProviderId, StreamingClient,
};
pub use registry::ClientRegistry;
pub use session::{MessageContextOverride, Session, ToolCatalog};
pub use stream::{BoxedPartStream, FinishReason, PartStream, StreamingPart, VecPartStream};

pub use ccommon::{BoxFuture, CancellationToken, MetadataMap};
