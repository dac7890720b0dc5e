//! Resolution of resource references that need local I/O into inline, provider-safe forms.
//!
//! ```rust
//! use cchat::{FileSystemResourceResolver, ResolverConfig};
//!
//! let resolver = FileSystemResourceResolver::new(
//!     ResolverConfig::default().with_max_inline_bytes(4 * 1024 * 1024),
//! );
//! assert_eq!(resolver.config().max_inline_bytes, 4 * 1024 * 1024);
//! ```

use std::io::ErrorKind;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ccommon::{BoxFuture, CancellationToken, cancellable};
use cprovider::{ResourceKind, ResourceRef};
use tokio::io::AsyncReadExt;

use crate::ResourceError;

pub trait ResourceResolver: Send + Sync {
    /// Returns `resource` in a form a provider can consume without touching the local machine.
    fn resolve<'a>(
        &'a self,
        resource: ResourceRef,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<ResourceRef, ResourceError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    pub max_inline_bytes: u64,
}

impl ResolverConfig {
    pub const DEFAULT_MAX_INLINE_BYTES: u64 = 20 * 1024 * 1024;

    pub fn with_max_inline_bytes(mut self, max_inline_bytes: u64) -> Self {
        self.max_inline_bytes = max_inline_bytes;
        self
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_inline_bytes: Self::DEFAULT_MAX_INLINE_BYTES,
        }
    }
}

/// Inlines `LocalPath` references as base64 and passes every other kind through unchanged.
#[derive(Debug, Clone, Default)]
pub struct FileSystemResourceResolver {
    config: ResolverConfig,
}

impl FileSystemResourceResolver {
    pub const FALLBACK_MIME_TYPE: &'static str = "application/octet-stream";

    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    async fn inline_local_file(&self, resource: ResourceRef) -> Result<ResourceRef, ResourceError> {
        let path = Path::new(&resource.value);
        let location = resource.value.as_str();

        let file = tokio::fs::File::open(path)
            .await
            .map_err(|error| io_error(&error, location))?;
        let metadata = file
            .metadata()
            .await
            .map_err(|error| io_error(&error, location))?;

        if !metadata.is_file() {
            return Err(
                ResourceError::not_found("path is not a regular file").with_location(location)
            );
        }

        self.check_size(metadata.len(), location)?;

        // Read at most one byte past the ceiling so a file growing underneath us is still caught.
        let mut bytes = Vec::with_capacity(metadata.len() as usize);
        file.take(self.config.max_inline_bytes.saturating_add(1))
            .read_to_end(&mut bytes)
            .await
            .map_err(|error| io_error(&error, location))?;
        self.check_size(bytes.len() as u64, location)?;

        let mime_type = resource.mime_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(path)
                .first_raw()
                .unwrap_or(Self::FALLBACK_MIME_TYPE)
                .to_string()
        });
        let length_bytes = resource.length_bytes.unwrap_or(bytes.len() as u64);

        Ok(ResourceRef::inline_base64(STANDARD.encode(&bytes))
            .with_mime_type(mime_type)
            .with_length_bytes(length_bytes))
    }

    fn check_size(&self, length: u64, location: &str) -> Result<(), ResourceError> {
        if length > self.config.max_inline_bytes {
            return Err(ResourceError::too_large(format!(
                "{length} bytes exceeds the inline ceiling of {} bytes",
                self.config.max_inline_bytes
            ))
            .with_location(location));
        }

        Ok(())
    }
}

impl ResourceResolver for FileSystemResourceResolver {
    fn resolve<'a>(
        &'a self,
        resource: ResourceRef,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<ResourceRef, ResourceError>> {
        Box::pin(async move {
            if cancel.is_cancelled() {
                return Err(ResourceError::cancelled());
            }

            match resource.kind {
                ResourceKind::LocalPath => {
                    cancellable(cancel, self.inline_local_file(resource)).await?
                }
                ResourceKind::RemoteUrl
                | ResourceKind::ProviderFileId
                | ResourceKind::InlineBase64 => Ok(resource),
            }
        })
    }
}

fn io_error(error: &std::io::Error, location: &str) -> ResourceError {
    let resource_error = match error.kind() {
        ErrorKind::NotFound => ResourceError::not_found(error.to_string()),
        ErrorKind::PermissionDenied => ResourceError::access_denied(error.to_string()),
        _ => ResourceError::io(error.to_string()),
    };

    resource_error.with_location(location)
}
