//! Shared utilities and strongly-typed common values for workspace crates.
//!
//! ```rust
//! use ccommon::{CancellationToken, MetadataMap, Registry};
//!
//! let mut metadata = MetadataMap::new();
//! metadata.insert("tenant".to_string(), "acme".to_string());
//!
//! let mut registry = Registry::new();
//! registry.insert("alpha", 1_u8);
//!
//! let token = CancellationToken::new();
//! assert!(!token.is_cancelled());
//! assert_eq!(registry.get("alpha"), Some(&1));
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use ccommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Shared metadata aliases.

    use std::collections::HashMap;

    pub type MetadataMap = HashMap<String, String>;
}

pub mod cancel {
    //! Cooperative cancellation shared by every suspending operation in the workspace.
    //!
    //! ```rust
    //! use ccommon::{CancellationToken, cancellable};
    //!
    //! # tokio_test_block_on(async {
    //! let token = CancellationToken::new();
    //! token.cancel();
    //!
    //! let outcome = cancellable(&token, async { 42 }).await;
    //! assert!(outcome.is_err());
    //! # });
    //! # fn tokio_test_block_on<F: std::future::Future>(future: F) -> F::Output {
    //! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(future)
    //! # }
    //! ```

    use std::error::Error;
    use std::fmt::{Display, Formatter};
    use std::future::Future;

    pub use tokio_util::sync::CancellationToken;

    /// Marker outcome for work abandoned because its token fired.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Cancelled;

    impl Display for Cancelled {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str("operation cancelled")
        }
    }

    impl Error for Cancelled {}

    /// Runs `future` until it completes or `token` is cancelled, whichever comes first.
    ///
    /// An already-cancelled token wins without polling `future`.
    pub async fn cancellable<F>(token: &CancellationToken, future: F) -> Result<F::Output, Cancelled>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(Cancelled),
            output = future => Ok(output),
        }
    }
}

pub mod registry {
    //! Generic registry map wrapper used by runtime registries.
    //!
    //! ```rust
    //! use ccommon::Registry;
    //!
    //! let mut registry = Registry::new();
    //! registry.insert("alpha".to_string(), 1_u32);
    //!
    //! assert_eq!(registry.get("alpha"), Some(&1));
    //! assert!(registry.contains_key("alpha"));
    //! ```

    use std::borrow::Borrow;
    use std::collections::HashMap;
    use std::hash::Hash;

    #[derive(Debug, Clone)]
    pub struct Registry<K, V> {
        items: HashMap<K, V>,
    }

    impl<K, V> Default for Registry<K, V>
    where
        K: Eq + Hash,
    {
        fn default() -> Self {
            Self {
                items: HashMap::new(),
            }
        }
    }

    impl<K, V> Registry<K, V>
    where
        K: Eq + Hash,
    {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, key: K, value: V) -> Option<V> {
            self.items.insert(key, value)
        }

        pub fn get<Q>(&self, key: &Q) -> Option<&V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.get(key)
        }

        pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.remove(key)
        }

        pub fn contains_key<Q>(&self, key: &Q) -> bool
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.contains_key(key)
        }

        pub fn values(&self) -> impl Iterator<Item = &V> {
            self.items.values()
        }

        pub fn len(&self) -> usize {
            self.items.len()
        }

        pub fn is_empty(&self) -> bool {
            self.items.is_empty()
        }
    }
}

pub use cancel::{CancellationToken, Cancelled, cancellable};
pub use context::MetadataMap;
pub use future::BoxFuture;
pub use registry::Registry;
