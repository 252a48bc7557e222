//! Routing table
//!
//! The gateway's dispatch is keyed by exact path prefix against a fixed
//! [`RouteTable`] built before startup. Insertion order is preserved and
//! significant - the table is an explicit ordered list, never a map whose
//! iteration order could differ between runs.

use std::sync::Arc;

use thiserror::Error;

use grpcmux_core::BackendTarget;

use crate::transcode::MethodRegistrar;

/// What a matched prefix delegates to.
pub enum RouteBinding {
    /// A gRPC backend plus the registrars that mount its transcoded
    /// method handlers.
    Backend {
        target: BackendTarget,
        registrars: Vec<Arc<dyn MethodRegistrar>>,
    },
    /// A plain HTTP handler tree served in-process.
    Static(axum::Router),
}

/// One prefix-keyed entry of the routing table.
pub struct RouteEntry {
    pub prefix: String,
    pub binding: RouteBinding,
}

impl RouteEntry {
    /// Entry proxying to a gRPC backend.
    pub fn backend(
        prefix: impl Into<String>,
        target: BackendTarget,
        registrars: Vec<Arc<dyn MethodRegistrar>>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            binding: RouteBinding::Backend { target, registrars },
        }
    }

    /// Entry serving a static handler tree.
    pub fn static_handler(prefix: impl Into<String>, router: axum::Router) -> Self {
        Self {
            prefix: prefix.into(),
            binding: RouteBinding::Static(router),
        }
    }

    /// Whether this entry proxies to a backend.
    pub fn is_backend(&self) -> bool {
        matches!(self.binding, RouteBinding::Backend { .. })
    }
}

impl std::fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let binding = match &self.binding {
            RouteBinding::Backend { target, registrars } => {
                format!("backend {} ({} registrars)", target.address(), registrars.len())
            }
            RouteBinding::Static(_) => "static".to_string(),
        };
        f.debug_struct("RouteEntry")
            .field("prefix", &self.prefix)
            .field("binding", &binding)
            .finish()
    }
}

/// Route table validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("duplicate route prefix '{0}'")]
    DuplicatePrefix(String),

    #[error("route prefix '{0}' must start with '/'")]
    RelativePrefix(String),

    #[error("route prefix '{0}' must not end with '/'")]
    TrailingSlash(String),

    #[error("catch-all prefix '/' must be the only entry in the table")]
    CatchAllNotSole,
}

/// Insertion-ordered, validated set of route entries.
#[derive(Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, builder-style. Validation happens in
    /// [`validate`](Self::validate), not here, so table construction
    /// stays infallible and errors surface once, at startup.
    pub fn with_entry(mut self, entry: RouteEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn push(&mut self, entry: RouteEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<RouteEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check every prefix invariant.
    ///
    /// Prefixes must be absolute, must not carry a trailing slash, and
    /// must be unique. The `"/"` catch-all is allowed only as the sole
    /// entry - the data structure cannot enforce where it would match, so
    /// the rule is enforced here instead.
    pub fn validate(&self) -> Result<(), RouteError> {
        let mut seen = std::collections::HashSet::new();
        for entry in &self.entries {
            let prefix = entry.prefix.as_str();
            if !prefix.starts_with('/') {
                return Err(RouteError::RelativePrefix(prefix.to_string()));
            }
            if prefix == "/" {
                if self.entries.len() > 1 {
                    return Err(RouteError::CatchAllNotSole);
                }
            } else if prefix.ends_with('/') {
                return Err(RouteError::TrailingSlash(prefix.to_string()));
            }
            if !seen.insert(prefix) {
                return Err(RouteError::DuplicatePrefix(prefix.to_string()));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}
