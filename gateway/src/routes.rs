//! Gateway routing table.

/// A single prefix-to-backend mapping.
#[derive(Clone, Debug)]
struct Route {
    prefix: String,
    upstream: String,
}

/// Static routing table mapping path prefixes to backend base addresses.
///
/// Built once at startup from configuration and shared read-only by every
/// in-flight request. The longest matching prefix wins, and a prefix only
/// matches whole path segments: `/orders` matches `/orders` and
/// `/orders/42`, never `/ordersx`.
#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a prefix-to-backend mapping.
    ///
    /// Trailing slashes are stripped from both sides so that path
    /// concatenation cannot produce doubled slashes.
    #[must_use]
    pub fn route(mut self, prefix: impl Into<String>, upstream: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let upstream = upstream.into();
        self.routes.push(Route {
            prefix: prefix.trim_end_matches('/').to_string(),
            upstream: upstream.trim_end_matches('/').to_string(),
        });
        self
    }

    /// Resolves a request path to a backend base address.
    ///
    /// Returns `None` if no prefix matches.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<&str> {
        self.routes
            .iter()
            .filter(|route| {
                path.strip_prefix(&route.prefix)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
            })
            .max_by_key(|route| route.prefix.len())
            .map(|route| route.upstream.as_str())
    }

    /// Whether the table has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
