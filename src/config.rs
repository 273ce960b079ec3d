//! Client configuration.

/// Row limit used when a list query asks for every record (negative page size).
pub const DEFAULT_UNBOUNDED_PAGE_LIMIT: i64 = 1000;

/// Options applied by [`crate::client::Client`] to every operation.
///
/// ```rust
/// use dqlgraph::ClientConfig;
///
/// let cfg = ClientConfig::default();
/// assert!(cfg.commit_now);
/// assert_eq!(cfg.unbounded_page_limit, 1000);
///
/// let deferred = ClientConfig::default().with_commit_now(false);
/// assert!(!deferred.commit_now);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Commit each mutation request immediately instead of leaving the
    /// transaction open for the caller to commit.
    ///
    /// **Default:** `true`
    pub commit_now: bool,

    /// `first:` value for list queries with a negative page size.
    ///
    /// **Default:** `1000`
    pub unbounded_page_limit: i64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            commit_now: true,
            unbounded_page_limit: DEFAULT_UNBOUNDED_PAGE_LIMIT,
        }
    }
}

impl ClientConfig {
    pub fn with_commit_now(mut self, commit_now: bool) -> Self {
        self.commit_now = commit_now;
        self
    }

    pub fn with_unbounded_page_limit(mut self, limit: i64) -> Self {
        self.unbounded_page_limit = limit;
        self
    }
}
