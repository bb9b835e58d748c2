//! Resolver and interceptor configuration.

/// Configuration for an [`crate::AttributeResolver`].
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Whether only public operations can be transactional.
    ///
    /// When set, restricted operations resolve to "not transactional"
    /// without consulting the metadata provider.
    pub public_operations_only: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            public_operations_only: false,
        }
    }
}

impl ResolverConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether only public operations can be transactional.
    #[must_use]
    pub const fn public_operations_only(mut self, value: bool) -> Self {
        self.public_operations_only = value;
        self
    }
}

/// Configuration for a [`crate::TransactionInterceptor`].
#[derive(Debug, Clone)]
pub struct InterceptorConfig {
    /// Whether to log the application error when a manager failure supersedes it.
    pub log_superseded_errors: bool,
}

impl Default for InterceptorConfig {
    fn default() -> Self {
        Self {
            log_superseded_errors: true,
        }
    }
}

impl InterceptorConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether superseded application errors are logged.
    #[must_use]
    pub const fn log_superseded_errors(mut self, value: bool) -> Self {
        self.log_superseded_errors = value;
        self
    }
}
