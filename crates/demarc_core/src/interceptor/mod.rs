//! Transaction interception.
//!
//! The [`TransactionInterceptor`] wraps a single call:
//!
//! 1. resolve the attribute for the operation,
//! 2. begin or join a transaction and install its status as ambient,
//! 3. run the wrapped operation,
//! 4. commit, or ask the attribute's rollback rules what to do with the error,
//! 5. restore the previous ambient status.
//!
//! Operations without an attribute skip steps 2 to 5 entirely. If the
//! wrapped operation panics, the transaction is rolled back before the
//! ambient status is restored and the unwind continues.

mod phase;

pub use phase::InvocationPhase;

use crate::attribute::{TransactionAttribute, Verdict};
use crate::catalog::Catalog;
use crate::config::InterceptorConfig;
use crate::error::{ConfigError, InvocationError, TxError};
use crate::error_class::{Classify, ErrorClass};
use crate::metadata::MetadataProvider;
use crate::resolver::AttributeResolver;
use crate::transaction::{AmbientScope, TransactionManager, TransactionStatus};
use crate::types::{OperationId, TypeKey};
use std::sync::Arc;
use std::thread;

/// Applies declarative transaction demarcation around calls.
///
/// # Example
///
/// ```rust,ignore
/// let interceptor = TransactionInterceptor::builder()
///     .transaction_manager(manager)
///     .attribute_source(catalog, provider)
///     .build()?;
///
/// let total = interceptor.invoke(place_order, Some(order_service_impl), || {
///     orders.place(order)
/// })?;
/// ```
pub struct TransactionInterceptor {
    manager: Arc<dyn TransactionManager>,
    resolver: Arc<AttributeResolver>,
    config: InterceptorConfig,
}

impl TransactionInterceptor {
    /// Starts building an interceptor.
    #[must_use]
    pub fn builder() -> InterceptorBuilder {
        InterceptorBuilder::default()
    }

    /// Creates an interceptor from its collaborators.
    pub fn new(manager: Arc<dyn TransactionManager>, resolver: Arc<AttributeResolver>) -> Self {
        Self {
            manager,
            resolver,
            config: InterceptorConfig::default(),
        }
    }

    /// Returns the attribute resolver.
    #[must_use]
    pub fn resolver(&self) -> &Arc<AttributeResolver> {
        &self.resolver
    }

    /// Returns the transaction manager.
    #[must_use]
    pub fn transaction_manager(&self) -> &Arc<dyn TransactionManager> {
        &self.manager
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &InterceptorConfig {
        &self.config
    }

    /// Runs `proceed` under the transaction settings resolved for
    /// `operation` on `implementing_type`.
    ///
    /// # Errors
    ///
    /// - [`InvocationError::Application`] carries the operation's own error,
    ///   after the transaction was rolled back or committed.
    /// - [`InvocationError::Transaction`] carries a resolver failure, a
    ///   failure to begin (in which case `proceed` never ran), or a
    ///   commit/rollback failure, which supersedes any application error.
    pub fn invoke<T, E, F>(
        &self,
        operation: OperationId,
        implementing_type: Option<TypeKey>,
        proceed: F,
    ) -> Result<T, InvocationError<E>>
    where
        F: FnOnce() -> Result<T, E>,
        E: Classify,
    {
        let mut invocation = Invocation::new(self.resolver.catalog(), operation);
        let attribute = self.resolver.resolve(operation, implementing_type)?;
        invocation.advance(InvocationPhase::AttributeResolved);

        let Some(attribute) = attribute else {
            tracing::trace!(
                operation = %invocation.joinpoint(),
                "no transaction needed: operation is not transactional"
            );
            return proceed().map_err(InvocationError::Application);
        };

        tracing::debug!(
            operation = %invocation.joinpoint(),
            %attribute,
            "getting transaction"
        );
        // The manager reports incompatible existing transactions itself.
        let status = self.manager.begin(&attribute)?;
        let scope = AmbientScope::enter(Arc::clone(&status));
        invocation.advance(InvocationPhase::TxActive);

        let unwind_guard = RollbackOnUnwind {
            manager: &*self.manager,
            status: &status,
            catalog: self.resolver.catalog(),
            operation,
            armed: true,
        };
        let outcome = proceed();
        unwind_guard.disarm();

        let result = match outcome {
            Ok(value) => self
                .commit_after_returning(&mut invocation, &status)
                .map(|()| value),
            Err(error) => Err(self.complete_after_throwing(
                &mut invocation,
                &attribute,
                &status,
                error,
            )),
        };

        drop(scope);
        invocation.advance(InvocationPhase::ContextRestored);
        result
    }

    fn commit_after_returning<E>(
        &self,
        invocation: &mut Invocation<'_>,
        status: &TransactionStatus,
    ) -> Result<(), InvocationError<E>> {
        tracing::debug!(
            operation = %invocation.joinpoint(),
            txn = %status.id(),
            "invoking commit"
        );
        self.manager.commit(status)?;
        invocation.advance(InvocationPhase::Committed);
        Ok(())
    }

    fn complete_after_throwing<E: Classify>(
        &self,
        invocation: &mut Invocation<'_>,
        attribute: &TransactionAttribute,
        status: &TransactionStatus,
        error: E,
    ) -> InvocationError<E> {
        let verdict = attribute.verdict(&error);
        let class = error.error_class();

        if verdict.decision().is_rollback() {
            tracing::debug!(
                operation = %invocation.joinpoint(),
                txn = %status.id(),
                error = %class,
                rule = %describe_verdict(&verdict),
                "invoking rollback"
            );
            if let Err(failure) = self.manager.rollback(status) {
                self.log_superseded(invocation, class, &failure, "rollback");
                return InvocationError::Transaction(failure);
            }
            invocation.advance(InvocationPhase::RolledBack);
        } else {
            tracing::debug!(
                operation = %invocation.joinpoint(),
                txn = %status.id(),
                error = %class,
                rule = %describe_verdict(&verdict),
                "error does not force rollback, committing"
            );
            // The manager still rolls back if the status is rollback-only.
            if let Err(failure) = self.manager.commit(status) {
                self.log_superseded(invocation, class, &failure, "commit");
                return InvocationError::Transaction(failure);
            }
            invocation.advance(InvocationPhase::Committed);
        }
        InvocationError::Application(error)
    }

    fn log_superseded(
        &self,
        invocation: &Invocation<'_>,
        class: &ErrorClass,
        failure: &TxError,
        stage: &str,
    ) {
        if self.config.log_superseded_errors {
            tracing::error!(
                operation = %invocation.joinpoint(),
                application_error = %class,
                %failure,
                "application error overridden by {stage} failure"
            );
        }
    }
}

impl std::fmt::Debug for TransactionInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionInterceptor")
            .field("resolver", &self.resolver)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn describe_verdict(verdict: &Verdict<'_>) -> String {
    match verdict {
        Verdict::Rule { rule, depth, .. } => format!("{rule} at depth {depth}"),
        Verdict::DefaultPolicy { category } => format!("default policy ({category:?})"),
    }
}

/// Rolls the transaction back if the wrapped operation unwinds.
///
/// Declared after the [`AmbientScope`] so it drops first: the rollback runs
/// while the status is still ambient.
struct RollbackOnUnwind<'a> {
    manager: &'a dyn TransactionManager,
    status: &'a TransactionStatus,
    catalog: &'a Catalog,
    operation: OperationId,
    armed: bool,
}

impl RollbackOnUnwind<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RollbackOnUnwind<'_> {
    fn drop(&mut self) {
        if !self.armed || !thread::panicking() {
            return;
        }
        let operation = self.catalog.describe(self.operation);
        tracing::debug!(
            %operation,
            txn = %self.status.id(),
            "operation panicked, invoking rollback"
        );
        if let Err(failure) = self.manager.rollback(self.status) {
            tracing::error!(
                %operation,
                txn = %self.status.id(),
                %failure,
                "rollback after panic failed"
            );
        }
    }
}

/// Tracks one call through its [`InvocationPhase`]s.
struct Invocation<'a> {
    catalog: &'a Catalog,
    operation: OperationId,
    phase: InvocationPhase,
}

impl<'a> Invocation<'a> {
    fn new(catalog: &'a Catalog, operation: OperationId) -> Self {
        Self {
            catalog,
            operation,
            phase: InvocationPhase::NotStarted,
        }
    }

    fn advance(&mut self, next: InvocationPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal invocation transition {} -> {}",
            self.phase,
            next
        );
        tracing::trace!(
            operation = %self.joinpoint(),
            from = %self.phase,
            to = %next,
            "invocation phase"
        );
        self.phase = next;
    }

    fn joinpoint(&self) -> String {
        self.catalog.describe(self.operation)
    }
}

/// Builder for a [`TransactionInterceptor`].
///
/// Both a transaction manager and an attribute source are required.
#[derive(Default)]
pub struct InterceptorBuilder {
    manager: Option<Arc<dyn TransactionManager>>,
    resolver: Option<Arc<AttributeResolver>>,
    config: InterceptorConfig,
}

impl InterceptorBuilder {
    /// Sets the transaction manager.
    #[must_use]
    pub fn transaction_manager(mut self, manager: Arc<dyn TransactionManager>) -> Self {
        self.manager = Some(manager);
        self
    }

    /// Uses an existing resolver, sharing its cache.
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<AttributeResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Creates a fresh resolver over `catalog` and `provider`.
    #[must_use]
    pub fn attribute_source(
        mut self,
        catalog: Arc<Catalog>,
        provider: Arc<dyn MetadataProvider>,
    ) -> Self {
        self.resolver = Some(Arc::new(AttributeResolver::new(catalog, provider)));
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: InterceptorConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates the collaborators and builds the interceptor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingTransactionManager`] or
    /// [`ConfigError::MissingAttributeSource`].
    pub fn build(self) -> Result<TransactionInterceptor, ConfigError> {
        let manager = self.manager.ok_or(ConfigError::MissingTransactionManager)?;
        let resolver = self.resolver.ok_or(ConfigError::MissingAttributeSource)?;
        Ok(TransactionInterceptor {
            manager,
            resolver,
            config: self.config,
        })
    }
}
