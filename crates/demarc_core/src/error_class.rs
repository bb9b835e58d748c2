//! Error classes: the type hierarchy rollback rules are matched against.
//!
//! Every error that reaches the interceptor is classified by an
//! [`ErrorClass`]. Classes form a single-inheritance chain up to a root, and
//! each class carries the [`ErrorCategory`] that drives the default rollback
//! policy.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// How an error class is treated when no rollback rule matches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// An expected, declared failure. Commits by default.
    Checked,
    /// A programming or runtime failure. Rolls back by default.
    Unchecked,
    /// A failure the process cannot reasonably recover from. Rolls back by default.
    Fatal,
}

impl ErrorCategory {
    /// Returns true if errors of this category roll back under the default policy.
    #[must_use]
    pub const fn rolls_back_by_default(self) -> bool {
        matches!(self, Self::Unchecked | Self::Fatal)
    }
}

/// A node in an error type hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorClass {
    name: String,
    parent: Option<Arc<ErrorClass>>,
    category: ErrorCategory,
}

impl ErrorClass {
    /// Creates a root class with no supertype.
    pub fn root(name: impl Into<String>, category: ErrorCategory) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent: None,
            category,
        })
    }

    /// Creates a subclass that inherits its parent's category.
    pub fn subclass(parent: &Arc<ErrorClass>, name: impl Into<String>) -> Arc<Self> {
        Self::subclass_with_category(parent, name, parent.category)
    }

    /// Creates a subclass with its own category.
    ///
    /// This is how an unchecked branch is rooted under a checked supertype.
    pub fn subclass_with_category(
        parent: &Arc<ErrorClass>,
        name: impl Into<String>,
        category: ErrorCategory,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent: Some(Arc::clone(parent)),
            category,
        })
    }

    /// Returns the fully-qualified name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the direct supertype.
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<ErrorClass>> {
        self.parent.as_ref()
    }

    /// Returns the category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    /// Iterates this class and then each supertype up to the root.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Returns true if this class or one of its supertypes has the given name.
    #[must_use]
    pub fn is_a(&self, name: &str) -> bool {
        self.ancestors().any(|class| class.name == name)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Iterator over an error class and its supertypes.
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    next: Option<&'a ErrorClass>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ErrorClass;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent.as_deref();
        Some(current)
    }
}

/// Anything that can report the [`ErrorClass`] it belongs to.
///
/// The interceptor requires this of the wrapped operation's error type so
/// rollback rules can be evaluated against it.
pub trait Classify {
    /// Returns the concrete class of this error.
    fn error_class(&self) -> &ErrorClass;
}

impl Classify for ErrorClass {
    fn error_class(&self) -> &ErrorClass {
        self
    }
}

impl Classify for Arc<ErrorClass> {
    fn error_class(&self) -> &ErrorClass {
        self
    }
}

impl<T: Classify + ?Sized> Classify for &T {
    fn error_class(&self) -> &ErrorClass {
        (**self).error_class()
    }
}

impl<T: Classify + ?Sized> Classify for Box<T> {
    fn error_class(&self) -> &ErrorClass {
        (**self).error_class()
    }
}

/// A general-purpose classified application error.
#[derive(Debug, Error)]
#[error("{class}: {message}")]
pub struct ApplicationError {
    class: Arc<ErrorClass>,
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl ApplicationError {
    /// Creates an application error of the given class.
    pub fn new(class: &Arc<ErrorClass>, message: impl Into<String>) -> Self {
        Self {
            class: Arc::clone(class),
            message: message.into(),
            source: None,
        }
    }

    /// Attaches an underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the class as a shared handle.
    #[must_use]
    pub fn class(&self) -> &Arc<ErrorClass> {
        &self.class
    }
}

impl Classify for ApplicationError {
    fn error_class(&self) -> &ErrorClass {
        &self.class
    }
}
