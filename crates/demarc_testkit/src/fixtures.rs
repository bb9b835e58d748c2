//! Test fixtures.
//!
//! A small bean hierarchy to resolve attributes against and a Java-style
//! error class tree to evaluate rollback rules against.

use demarc_core::{
    ApplicationError, Catalog, ErrorCategory, ErrorClass, OperationId, TypeKey, TypeKind,
};
use std::sync::Arc;

/// The four bean accessors, as declared on one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeanOps {
    /// `getAge()`
    pub get_age: OperationId,
    /// `setAge(int)`
    pub set_age: OperationId,
    /// `getName()`
    pub get_name: OperationId,
    /// `setName(String)`
    pub set_name: OperationId,
}

/// The sample bean catalog.
///
/// ```text
/// ITestBean (interface)        getAge() setAge(int) getName() setName(String)
///   └─ TestBean                all four, plus restricted reset()
///        ├─ OverloadedTestBean setAge(String)
///        └─ InheritingTestBean nothing of its own
/// ```
#[derive(Debug, Clone)]
pub struct BeanCatalog {
    /// The built catalog.
    pub catalog: Arc<Catalog>,
    /// `ITestBean`
    pub i_test_bean: TypeKey,
    /// `TestBean`
    pub test_bean: TypeKey,
    /// `OverloadedTestBean`
    pub overloaded_bean: TypeKey,
    /// `InheritingTestBean`
    pub inheriting_bean: TypeKey,
    /// Operations declared on `ITestBean`.
    pub interface_ops: BeanOps,
    /// Operations declared on `TestBean`.
    pub class_ops: BeanOps,
    /// `OverloadedTestBean.setAge(String)`
    pub set_age_text: OperationId,
    /// `TestBean.reset()`, restricted visibility.
    pub reset: OperationId,
}

impl BeanCatalog {
    /// Builds the catalog.
    pub fn new() -> Self {
        let mut b = Catalog::builder();
        let i_test_bean = b
            .declare_type("ITestBean", TypeKind::Interface)
            .expect("Failed to declare ITestBean");
        let test_bean = b
            .declare_type("TestBean", TypeKind::Concrete)
            .expect("Failed to declare TestBean");
        let overloaded_bean = b
            .declare_type("OverloadedTestBean", TypeKind::Concrete)
            .expect("Failed to declare OverloadedTestBean");
        let inheriting_bean = b
            .declare_type("InheritingTestBean", TypeKind::Concrete)
            .expect("Failed to declare InheritingTestBean");

        b.extend(test_bean, i_test_bean).expect("Failed to extend");
        b.extend(overloaded_bean, test_bean).expect("Failed to extend");
        b.extend(inheriting_bean, test_bean).expect("Failed to extend");

        let mut accessors = |ty: TypeKey| BeanOps {
            get_age: b.declare_operation(ty, "getAge", &[]).expect("Failed to declare getAge"),
            set_age: b
                .declare_operation(ty, "setAge", &["int"])
                .expect("Failed to declare setAge"),
            get_name: b
                .declare_operation(ty, "getName", &[])
                .expect("Failed to declare getName"),
            set_name: b
                .declare_operation(ty, "setName", &["String"])
                .expect("Failed to declare setName"),
        };
        let interface_ops = accessors(i_test_bean);
        let class_ops = accessors(test_bean);

        let set_age_text = b
            .declare_operation(overloaded_bean, "setAge", &["String"])
            .expect("Failed to declare setAge(String)");
        let reset = b
            .declare_restricted_operation(test_bean, "reset", &[])
            .expect("Failed to declare reset");

        Self {
            catalog: Arc::new(b.build().expect("Failed to build bean catalog")),
            i_test_bean,
            test_bean,
            overloaded_bean,
            inheriting_bean,
            interface_ops,
            class_ops,
            set_age_text,
            reset,
        }
    }
}

impl Default for BeanCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// A Java-style error class tree.
///
/// ```text
/// java.lang.Throwable (checked)
///   ├─ java.lang.Exception
///   │    ├─ java.io.IOException
///   │    ├─ javax.servlet.ServletException
///   │    └─ java.lang.RuntimeException (unchecked)
///   │         ├─ java.lang.IllegalStateException
///   │         └─ org.example.MyRuntimeException
///   └─ java.lang.Error (fatal)
/// ```
#[derive(Debug, Clone)]
pub struct ErrorTree {
    /// `java.lang.Throwable`
    pub throwable: Arc<ErrorClass>,
    /// `java.lang.Exception`
    pub exception: Arc<ErrorClass>,
    /// `java.io.IOException`
    pub io: Arc<ErrorClass>,
    /// `javax.servlet.ServletException`
    pub servlet: Arc<ErrorClass>,
    /// `java.lang.RuntimeException`
    pub runtime: Arc<ErrorClass>,
    /// `java.lang.IllegalStateException`
    pub illegal_state: Arc<ErrorClass>,
    /// `org.example.MyRuntimeException`
    pub my_runtime: Arc<ErrorClass>,
    /// `java.lang.Error`
    pub error: Arc<ErrorClass>,
}

impl ErrorTree {
    /// Builds the tree.
    pub fn new() -> Self {
        let throwable = ErrorClass::root("java.lang.Throwable", ErrorCategory::Checked);
        let exception = ErrorClass::subclass(&throwable, "java.lang.Exception");
        let io = ErrorClass::subclass(&exception, "java.io.IOException");
        let servlet = ErrorClass::subclass(&exception, "javax.servlet.ServletException");
        let runtime = ErrorClass::subclass_with_category(
            &exception,
            "java.lang.RuntimeException",
            ErrorCategory::Unchecked,
        );
        let illegal_state = ErrorClass::subclass(&runtime, "java.lang.IllegalStateException");
        let my_runtime = ErrorClass::subclass(&runtime, "org.example.MyRuntimeException");
        let error =
            ErrorClass::subclass_with_category(&throwable, "java.lang.Error", ErrorCategory::Fatal);

        Self {
            throwable,
            exception,
            io,
            servlet,
            runtime,
            illegal_state,
            my_runtime,
            error,
        }
    }

    /// Returns every class in the tree, roots first.
    pub fn all(&self) -> Vec<Arc<ErrorClass>> {
        vec![
            Arc::clone(&self.throwable),
            Arc::clone(&self.exception),
            Arc::clone(&self.io),
            Arc::clone(&self.servlet),
            Arc::clone(&self.runtime),
            Arc::clone(&self.illegal_state),
            Arc::clone(&self.my_runtime),
            Arc::clone(&self.error),
        ]
    }
}

impl Default for ErrorTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates an application error of `class`.
pub fn raise(class: &Arc<ErrorClass>, message: &str) -> ApplicationError {
    ApplicationError::new(class, message)
}
