//! Fluent chaining over a dynamic library of named functions and values.
//!
//! `make_chainable` turns a [`Library`] into a root handle. Accessing a
//! member appends a step, calling attaches that step's arguments, and
//! `value` evaluates the pipeline by threading a running value through
//! each step as its first argument:
//!
//! ```
//! use chainable::{Chainable, Library, Value};
//!
//! let root = Chainable::new(Library::new());
//! root.register("add", |args| {
//!     let v = args.first().and_then(Value::as_number).unwrap_or(0.0);
//!     let a = args.get(1).and_then(Value::as_number).unwrap_or(0.0);
//!     Ok(Value::Number(v + a))
//! })?;
//! root.register("time", |args| {
//!     let a = args.first().and_then(Value::as_number).unwrap_or(1.0);
//!     let b = args.get(1).and_then(Value::as_number).unwrap_or(1.0);
//!     Ok(Value::Number(a * b))
//! })?;
//!
//! let chain = root
//!     .step("add", vec![Value::Number(2.0)])
//!     .step("time", vec![Value::Number(2.0)]);
//! assert_eq!(chain.value(&[])?, Value::Number(4.0));
//! assert_eq!(chain.serialize(), "add(2).time(2)");
//! # Ok::<(), chainable::ChainError>(())
//! ```
//!
//! Unknown member names are skipped while chaining and dropped while
//! deserializing; chains stay resilient to typos by design.

pub mod engine;
pub mod error;
pub mod parser;

pub use engine::chain::{Chain, ChainState, Chainable, Step};
pub use engine::introspect::StepDef;
pub use engine::library::{ContextStepFn, Library, Member, StepFn};
pub use error::{ChainError, NO_VALID_STEP};
pub use parser::ast::Value;

/// Entry point mirroring the original constructor: a missing library
/// is `InvalidLibrary`, everything else becomes a root handle.
pub fn make_chainable(library: Option<Library>) -> Result<Chainable, ChainError> {
    match library {
        Some(library) => Ok(Chainable::new(library)),
        None => Err(ChainError::InvalidLibrary),
    }
}

/// Register a function item under its own declared name:
///
/// ```
/// use chainable::{register_named, Chainable, Library, Value};
///
/// let root = Chainable::new(Library::new());
/// register_named!(root, fn divide(args) {
///     let v = args.first().and_then(Value::as_number).unwrap_or(0.0);
///     let by = args.get(1).and_then(Value::as_number).unwrap_or(1.0);
///     Ok(Value::Number(v / by))
/// })?;
/// assert_eq!(
///     root.step("divide", vec![Value::Number(2.0)]).value(&[Value::Number(6.0)])?,
///     Value::Number(3.0),
/// );
/// # Ok::<(), chainable::ChainError>(())
/// ```
///
/// The second form registers an existing `fn` item by its identifier:
/// `register_named!(root, my_step)`.
#[macro_export]
macro_rules! register_named {
    ($target:expr, fn $name:ident($args:ident) $body:block) => {
        $target.register(stringify!($name), move |$args: &[$crate::Value]| $body)
    };
    ($target:expr, $f:ident) => {
        $target.register(stringify!($f), move |args: &[$crate::Value]| $f(args))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_chainable_requires_a_library() {
        assert_eq!(
            make_chainable(None).unwrap_err(),
            ChainError::InvalidLibrary
        );
        assert!(make_chainable(Some(Library::new())).is_ok());
    }

    #[test]
    fn register_named_uses_the_declared_name() {
        let root = make_chainable(Some(Library::new())).unwrap();
        register_named!(root, fn double(args) {
            let n = args.first().and_then(Value::as_number).unwrap_or(0.0);
            Ok(Value::Number(n * 2.0))
        })
        .unwrap();

        assert!(root.library().contains("double"));
        let out = root.access("double").value(&[Value::Number(5.0)]).unwrap();
        assert_eq!(out, Value::Number(10.0));
    }

    #[test]
    fn register_named_accepts_a_fn_item() {
        fn negate(args: &[Value]) -> Result<Value, ChainError> {
            let n = args.first().and_then(Value::as_number).unwrap_or(0.0);
            Ok(Value::Number(-n))
        }

        let root = make_chainable(Some(Library::new())).unwrap();
        register_named!(root, negate).unwrap();
        let out = root.access("negate").value(&[Value::Number(3.0)]).unwrap();
        assert_eq!(out, Value::Number(-3.0));
    }
}
