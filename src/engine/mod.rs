pub mod chain;
pub mod eval;
pub mod introspect;
pub mod library;
