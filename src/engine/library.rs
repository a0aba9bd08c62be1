// ========================================
// Library adapter
// ========================================
//
// Wraps the raw name -> member mapping behind a shared handle. Chains
// resolve members through this adapter and freeze what they resolved;
// registration mutates the shared map and is visible to future chains
// only. Last writer wins on name collisions.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ChainError;
use crate::parser::ast::Value;

/// Plain step function: receives its effective argument list and
/// returns the new running value.
pub type StepFn = Arc<dyn Fn(&[Value]) -> Result<Value, ChainError> + Send + Sync>;

/// Step function that additionally receives the owning library, for
/// steps that want to look up sibling members during evaluation.
pub type ContextStepFn =
    Arc<dyn Fn(&Library, &[Value]) -> Result<Value, ChainError> + Send + Sync>;

/// One library entry. Constants resolve to a zero-argument callable
/// that yields the constant, so chains treat every member uniformly.
#[derive(Clone)]
pub enum Member {
    Function(StepFn),
    ContextFn(ContextStepFn),
    Constant(Arc<Value>),
}

impl Member {
    pub fn function<F>(f: F) -> Member
    where
        F: Fn(&[Value]) -> Result<Value, ChainError> + Send + Sync + 'static,
    {
        Member::Function(Arc::new(f))
    }

    pub fn context<F>(f: F) -> Member
    where
        F: Fn(&Library, &[Value]) -> Result<Value, ChainError> + Send + Sync + 'static,
    {
        Member::ContextFn(Arc::new(f))
    }

    pub fn constant(value: Value) -> Member {
        Member::Constant(Arc::new(value))
    }

    /// Identity comparison for `origin()` checks: two handles are the
    /// same member iff they point at the same registered allocation.
    pub fn same(&self, other: &Member) -> bool {
        match (self, other) {
            (Member::Function(a), Member::Function(b)) => Arc::ptr_eq(a, b),
            (Member::ContextFn(a), Member::ContextFn(b)) => Arc::ptr_eq(a, b),
            (Member::Constant(a), Member::Constant(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Function(_) => f.write_str("Member::Function"),
            Member::ContextFn(_) => f.write_str("Member::ContextFn"),
            Member::Constant(v) => write!(f, "Member::Constant({:?})", v),
        }
    }
}

lazy_static! {
    // Registration names must be chainable identifiers; anything else
    // could never be accessed or re-parsed from serialized text.
    static ref NAME_PATTERN: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Shared handle to the member map. Cloning the handle shares the map,
/// so registering through any clone is visible everywhere.
#[derive(Clone, Default)]
pub struct Library {
    members: Arc<Mutex<HashMap<String, Member>>>,
}

impl Library {
    pub fn new() -> Library {
        Library::default()
    }

    pub fn from_members(members: HashMap<String, Member>) -> Library {
        Library {
            members: Arc::new(Mutex::new(members)),
        }
    }

    /// Own-key lookup. The resolved member is cloned out so the caller
    /// holds it frozen, independent of later re-registration.
    pub fn resolve(&self, name: &str) -> Option<Member> {
        self.members.lock().unwrap().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.lock().unwrap().contains_key(name)
    }

    /// Register a plain step function under `name`, replacing any
    /// existing member of that name.
    pub fn register<F>(&self, name: &str, f: F) -> Result<(), ChainError>
    where
        F: Fn(&[Value]) -> Result<Value, ChainError> + Send + Sync + 'static,
    {
        self.register_member(name, Member::function(f))
    }

    /// Register a step function that receives the library as context.
    pub fn register_context<F>(&self, name: &str, f: F) -> Result<(), ChainError>
    where
        F: Fn(&Library, &[Value]) -> Result<Value, ChainError> + Send + Sync + 'static,
    {
        self.register_member(name, Member::context(f))
    }

    /// Register a constant value under `name`.
    pub fn register_constant(&self, name: &str, value: Value) -> Result<(), ChainError> {
        self.register_member(name, Member::constant(value))
    }

    /// All registration funnels through here so name validation is
    /// applied uniformly.
    pub fn register_member(&self, name: &str, member: Member) -> Result<(), ChainError> {
        if !NAME_PATTERN.is_match(name) {
            return Err(ChainError::InvalidRegistration(name.to_string()));
        }
        self.members
            .lock()
            .unwrap()
            .insert(name.to_string(), member);
        Ok(())
    }

    /// Bulk registration, equivalent to repeated single-name calls.
    /// Stops at the first invalid name and returns that failure.
    pub fn register_map<I>(&self, pairs: I) -> Result<(), ChainError>
    where
        I: IntoIterator<Item = (String, Member)>,
    {
        for (name, member) in pairs {
            self.register_member(&name, member)?;
        }
        Ok(())
    }

    /// Sorted member names, for diagnostics.
    pub fn members(&self) -> Vec<String> {
        let mut names: Vec<String> = self.members.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.members.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.lock().unwrap().is_empty()
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("members", &self.members())
            .finish()
    }
}
