// ========================================
// Chain builder state machine
// ========================================
//
// A chain is an append-only list of step records plus a build state.
// Handles are cheap clones: branching two continuations off one prefix
// shares the prefix records through `Arc`, and records are never
// mutated after finalization, so sharing needs no coordination.

use std::sync::Arc;

use log::{debug, warn};

use crate::engine::eval;
use crate::engine::introspect::{self, StepDef};
use crate::engine::library::{Library, Member};
use crate::error::{ChainError, NO_VALID_STEP};
use crate::parser::ast::Value;

/// Build state of a chain handle.
///
/// `Pending` means the tail step was just accessed and may still have
/// arguments attached by an immediate `call`; `Ready` means the tail
/// step is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    Root,
    Pending,
    Ready,
}

/// One resolved step: the member frozen at access time, the name it
/// resolved under, and the arguments captured by an immediate call
/// (`None` when the step was never called).
#[derive(Debug, Clone)]
pub struct Step {
    pub name: String,
    pub member: Member,
    pub args: Option<Vec<Value>>,
}

/// A chain handle. All building operations take `&self` and return a
/// new handle; the receiver is never mutated.
#[derive(Debug, Clone)]
pub struct Chain {
    library: Library,
    steps: Vec<Arc<Step>>,
    state: ChainState,
}

impl Chain {
    pub(crate) fn root(library: Library) -> Chain {
        Chain {
            library,
            steps: Vec::new(),
            state: ChainState::Root,
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn steps(&self) -> &[Arc<Step>] {
        &self.steps
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    /// Access a library member by name, appending a step.
    ///
    /// Unknown names are skipped: the returned handle is equivalent to
    /// the receiver and the chain is unchanged. This keeps chains
    /// resilient to typos and irrelevant probes, and mirrors how
    /// deserialization drops unresolved names.
    pub fn access(&self, name: &str) -> Chain {
        match self.library.resolve(name) {
            Some(member) => {
                let mut steps = self.steps.clone();
                steps.push(Arc::new(Step {
                    name: name.to_string(),
                    member,
                    args: None,
                }));
                Chain {
                    library: self.library.clone(),
                    steps,
                    state: ChainState::Pending,
                }
            }
            None => {
                debug!("access '{}' did not resolve, skipping", name);
                self.clone()
            }
        }
    }

    /// Attach arguments to the step appended by the most recent
    /// `access`, finalizing it.
    ///
    /// Calling a chain whose tail is already finalized returns the
    /// handle unchanged and discards `args`, matching the original
    /// engine's behavior for direct calls on a finished chain.
    /// Evaluation is always spelled `value`.
    pub fn call(&self, args: Vec<Value>) -> Chain {
        match self.state {
            ChainState::Pending => {
                let mut steps = self.steps.clone();
                // Pending guarantees a just-accessed tail step.
                let Some(tail) = steps.pop() else {
                    return self.clone();
                };
                steps.push(Arc::new(Step {
                    name: tail.name.clone(),
                    member: tail.member.clone(),
                    args: Some(args),
                }));
                Chain {
                    library: self.library.clone(),
                    steps,
                    state: ChainState::Ready,
                }
            }
            ChainState::Root | ChainState::Ready => {
                warn!("call on a finalized chain discards its arguments");
                self.clone()
            }
        }
    }

    /// `access` followed by `call`: the common `name(args)` shape.
    /// When the name does not resolve, the args are dropped with the
    /// step (skip rule), not attached to the previous one.
    pub fn step(&self, name: &str, args: Vec<Value>) -> Chain {
        let next = self.access(name);
        if next.state == ChainState::Pending {
            next.call(args)
        } else {
            next
        }
    }

    /// The raw library member the most recent step resolved to, for
    /// identity checks against the library.
    pub fn origin(&self) -> Option<Member> {
        self.steps.last().map(|step| step.member.clone())
    }

    /// Evaluate the accumulated pipeline. See the evaluator for the
    /// argument-merging rules.
    pub fn value(&self, seeds: &[Value]) -> Result<Value, ChainError> {
        eval::evaluate(self, seeds)
    }

    /// Structured description of the accumulated steps.
    pub fn def(&self) -> Vec<StepDef> {
        introspect::def(self)
    }

    /// JSON rendering of `def`, or the no-valid-step sentinel when the
    /// chain holds no resolved step.
    pub fn def_text(&self) -> String {
        introspect::def_text(self)
    }

    /// Compact textual form: `name` or `name(a,b)` joined by `.`.
    pub fn serialize(&self) -> String {
        introspect::serialize(self)
    }

    /// Rebuild a chain from serialized text against this chain's
    /// library. Unresolved names are dropped, not errors.
    pub fn deserialize(&self, text: &str) -> Result<Chain, ChainError> {
        introspect::deserialize(&self.library, text)
    }
}

// ========================================
// Root surface
// ========================================

/// The root handle returned by `make_chainable`: the registration
/// surface plus the entry point for starting chains.
#[derive(Debug, Clone)]
pub struct Chainable {
    library: Library,
}

impl Chainable {
    pub fn new(library: Library) -> Chainable {
        Chainable { library }
    }

    pub fn from_members(
        members: std::collections::HashMap<String, Member>,
    ) -> Chainable {
        Chainable {
            library: Library::from_members(members),
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// An empty chain over this library.
    pub fn root(&self) -> Chain {
        Chain::root(self.library.clone())
    }

    /// Start a chain by accessing a member.
    pub fn access(&self, name: &str) -> Chain {
        self.root().access(name)
    }

    /// Start a chain with `name(args)`.
    pub fn step(&self, name: &str, args: Vec<Value>) -> Chain {
        self.root().step(name, args)
    }

    pub fn register<F>(&self, name: &str, f: F) -> Result<(), ChainError>
    where
        F: Fn(&[Value]) -> Result<Value, ChainError> + Send + Sync + 'static,
    {
        self.library.register(name, f)
    }

    pub fn register_context<F>(&self, name: &str, f: F) -> Result<(), ChainError>
    where
        F: Fn(&Library, &[Value]) -> Result<Value, ChainError> + Send + Sync + 'static,
    {
        self.library.register_context(name, f)
    }

    pub fn register_constant(&self, name: &str, value: Value) -> Result<(), ChainError> {
        self.library.register_constant(name, value)
    }

    pub fn register_map<I>(&self, pairs: I) -> Result<(), ChainError>
    where
        I: IntoIterator<Item = (String, Member)>,
    {
        self.library.register_map(pairs)
    }

    /// The root has no steps, so its description is the sentinel.
    pub fn def_text(&self) -> String {
        NO_VALID_STEP.to_string()
    }

    pub fn deserialize(&self, text: &str) -> Result<Chain, ChainError> {
        introspect::deserialize(&self.library, text)
    }
}
