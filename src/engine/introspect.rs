// ========================================
// Introspection and textual serialization
// ========================================
//
// `def` renders a chain as structured records, `serialize` as compact
// text, and `deserialize` rebuilds a chain from that text by
// re-resolving names against a library. Unresolved names are dropped,
// the same policy the builder applies while chaining.

use log::warn;
use serde::Serialize;

use crate::engine::chain::Chain;
use crate::engine::library::{Library, Member};
use crate::error::{ChainError, NO_VALID_STEP};
use crate::parser::ast::Value;
use crate::parser::parse_chain_text;

/// Structured description of one step. `args` stays out of the JSON
/// form when the step was never called; `origin` is the frozen member
/// handle, carried for identity checks rather than rendering.
#[derive(Debug, Clone, Serialize)]
pub struct StepDef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<Value>>,
    #[serde(skip)]
    pub origin: Member,
}

pub fn def(chain: &Chain) -> Vec<StepDef> {
    chain
        .steps()
        .iter()
        .map(|step| StepDef {
            name: step.name.clone(),
            args: step.args.clone(),
            origin: step.member.clone(),
        })
        .collect()
}

/// JSON array rendering of `def`, or the sentinel for a chain with no
/// resolved step. Fails soft: this never returns an error.
pub fn def_text(chain: &Chain) -> String {
    let defs = def(chain);
    if defs.is_empty() {
        return NO_VALID_STEP.to_string();
    }
    serde_json::to_string(&defs).unwrap_or_else(|e| {
        warn!("def rendering failed: {}", e);
        NO_VALID_STEP.to_string()
    })
}

/// Render the chain as `name` / `name(a,b)` segments joined by `.`.
/// Argument rendering is plain text and lossy for structured values.
pub fn serialize(chain: &Chain) -> String {
    chain
        .steps()
        .iter()
        .map(|step| match &step.args {
            None => step.name.clone(),
            Some(args) => {
                let rendered: Vec<String> =
                    args.iter().map(Value::to_plain_string).collect();
                format!("{}({})", step.name, rendered.join(","))
            }
        })
        .collect::<Vec<String>>()
        .join(".")
}

/// Rebuild a chain from serialized text. Names that no longer resolve
/// in `library` are dropped with a warning; malformed text is a
/// `Parse` error.
pub fn deserialize(library: &Library, text: &str) -> Result<Chain, ChainError> {
    let parsed = parse_chain_text(text)?;
    let mut chain = Chain::root(library.clone());
    for segment in parsed {
        if !library.contains(&segment.name) {
            warn!(
                "dropping unresolved step '{}' from deserialized chain",
                segment.name
            );
            continue;
        }
        chain = match segment.args {
            Some(args) => chain.step(&segment.name, args),
            None => chain.access(&segment.name),
        };
    }
    Ok(chain)
}
