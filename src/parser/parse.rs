// ========================================
// Chain text parser
// ========================================
//
// Parses the compact textual form produced by `serialize()` back into
// an ordered list of named steps. Name resolution against a library
// happens later, in the deserializer; this module only understands the
// grammar.

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::error::ChainError;
use crate::parser::ast::{ParsedStep, Value};

/// Grammar rules live in grammar.pest.
#[derive(Parser)]
#[grammar = "parser/grammar.pest"]
pub struct ChainTextParser;

/// Parse serialized chain text into its step segments.
///
/// Primitive argument tokens are re-parsed (numbers, booleans) so a
/// deserialized chain evaluates like the chain it was rendered from;
/// everything else stays a raw string token.
pub fn parse_chain_text(text: &str) -> Result<Vec<ParsedStep>, ChainError> {
    let mut pairs = ChainTextParser::parse(Rule::chain, text)
        .map_err(|e| ChainError::Parse(e.to_string()))?;
    let chain = pairs
        .next()
        .ok_or_else(|| ChainError::Parse("empty chain text".to_string()))?;

    let mut steps = Vec::new();
    for pair in chain.into_inner() {
        match pair.as_rule() {
            Rule::step => steps.push(parse_step(pair)?),
            Rule::EOI => {}
            other => {
                return Err(ChainError::Parse(format!("unexpected rule {:?}", other)));
            }
        }
    }
    Ok(steps)
}

fn parse_step(pair: Pair<Rule>) -> Result<ParsedStep, ChainError> {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .ok_or_else(|| ChainError::Parse("step without a name".to_string()))?
        .as_str()
        .to_string();

    // A bare name keeps `args` unset; `name()` captures an empty list.
    let args = match inner.next() {
        Some(call) => Some(call.into_inner().map(parse_arg).collect()),
        None => None,
    };

    Ok(ParsedStep { name, args })
}

fn parse_arg(pair: Pair<Rule>) -> Value {
    match pair.into_inner().next() {
        Some(token) => match token.as_rule() {
            Rule::number => token
                .as_str()
                .trim()
                .parse::<f64>()
                .map(Value::Number)
                .unwrap_or_else(|_| Value::String(token.as_str().trim().to_string())),
            Rule::boolean => Value::Bool(token.as_str().trim() == "true"),
            _ => Value::String(token.as_str().trim().to_string()),
        },
        None => Value::Null,
    }
}
