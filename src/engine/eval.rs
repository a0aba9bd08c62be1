// ========================================
// Evaluator
// ========================================
//
// Evaluation is a synchronous fold over the finalized step list.
// Argument merging:
//   step 0:   seeds ++ captured args   (seeds first)
//   step i>0: [running, ...captured]   (running value prepended)
// Step failures propagate unmodified; building a chain never invokes
// a step function, so errors only ever surface here.

use crate::engine::chain::{Chain, Step};
use crate::engine::library::{Library, Member};
use crate::error::ChainError;
use crate::parser::ast::Value;

pub fn evaluate(chain: &Chain, seeds: &[Value]) -> Result<Value, ChainError> {
    let steps = chain.steps();
    if steps.is_empty() {
        // Identity pipeline: the first seed passes through unchanged.
        return Ok(seeds.first().cloned().unwrap_or(Value::Null));
    }

    let mut running = Value::Null;
    for (index, step) in steps.iter().enumerate() {
        let captured = step.args.as_deref().unwrap_or(&[]);
        let effective: Vec<Value> = if index == 0 {
            seeds.iter().chain(captured.iter()).cloned().collect()
        } else {
            std::iter::once(&running)
                .chain(captured.iter())
                .cloned()
                .collect()
        };
        running = apply(step, chain.library(), &effective)?;
    }
    Ok(running)
}

fn apply(step: &Step, library: &Library, args: &[Value]) -> Result<Value, ChainError> {
    match &step.member {
        Member::Function(f) => f(args),
        Member::ContextFn(f) => f(library, args),
        // Constants ignore their arguments.
        Member::Constant(value) => Ok((**value).clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::chain::Chainable;

    fn fixture() -> Chainable {
        let root = Chainable::new(Library::new());
        root.register("add", |args| {
            let v = args.first().and_then(Value::as_number).unwrap_or(0.0);
            let addend = args.get(1).and_then(Value::as_number).unwrap_or(0.0);
            Ok(Value::Number(v + addend))
        })
        .unwrap();
        root.register("time", |args| {
            let a = args.first().and_then(Value::as_number).unwrap_or(1.0);
            let b = args.get(1).and_then(Value::as_number).unwrap_or(1.0);
            Ok(Value::Number(a * b))
        })
        .unwrap();
        root.register("sum", |args| {
            let total = args
                .iter()
                .filter_map(Value::as_number)
                .sum::<f64>();
            Ok(Value::Number(total))
        })
        .unwrap();
        root.register("print", |args| {
            let v = args.first().cloned().unwrap_or(Value::Null);
            let prefix = args.get(1).and_then(Value::as_str).unwrap_or("");
            let suffix = args.get(2).and_then(Value::as_str).unwrap_or("");
            Ok(Value::String(format!(
                "{}{}{}",
                prefix,
                v.to_plain_string(),
                suffix
            )))
        })
        .unwrap();
        root.register_constant("hello", Value::String("hi".into()))
            .unwrap();
        root
    }

    fn n(v: f64) -> Value {
        Value::Number(v)
    }

    #[test]
    fn threads_the_running_value_left_to_right() {
        let root = fixture();
        let out = root
            .step("add", vec![n(2.0)])
            .step("time", vec![n(2.0)])
            .value(&[])
            .unwrap();
        assert_eq!(out, n(4.0));
    }

    #[test]
    fn seeds_come_before_captured_args_on_step_zero() {
        let root = fixture();
        // add receives (0, 2): running 2, then time (2, 2) -> 4.
        let out = root
            .step("add", vec![n(2.0)])
            .step("time", vec![n(2.0)])
            .value(&[n(0.0)])
            .unwrap();
        assert_eq!(out, n(4.0));

        // Uncalled first step receives only the seed.
        let out = root
            .access("add")
            .step("time", vec![n(2.0)])
            .value(&[n(3.0)])
            .unwrap();
        assert_eq!(out, n(6.0));
    }

    #[test]
    fn multiple_seeds_all_reach_step_zero() {
        let root = fixture();
        let out = root.access("sum").value(&[n(1.0), n(2.0), n(3.0)]).unwrap();
        assert_eq!(out, n(6.0));

        let out = root
            .access("sum")
            .step("add", vec![n(2.0)])
            .access("time")
            .access("time")
            .step("time", vec![n(2.0)])
            .value(&[n(1.0), n(2.0), n(3.0)])
            .unwrap();
        assert_eq!(out, n(16.0));
    }

    #[test]
    fn empty_chain_is_the_identity_pipeline() {
        let root = fixture();
        assert_eq!(root.root().value(&[n(42.0)]).unwrap(), n(42.0));
        assert_eq!(
            root.root()
                .value(&[Value::String("x".into()), n(1.0)])
                .unwrap(),
            Value::String("x".into())
        );
        assert_eq!(root.root().value(&[]).unwrap(), Value::Null);
    }

    #[test]
    fn constants_yield_their_value_and_ignore_args() {
        let root = fixture();
        let out = root.access("hello").value(&[n(5.0)]).unwrap();
        assert_eq!(out, Value::String("hi".into()));

        // Mid-chain constant replaces the running value.
        let out = root
            .step("add", vec![n(2.0)])
            .access("hello")
            .value(&[])
            .unwrap();
        assert_eq!(out, Value::String("hi".into()));
    }

    #[test]
    fn string_steps_compose_with_numeric_ones() {
        let root = fixture();
        let out = root
            .step("add", vec![n(2.0)])
            .step("time", vec![n(2.0)])
            .step("print", vec![])
            .value(&[n(0.0)])
            .unwrap();
        assert_eq!(out, Value::String("4".into()));
    }

    #[test]
    fn context_steps_can_reach_sibling_members() {
        let root = fixture();
        root.register_context("apply_twice", |library, args| {
            let name = args.get(1).and_then(Value::as_str).unwrap_or("");
            let Some(Member::Function(f)) = library.resolve(name) else {
                return Err(ChainError::step("apply_twice", "no such sibling"));
            };
            let first = args.first().cloned().unwrap_or(Value::Null);
            let once = f(&[first, Value::Number(1.0)])?;
            f(&[once, Value::Number(1.0)])
        })
        .unwrap();

        // add 1 twice on top of the seed.
        let out = root
            .step("apply_twice", vec![Value::String("add".into())])
            .value(&[n(5.0)])
            .unwrap();
        assert_eq!(out, n(7.0));
    }

    #[test]
    fn step_failures_propagate_unmodified() {
        let root = fixture();
        root.register("explode", |_| Err(ChainError::step("explode", "boom")))
            .unwrap();

        let err = root
            .step("add", vec![n(1.0)])
            .access("explode")
            .value(&[])
            .unwrap_err();
        assert_eq!(
            err,
            ChainError::Step {
                name: "explode".to_string(),
                message: "boom".to_string(),
            }
        );

        // Building the chain alone never runs step functions.
        let chain = root.access("explode").step("add", vec![n(1.0)]);
        assert_eq!(chain.steps().len(), 2);
    }
}
