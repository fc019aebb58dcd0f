use crate::circuit_builder::DefinitionBuilder;
use crate::definition::{CircuitDefinition, Gate};

pub const XOR: &str = "XOR";

/// `(A OR B) AND NOT (A AND B)` over ports `A` and `B`.
pub fn xor() -> CircuitDefinition {
    DefinitionBuilder::new()
        .port("A", 1)
        .port("B", 1)
        .gate("ANY", Gate::Or)
        .gate("BOTH", Gate::And)
        .gate("NOT_BOTH", Gate::Not)
        .gate("OUT", Gate::And)
        .feed(&["A", "B"], "ANY")
        .feed(&["A", "B"], "BOTH")
        .feed(&["BOTH"], "NOT_BOTH")
        .feed(&["ANY", "NOT_BOTH"], "OUT")
        .finish("OUT", 0)
}

#[cfg(test)]
mod test {
    use crate::{
        circuit::{evaluate_output, Context},
        circuit_builder::DefinitionBuilder,
        components::library,
        diagnostics::Recorder,
    };

    use super::XOR;

    #[test]
    fn xor_tests() {
        let loader = library();
        let expecteds = [(false, false), (false, true), (true, false), (true, true)]
            .into_iter()
            .zip([false, true, true, false]);
        for ((a, b), expected) in expecteds {
            let definition = DefinitionBuilder::new()
                .subcircuit("X", XOR)
                .input("IN", 0, a)
                .input("IN", 1, b)
                .connect(("IN", 0), ("X", 0))
                .connect(("IN", 1), ("X", 1))
                .output("X", 0)
                .build()
                .unwrap();
            let mut cx = Context::new(&loader, Recorder::default());
            let result = evaluate_output(definition, &mut cx).unwrap();
            assert_eq!(result, expected, "{a} xor {b} = {expected}");
            assert!(cx.sink.unresolved.is_empty());
        }
    }
}
