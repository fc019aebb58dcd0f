use crate::{
    bits::{self, Bits},
    circuit::{Circuit, Context},
    circuit_builder::DefinitionBuilder,
    definition::{CircuitDefinition, Gate},
    diagnostics::DiagnosticSink,
    error::EvalError,
    loader::DefinitionLoader,
};

use super::gates::XOR;

pub const SUM: &str = "SUM";
pub const CARRY: &str = "CARRY";

/// `A xor B xor C`, built from two nested [`XOR`] instances.
pub fn sum() -> CircuitDefinition {
    DefinitionBuilder::new()
        .port("A", 1)
        .port("B", 1)
        .port("C", 1)
        .subcircuit("AB", XOR)
        .subcircuit("ABC", XOR)
        .feed(&["A", "B"], "AB")
        .feed(&["AB", "C"], "ABC")
        .finish("ABC", 0)
}

/// Majority of `A`, `B` and `C`.
pub fn carry() -> CircuitDefinition {
    DefinitionBuilder::new()
        .port("A", 1)
        .port("B", 1)
        .port("C", 1)
        .gate("AB", Gate::And)
        .gate("AC", Gate::And)
        .gate("BC", Gate::And)
        .gate("ANY", Gate::Or)
        .feed(&["A", "B"], "AB")
        .feed(&["A", "C"], "AC")
        .feed(&["B", "C"], "BC")
        .feed(&["AB", "AC", "BC"], "ANY")
        .finish("ANY", 0)
}

/// A flat circuit adding the `A` and `B` input buses.
///
/// Bit `i` of the sum is pin `S<i>`; the circuit's output is the carry out.
pub struct RippleCarryAdder {
    pub bits: usize,
    pub sum: Vec<String>,
    pub cout: String,
    pub definition: CircuitDefinition,
}

impl RippleCarryAdder {
    pub fn new(bits: usize, a: u64, b: u64, cin: bool) -> RippleCarryAdder {
        assert!(bits > 0 && bits <= 64);

        let mut builder = DefinitionBuilder::new();
        builder.bus("A", bits, a).bus("B", bits, b).input("CIN", 0, cin);

        let mut sum = Vec::with_capacity(bits);
        let mut carry = "CIN".to_string();
        for i in 0..bits {
            let s = format!("S{i}");
            let c = format!("C{i}");
            builder.subcircuit(&s, SUM).subcircuit(&c, CARRY);
            for target in [&s, &c] {
                builder
                    .connect(("A", i), (target, 0))
                    .connect(("B", i), (target, 1))
                    .connect((&carry, 0), (target, 2));
            }
            sum.push(s);
            carry = c;
        }
        let definition = builder.finish(&carry, 0);
        RippleCarryAdder {
            bits,
            sum,
            cout: carry,
            definition,
        }
    }

    /// Evaluates every sum bit and the carry out on one instance.
    pub fn evaluate<L, S>(&self, cx: &mut Context<L, S>) -> Result<(u64, bool), EvalError>
    where
        L: DefinitionLoader + ?Sized,
        S: DiagnosticSink,
    {
        let mut circuit = Circuit::new(self.definition.clone());
        let mut sum = Bits::with_capacity(self.bits);
        for pin in &self.sum {
            let bit = circuit.evaluate(pin, cx)?;
            sum.push(bit.first().copied().unwrap_or(false));
        }
        let cout = circuit.output(cx)?;
        Ok((bits::read::<u64>(&sum), cout))
    }
}
