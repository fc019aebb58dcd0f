use std::fmt;

use crate::bits;
use crate::circuit::{Circuit, Context};
use crate::definition::CircuitDefinition;
use crate::diagnostics::DiagnosticSink;
use crate::error::EvalError;
use crate::loader::DefinitionLoader;

/// Hard ceiling on swept input bits, applied on top of
/// [`EvalOptions::max_sweep_bits`](crate::circuit::EvalOptions::max_sweep_bits).
pub const MAX_SWEEP_BITS: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    /// One value per entry of [`TruthTable::inputs`].
    pub inputs: Vec<bool>,
    pub output: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TruthTable {
    /// Distinct `(name, index)` input bits in declaration order.
    pub inputs: Vec<(String, usize)>,
    pub rows: Vec<Row>,
}

impl TruthTable {
    /// Output of the row whose inputs equal the lowest bits of `assignment`.
    pub fn output_for(&self, assignment: u64) -> Option<bool> {
        self.rows.get(assignment as usize).map(|row| row.output)
    }
}

impl fmt::Display for TruthTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header: Vec<String> = self
            .inputs
            .iter()
            .map(|(name, index)| format!("{name}[{index}]"))
            .collect();
        writeln!(f, "{} | out", header.join(" "))?;
        for row in &self.rows {
            let cells: Vec<String> = header
                .iter()
                .zip(bits::format(&row.inputs).chars())
                .map(|(name, bit)| format!("{bit:>width$}", width = name.len()))
                .collect();
            writeln!(f, "{} | {}", cells.join(" "), row.output as u8)?;
        }
        Ok(())
    }
}

/// Evaluates the output for every assignment of the declared input bits.
///
/// Row `n` assigns bit `i` of `n` to the `i`-th input slot. Duplicate records
/// for the same slot all receive the row's value. Each row is evaluated on a
/// fresh instance.
pub fn truth_table<L, S>(
    definition: &CircuitDefinition,
    cx: &mut Context<L, S>,
) -> Result<TruthTable, EvalError>
where
    L: DefinitionLoader + ?Sized,
    S: DiagnosticSink,
{
    let mut inputs: Vec<(String, usize)> = Vec::new();
    let slots: Vec<usize> = definition
        .inputs
        .iter()
        .map(|input| {
            let key = (input.name.clone(), input.index);
            match inputs.iter().position(|slot| *slot == key) {
                Some(slot) => slot,
                None => {
                    inputs.push(key);
                    inputs.len() - 1
                }
            }
        })
        .collect();

    let max = cx.options.max_sweep_bits.min(MAX_SWEEP_BITS);
    if inputs.len() > max {
        return Err(EvalError::SweepTooLarge {
            bits: inputs.len(),
            max,
        });
    }

    let mut rows = Vec::with_capacity(1 << inputs.len());
    for assignment in 0..(1u64 << inputs.len()) {
        let values = bits::from_uint(assignment, inputs.len());
        let mut row_definition = definition.clone();
        for (input, &slot) in row_definition.inputs.iter_mut().zip(&slots) {
            input.value = values[slot];
        }
        let output = Circuit::new(row_definition).output(cx)?;
        rows.push(Row {
            inputs: values,
            output,
        });
    }
    Ok(TruthTable { inputs, rows })
}
