use std::ops::{BitAnd, Shl};

use num_traits::Unsigned;

use crate::bits;
use crate::definition::*;
use crate::error::DefinitionError;

/// Assembles a [`CircuitDefinition`] in code.
#[derive(Clone, Debug, Default)]
pub struct DefinitionBuilder {
    components: Vec<Component>,
    inputs: Vec<InputSignal>,
    connections: Vec<Connection>,
    ports: Vec<Port>,
    output: Option<OutputSpec>,
}

impl DefinitionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gate(&mut self, id: &str, gate: Gate) -> &mut Self {
        self.components.push(Component::new(id, gate));
        self
    }

    pub fn subcircuit(&mut self, id: &str, type_name: &str) -> &mut Self {
        self.components.push(Component::new(id, type_name));
        self
    }

    pub fn input(&mut self, name: &str, index: usize, value: bool) -> &mut Self {
        self.inputs.push(InputSignal::new(name, index, value));
        self
    }

    /// Declares `width` input bits of `name` holding the lowest bits of `val`.
    pub fn bus<T>(&mut self, name: &str, width: usize, val: T) -> &mut Self
    where
        T: Unsigned + Copy + BitAnd<T, Output = T> + Shl<usize, Output = T>,
    {
        for (index, value) in bits::from_uint(val, width).into_iter().enumerate() {
            self.input(name, index, value);
        }
        self
    }

    /// Connects bit `from.1` of pin `from.0` to bit `to.1` of component `to.0`.
    pub fn connect(&mut self, from: (&str, usize), to: (&str, usize)) -> &mut Self {
        self.connections
            .push(Connection::new(from.0, from.1, to.0, to.1));
        self
    }

    /// Connects bit 0 of each source to consecutive bits of `to`.
    pub fn feed(&mut self, sources: &[&str], to: &str) -> &mut Self {
        for (index, source) in sources.iter().enumerate() {
            self.connect((*source, 0), (to, index));
        }
        self
    }

    pub fn port(&mut self, name: &str, width: usize) -> &mut Self {
        self.ports.push(Port::new(name, width));
        self
    }

    pub fn output(&mut self, pin: &str, index: usize) -> &mut Self {
        self.output = Some(OutputSpec::new(pin, index));
        self
    }

    pub fn build(&self) -> Result<CircuitDefinition, DefinitionError> {
        let output = self.output.clone().ok_or(DefinitionError::MissingOutput)?;
        Ok(self.definition(output))
    }

    /// Declares the output and builds.
    pub fn finish(&mut self, pin: &str, index: usize) -> CircuitDefinition {
        self.output(pin, index);
        self.definition(OutputSpec::new(pin, index))
    }

    fn definition(&self, output: OutputSpec) -> CircuitDefinition {
        CircuitDefinition {
            components: self.components.clone(),
            inputs: self.inputs.clone(),
            connections: self.connections.clone(),
            ports: self.ports.clone(),
            output,
        }
    }
}
