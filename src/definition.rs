use std::fmt;

use crate::error::DefinitionError;

/// A primitive gate, evaluated by direct reduction over its input bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gate {
    And,
    Or,
    Not,
}

impl Gate {
    /// Reduces the working input vector to the gate's single output bit.
    ///
    /// An empty `AND` is true, an empty `OR` is false and an unconnected `NOT`
    /// negates an implicit `false`.
    pub fn apply(self, inputs: &[bool]) -> bool {
        match self {
            Gate::And => inputs.iter().all(|&bit| bit),
            Gate::Or => inputs.iter().any(|&bit| bit),
            Gate::Not => !inputs.first().copied().unwrap_or(false),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Gate::And => "AND",
            Gate::Or => "OR",
            Gate::Not => "NOT",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Gate(Gate),
    /// Any kind that is not a primitive gate names an externally defined circuit.
    Subcircuit(String),
}

impl From<&str> for ComponentKind {
    fn from(kind: &str) -> Self {
        match kind {
            "AND" => ComponentKind::Gate(Gate::And),
            "OR" => ComponentKind::Gate(Gate::Or),
            "NOT" => ComponentKind::Gate(Gate::Not),
            other => ComponentKind::Subcircuit(other.to_string()),
        }
    }
}

impl From<Gate> for ComponentKind {
    fn from(gate: Gate) -> Self {
        ComponentKind::Gate(gate)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Gate(gate) => f.write_str(gate.name()),
            ComponentKind::Subcircuit(type_name) => f.write_str(type_name),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Component {
    pub id: String,
    pub kind: ComponentKind,
}

impl Component {
    pub fn new(id: impl Into<String>, kind: impl Into<ComponentKind>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
        }
    }
}

/// One bit of a declared input signal. Records sharing a name form one
/// multi-bit signal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputSignal {
    pub name: String,
    pub index: usize,
    pub value: bool,
}

impl InputSignal {
    pub fn new(name: impl Into<String>, index: usize, value: bool) -> Self {
        Self {
            name: name.into(),
            index,
            value,
        }
    }
}

/// Carries bit `from_index` of the `from` pin into bit `to_index` of the
/// working input vector of component `to`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    pub from: String,
    pub from_index: usize,
    pub to: String,
    pub to_index: usize,
}

impl Connection {
    pub fn new(
        from: impl Into<String>,
        from_index: usize,
        to: impl Into<String>,
        to_index: usize,
    ) -> Self {
        Self {
            from: from.into(),
            from_index,
            to: to.into(),
            to_index,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputSpec {
    pub pin: String,
    pub index: usize,
}

impl OutputSpec {
    pub fn new(pin: impl Into<String>, index: usize) -> Self {
        Self {
            pin: pin.into(),
            index,
        }
    }
}

/// An externally supplied input of a subcircuit definition.
///
/// A parent's working vector is sliced across a definition's ports in
/// declaration order, `width` bits per port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Port {
    pub name: String,
    pub width: usize,
}

impl Port {
    pub fn new(name: impl Into<String>, width: usize) -> Self {
        Self {
            name: name.into(),
            width,
        }
    }
}

/// A single parsed line of a circuit description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Record {
    Component(Component),
    Input(InputSignal),
    Connection(Connection),
    Output(OutputSpec),
    Port(Port),
    Ignored,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CircuitDefinition {
    pub components: Vec<Component>,
    pub inputs: Vec<InputSignal>,
    pub connections: Vec<Connection>,
    pub ports: Vec<Port>,
    pub output: OutputSpec,
}

impl CircuitDefinition {
    /// Collects records in order. When several `Out` records are present the
    /// last one wins.
    pub fn from_records<I>(records: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = Record>,
    {
        let mut components = Vec::new();
        let mut inputs = Vec::new();
        let mut connections = Vec::new();
        let mut ports = Vec::new();
        let mut output = None;
        for record in records {
            match record {
                Record::Component(component) => components.push(component),
                Record::Input(input) => inputs.push(input),
                Record::Connection(connection) => connections.push(connection),
                Record::Port(port) => ports.push(port),
                Record::Output(spec) => output = Some(spec),
                Record::Ignored => (),
            }
        }
        Ok(Self {
            components,
            inputs,
            connections,
            ports,
            output: output.ok_or(DefinitionError::MissingOutput)?,
        })
    }

    /// First component declared with `id`.
    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|component| component.id == id)
    }

    /// Total number of bits the ports accept.
    pub fn port_width(&self) -> usize {
        self.ports.iter().map(|port| port.width).sum()
    }
}

/// Writes the definition back in the text format accepted by
/// [`parse_definition`](crate::parser::parse_definition).
impl fmt::Display for CircuitDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for port in &self.ports {
            writeln!(f, "port name={} width={}", port.name, port.width)?;
        }
        for component in &self.components {
            writeln!(f, "comp id={} type={}", component.id, component.kind)?;
        }
        for input in &self.inputs {
            writeln!(
                f,
                "input name={} index={} value={}",
                input.name, input.index, input.value as u8
            )?;
        }
        for connection in &self.connections {
            writeln!(
                f,
                "connect from={} findex={} to={} tindex={}",
                connection.from, connection.from_index, connection.to, connection.to_index
            )?;
        }
        writeln!(f, "Out put={} kndex={}", self.output.pin, self.output.index)
    }
}
