use std::collections::HashMap;

use crate::bits::{set_bit, Bits};
use crate::definition::*;
use crate::diagnostics::DiagnosticSink;
use crate::error::{EvalError, LoadError};
use crate::loader::DefinitionLoader;

/// How much of a subcircuit is evaluated when it is instantiated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubcircuitMode {
    /// Only the dependency closure of the subcircuit's output.
    #[default]
    OutputClosure,
    /// Every component in declaration order, then the output. Unreferenced
    /// components still emit their diagnostics.
    AllComponents,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalOptions {
    pub subcircuit_mode: SubcircuitMode,
    /// Largest number of input bits [`truth_table`](crate::truth_table::truth_table) sweeps.
    pub max_sweep_bits: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            subcircuit_mode: SubcircuitMode::default(),
            max_sweep_bits: 16,
        }
    }
}

/// State shared by a circuit instance and every subcircuit instance it creates.
pub struct Context<'a, L: ?Sized, S> {
    loader: &'a L,
    pub sink: S,
    pub options: EvalOptions,
    // Subcircuit types currently being expanded, outermost first.
    expanding: Vec<String>,
}

impl<'a, L, S> Context<'a, L, S>
where
    L: DefinitionLoader + ?Sized,
    S: DiagnosticSink,
{
    pub fn new(loader: &'a L, sink: S) -> Self {
        Self {
            loader,
            sink,
            options: EvalOptions::default(),
            expanding: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: EvalOptions) -> Self {
        self.options = options;
        self
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// One circuit instance: a definition plus its private evaluation cache.
///
/// Every pin is derived at most once per instance. Subcircuit instances get
/// their own `Circuit`, which is dropped once their output is extracted.
#[derive(Debug)]
pub struct Circuit {
    definition: CircuitDefinition,
    cache: HashMap<String, Bits>,
    resolving: Vec<String>,
}

impl Circuit {
    pub fn new(definition: CircuitDefinition) -> Self {
        Self {
            definition,
            cache: HashMap::new(),
            resolving: Vec::new(),
        }
    }

    pub fn cached(&self, id: &str) -> Option<&Bits> {
        self.cache.get(id)
    }

    /// Resolves the bit-vector of pin `id`.
    ///
    /// A component's working input vector is assembled from its incoming
    /// connections in declaration order, then input records naming the
    /// component are overlaid; later writes to the same bit win. An `id` that
    /// is not a component resolves to its declared input records, and an `id`
    /// with neither degrades to `[false]` after reporting it to the sink.
    pub fn evaluate<L, S>(&mut self, id: &str, cx: &mut Context<L, S>) -> Result<Bits, EvalError>
    where
        L: DefinitionLoader + ?Sized,
        S: DiagnosticSink,
    {
        if let Some(bits) = self.cache.get(id) {
            return Ok(bits.clone());
        }
        if self.resolving.iter().any(|pin| pin == id) {
            let mut path = self.resolving.clone();
            path.push(id.to_string());
            return Err(EvalError::CyclicDependency { path });
        }

        self.resolving.push(id.to_string());
        let result = self.derive(id, cx);
        self.resolving.pop();
        let bits = result?;

        cx.sink.pin_evaluated(id, &bits);
        self.cache.insert(id.to_string(), bits.clone());
        Ok(bits)
    }

    /// The bit selected by the definition's output spec, `false` when the
    /// output vector is shorter than the requested index.
    pub fn output<L, S>(&mut self, cx: &mut Context<L, S>) -> Result<bool, EvalError>
    where
        L: DefinitionLoader + ?Sized,
        S: DiagnosticSink,
    {
        let OutputSpec { pin, index } = self.definition.output.clone();
        let bits = self.evaluate(&pin, cx)?;
        Ok(bits.get(index).copied().unwrap_or(false))
    }

    fn derive<L, S>(&mut self, id: &str, cx: &mut Context<L, S>) -> Result<Bits, EvalError>
    where
        L: DefinitionLoader + ?Sized,
        S: DiagnosticSink,
    {
        let kind = match self.definition.component(id) {
            Some(component) => component.kind.clone(),
            None => {
                let mut bits = Bits::new();
                if !self.overlay_inputs(id, &mut bits) {
                    cx.sink.unresolved_reference(id, &cx.expanding);
                    bits.push(false);
                }
                return Ok(bits);
            }
        };

        let mut working = self.connected_inputs(id, cx)?;
        self.overlay_inputs(id, &mut working);

        match kind {
            ComponentKind::Gate(gate) => Ok(vec![gate.apply(&working)]),
            ComponentKind::Subcircuit(type_name) => instantiate(id, &type_name, &working, cx),
        }
    }

    fn connected_inputs<L, S>(&mut self, id: &str, cx: &mut Context<L, S>) -> Result<Bits, EvalError>
    where
        L: DefinitionLoader + ?Sized,
        S: DiagnosticSink,
    {
        let upstream: Vec<Connection> = self
            .definition
            .connections
            .iter()
            .filter(|connection| connection.to == id)
            .cloned()
            .collect();
        let mut working = Bits::new();
        for connection in upstream {
            let source = self.evaluate(&connection.from, cx)?;
            // A source bit past the end of the source vector leaves the slot untouched.
            if let Some(&bit) = source.get(connection.from_index) {
                set_bit(&mut working, connection.to_index, bit);
            }
        }
        Ok(working)
    }

    /// Writes every input record named `id` into `bits`. Returns whether any existed.
    fn overlay_inputs(&self, id: &str, bits: &mut Bits) -> bool {
        let mut found = false;
        for input in self.definition.inputs.iter().filter(|input| input.name == id) {
            set_bit(bits, input.index, input.value);
            found = true;
        }
        found
    }

    /// Turns the parent's working vector into input records of this instance.
    ///
    /// Without declared ports every bit becomes an input named after the parent
    /// component. With ports, bits are handed out to them in order and missing
    /// bits read as `false`.
    fn inject(&mut self, component: &str, bits: &[bool]) {
        let width = self.definition.port_width();
        let CircuitDefinition { inputs, ports, .. } = &mut self.definition;
        if ports.is_empty() {
            inputs.extend(
                bits.iter()
                    .enumerate()
                    .map(|(index, &value)| InputSignal::new(component, index, value)),
            );
            return;
        }

        let mut offset = 0;
        for port in ports.iter() {
            for index in 0..port.width {
                let value = bits.get(offset + index).copied().unwrap_or(false);
                inputs.push(InputSignal::new(port.name.clone(), index, value));
            }
            offset += port.width;
        }
        if bits.len() > width {
            log::warn!(
                "`{component}` drives {} bits into {width} port bits, the rest are dropped",
                bits.len()
            );
        }
    }

    fn settle<L, S>(&mut self, cx: &mut Context<L, S>) -> Result<Bits, EvalError>
    where
        L: DefinitionLoader + ?Sized,
        S: DiagnosticSink,
    {
        if cx.options.subcircuit_mode == SubcircuitMode::AllComponents {
            let ids: Vec<String> = self
                .definition
                .components
                .iter()
                .map(|component| component.id.clone())
                .collect();
            for id in &ids {
                self.evaluate(id, cx)?;
            }
        }
        let pin = self.definition.output.pin.clone();
        self.evaluate(&pin, cx)
    }
}

fn instantiate<L, S>(
    component: &str,
    type_name: &str,
    working: &[bool],
    cx: &mut Context<L, S>,
) -> Result<Bits, EvalError>
where
    L: DefinitionLoader + ?Sized,
    S: DiagnosticSink,
{
    if cx.expanding.iter().any(|expanding| expanding == type_name) {
        let mut chain = cx.expanding.clone();
        chain.push(type_name.to_string());
        return Err(EvalError::RecursiveSubcircuit { chain });
    }

    let definition = cx.loader.load(type_name).map_err(|source| match source {
        LoadError::NotFound(_) => EvalError::MissingSubcircuitDefinition {
            component: component.to_string(),
            type_name: type_name.to_string(),
        },
        source => EvalError::DefinitionLoad {
            component: component.to_string(),
            type_name: type_name.to_string(),
            source,
        },
    })?;
    cx.sink.subcircuit_loaded(type_name);

    let mut instance = Circuit::new(definition);
    instance.inject(component, working);

    cx.expanding.push(type_name.to_string());
    let result = instance.settle(cx);
    cx.expanding.pop();
    result
}

/// Evaluates a fresh instance of `definition` and returns its output bit.
pub fn evaluate_output<L, S>(
    definition: CircuitDefinition,
    cx: &mut Context<L, S>,
) -> Result<bool, EvalError>
where
    L: DefinitionLoader + ?Sized,
    S: DiagnosticSink,
{
    Circuit::new(definition).output(cx)
}

#[cfg(test)]
mod test {
    use std::cell::Cell;

    use super::*;
    use crate::diagnostics::{NoDiagnostics, Recorder};
    use crate::loader::MemoryLoader;
    use crate::parser::parse_definition;

    fn circuit(text: &str) -> Circuit {
        Circuit::new(parse_definition(text).unwrap())
    }

    fn empty() -> MemoryLoader {
        MemoryLoader::new()
    }

    /// Counts how often each definition is requested.
    struct CountingLoader {
        inner: MemoryLoader,
        loads: Cell<usize>,
    }

    impl DefinitionLoader for CountingLoader {
        fn load(&self, type_name: &str) -> Result<CircuitDefinition, LoadError> {
            self.loads.set(self.loads.get() + 1);
            self.inner.load(type_name)
        }
    }

    fn not_box() -> CircuitDefinition {
        parse_definition(
            "\
comp id=INV type=NOT
connect from=N1 findex=0 to=INV tindex=0
Out put=INV kndex=0
",
        )
        .unwrap()
    }

    #[test]
    fn gate_identities() {
        let loader = empty();
        let mut cx = Context::new(&loader, NoDiagnostics);
        let mut c = circuit(
            "\
comp id=A0 type=AND
comp id=O0 type=OR
comp id=N0 type=NOT
comp id=A3 type=AND
comp id=O3 type=OR
input name=A3 index=0 value=1
input name=A3 index=1 value=1
input name=A3 index=2 value=0
input name=O3 index=0 value=0
input name=O3 index=1 value=0
input name=O3 index=2 value=1
Out put=A0 kndex=0
",
        );
        assert_eq!(c.evaluate("A0", &mut cx).unwrap(), vec![true]);
        assert_eq!(c.evaluate("O0", &mut cx).unwrap(), vec![false]);
        assert_eq!(c.evaluate("N0", &mut cx).unwrap(), vec![true]);
        assert_eq!(c.evaluate("A3", &mut cx).unwrap(), vec![false]);
        assert_eq!(c.evaluate("O3", &mut cx).unwrap(), vec![true]);
    }

    #[test]
    fn multi_bit_input_assembly() {
        let loader = empty();
        let mut cx = Context::new(&loader, NoDiagnostics);
        let mut c = circuit(
            "\
input name=A index=1 value=1
input name=A index=0 value=0
input name=B index=3 value=1
Out put=A kndex=1
",
        );
        assert_eq!(c.evaluate("A", &mut cx).unwrap(), vec![false, true]);
        assert_eq!(c.evaluate("B", &mut cx).unwrap(), vec![false, false, false, true]);
        assert!(c.output(&mut cx).unwrap());
    }

    #[test]
    fn end_to_end_and() {
        let loader = empty();
        for (second, expected) in [(true, true), (false, false)] {
            let mut cx = Context::new(&loader, NoDiagnostics);
            let definition = parse_definition(&format!(
                "\
comp id=G1 type=AND
input name=G1 index=0 value=1
input name=G1 index=1 value={}
Out put=G1 kndex=0
",
                second as u8
            ))
            .unwrap();
            assert_eq!(evaluate_output(definition, &mut cx).unwrap(), expected);
        }
    }

    #[test]
    fn output_index_past_end_is_false() {
        let loader = empty();
        let mut cx = Context::new(&loader, NoDiagnostics);
        let mut c = circuit("comp id=G1 type=NOT\nOut put=G1 kndex=3\n");
        assert!(!c.output(&mut cx).unwrap());
        assert_eq!(c.cached("G1"), Some(&vec![true]));
    }

    #[test]
    fn memoization() {
        let loader = empty();
        let mut cx = Context::new(&loader, Recorder::default());
        let mut c = circuit(
            "\
comp id=SHARED type=NOT
comp id=L type=OR
comp id=R type=AND
comp id=TOP type=AND
input name=X index=0 value=0
connect from=X findex=0 to=SHARED tindex=0
connect from=SHARED findex=0 to=L tindex=0
connect from=SHARED findex=0 to=R tindex=0
connect from=L findex=0 to=TOP tindex=0
connect from=R findex=0 to=TOP tindex=1
Out put=TOP kndex=0
",
        );
        assert!(c.output(&mut cx).unwrap());
        assert_eq!(c.evaluate("SHARED", &mut cx).unwrap(), vec![true]);
        let recorder = cx.into_sink();
        assert_eq!(recorder.evaluations_of("SHARED"), 1);
        assert_eq!(recorder.evaluations_of("X"), 1);
        assert_eq!(recorder.evaluations_of("TOP"), 1);
    }

    #[test]
    fn connection_order_and_overlay() {
        let loader = empty();
        let mut cx = Context::new(&loader, NoDiagnostics);
        // OR sees slot 0 written by ONE, overwritten by ZERO, then by the input record.
        let mut c = circuit(
            "\
comp id=ONE type=NOT
comp id=ZERO type=OR
comp id=G type=OR
connect from=ONE findex=0 to=G tindex=0
connect from=ZERO findex=0 to=G tindex=0
Out put=G kndex=0
",
        );
        assert!(!c.output(&mut cx).unwrap());

        let mut c = circuit(
            "\
comp id=ZERO type=OR
comp id=G type=OR
connect from=ZERO findex=0 to=G tindex=0
input name=G index=0 value=1
Out put=G kndex=0
",
        );
        assert!(c.output(&mut cx).unwrap());

        let mut c = circuit(
            "\
comp id=ONE type=NOT
comp id=G type=AND
input name=G index=0 value=0
connect from=ONE findex=0 to=G tindex=0
Out put=G kndex=0
",
        );
        assert!(!c.output(&mut cx).unwrap(), "input overlay wins over connections");
    }

    #[test]
    fn source_index_past_end_is_skipped() {
        let loader = empty();
        let mut cx = Context::new(&loader, NoDiagnostics);
        let mut c = circuit(
            "\
comp id=ONE type=NOT
comp id=G type=AND
connect from=ONE findex=1 to=G tindex=4
Out put=G kndex=0
",
        );
        // Nothing lands in the working vector, so the AND is vacuously true.
        assert!(c.output(&mut cx).unwrap());
    }

    #[test]
    fn dangling_reference_containment() {
        let loader = empty();
        let mut cx = Context::new(&loader, Recorder::default());
        let mut c = circuit(
            "\
comp id=G type=OR
comp id=H type=AND
input name=X index=0 value=1
connect from=GHOST findex=0 to=G tindex=0
connect from=X findex=0 to=G tindex=1
connect from=GHOST findex=0 to=H tindex=0
Out put=G kndex=0
",
        );
        assert_eq!(c.evaluate("GHOST", &mut cx).unwrap(), vec![false]);
        assert!(c.output(&mut cx).unwrap());
        assert_eq!(c.evaluate("H", &mut cx).unwrap(), vec![false]);
        assert_eq!(cx.sink.unresolved, vec!["GHOST".to_string()]);
    }

    #[test]
    fn cyclic_dependency() {
        let loader = empty();
        let mut cx = Context::new(&loader, NoDiagnostics);
        let mut c = circuit(
            "\
comp id=G1 type=AND
comp id=G2 type=OR
connect from=G2 findex=0 to=G1 tindex=0
connect from=G1 findex=0 to=G2 tindex=0
Out put=G1 kndex=0
",
        );
        match c.output(&mut cx) {
            Err(EvalError::CyclicDependency { path }) => assert_eq!(path, ["G1", "G2", "G1"]),
            other => panic!("expected a cycle, got {other:?}"),
        }
        assert!(c.cached("G1").is_none());

        let mut c = circuit(
            "comp id=L type=NOT\nconnect from=L findex=0 to=L tindex=0\nOut put=L kndex=0\n",
        );
        assert!(matches!(c.output(&mut cx), Err(EvalError::CyclicDependency { .. })));
    }

    #[test]
    fn subcircuit_round_trip() {
        let loader = empty().with("NotBox", not_box());
        let mut cx = Context::new(&loader, Recorder::default());
        let mut c = circuit(
            "\
comp id=N1 type=NotBox
input name=X index=0 value=1
connect from=X findex=0 to=N1 tindex=0
Out put=N1 kndex=0
",
        );
        assert_eq!(c.evaluate("N1", &mut cx).unwrap(), vec![false]);
        assert!(!c.output(&mut cx).unwrap());
        assert_eq!(cx.sink.loads, vec!["NotBox".to_string()]);
        assert!(c.cached("INV").is_none(), "subcircuit cache is private");
    }

    #[test]
    fn sibling_instances_are_independent() {
        let loader = CountingLoader {
            inner: empty().with(
                "NotBox",
                parse_definition(
                    "\
port name=IN
comp id=INV type=NOT
connect from=IN findex=0 to=INV tindex=0
Out put=INV kndex=0
",
                )
                .unwrap(),
            ),
            loads: Cell::new(0),
        };
        let mut cx = Context::new(&loader, NoDiagnostics);
        let mut c = circuit(
            "\
comp id=P type=NotBox
comp id=Q type=NotBox
comp id=R type=NotBox
input name=HI index=0 value=1
input name=LO index=0 value=0
connect from=HI findex=0 to=P tindex=0
connect from=LO findex=0 to=Q tindex=0
connect from=HI findex=0 to=R tindex=0
Out put=P kndex=0
",
        );
        assert_eq!(c.evaluate("P", &mut cx).unwrap(), vec![false]);
        assert_eq!(c.evaluate("Q", &mut cx).unwrap(), vec![true]);
        assert_eq!(c.evaluate("R", &mut cx).unwrap(), vec![false]);
        assert_eq!(c.evaluate("P", &mut cx).unwrap(), vec![false]);
        assert_eq!(loader.loads.get(), 3);
    }

    #[test]
    fn ports_slice_the_working_vector() {
        let pick = parse_definition(
            "\
port name=A
port name=B width=2
Out put=B kndex=0
",
        )
        .unwrap();
        let loader = empty().with("Pick", pick);
        let mut cx = Context::new(&loader, NoDiagnostics);
        let mut c = circuit(
            "\
comp id=P type=Pick
input name=X index=0 value=1
input name=X index=1 value=0
input name=X index=2 value=1
connect from=X findex=0 to=P tindex=0
connect from=X findex=1 to=P tindex=1
connect from=X findex=2 to=P tindex=2
Out put=P kndex=1
",
        );
        assert_eq!(c.evaluate("P", &mut cx).unwrap(), vec![false, true]);

        // Unconnected port slots read as false.
        let mut c = circuit("comp id=P type=Pick\nOut put=P kndex=0\n");
        assert_eq!(c.evaluate("P", &mut cx).unwrap(), vec![false, false]);

        // Bits past the declared port width are dropped.
        let mut c = circuit(
            "\
comp id=P type=Pick
input name=P index=0 value=1
input name=P index=1 value=0
input name=P index=2 value=1
input name=P index=3 value=1
Out put=P kndex=0
",
        );
        assert_eq!(c.evaluate("P", &mut cx).unwrap(), vec![false, true]);
    }

    #[test]
    fn missing_subcircuit_is_a_hard_error() {
        let loader = empty();
        let mut cx = Context::new(&loader, NoDiagnostics);
        let mut c = circuit(
            "\
comp id=G type=OR
comp id=M type=Nowhere
input name=X index=0 value=1
connect from=X findex=0 to=G tindex=0
connect from=M findex=0 to=G tindex=1
Out put=G kndex=0
",
        );
        let err = c.output(&mut cx).unwrap_err();
        assert!(err.is_missing_definition());
        match err {
            EvalError::MissingSubcircuitDefinition {
                component,
                type_name,
            } => {
                assert_eq!(component, "M");
                assert_eq!(type_name, "Nowhere");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn recursive_subcircuit() {
        let looped = parse_definition("comp id=L type=Loop\nOut put=L kndex=0\n").unwrap();
        let loader = empty().with("Loop", looped);
        let mut cx = Context::new(&loader, NoDiagnostics);
        let mut c = circuit("comp id=TOP type=Loop\nOut put=TOP kndex=0\n");
        match c.output(&mut cx) {
            Err(EvalError::RecursiveSubcircuit { chain }) => assert_eq!(chain, ["Loop", "Loop"]),
            other => panic!("expected recursion, got {other:?}"),
        }
    }

    #[test]
    fn subcircuit_modes() {
        let noisy = parse_definition(
            "\
port name=IN
comp id=INV type=NOT
comp id=STRAY type=OR
connect from=IN findex=0 to=INV tindex=0
connect from=GHOST findex=0 to=STRAY tindex=0
Out put=INV kndex=0
",
        )
        .unwrap();
        let loader = empty().with("Noisy", noisy);
        let parent = "\
comp id=N type=Noisy
Out put=N kndex=0
";

        let mut cx = Context::new(&loader, Recorder::default());
        assert!(circuit(parent).output(&mut cx).unwrap());
        assert!(cx.sink.unresolved.is_empty());
        assert_eq!(cx.sink.evaluations_of("STRAY"), 0);

        let options = EvalOptions {
            subcircuit_mode: SubcircuitMode::AllComponents,
            ..Default::default()
        };
        let mut cx = Context::new(&loader, Recorder::default()).with_options(options);
        assert!(circuit(parent).output(&mut cx).unwrap());
        assert_eq!(cx.sink.unresolved, vec!["GHOST".to_string()]);
        assert_eq!(cx.sink.evaluations_of("STRAY"), 1);
        assert_eq!(cx.sink.evaluations_of("INV"), 1);
    }
}
