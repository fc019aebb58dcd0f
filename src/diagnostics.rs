use std::collections::BTreeMap;

use crate::bits;

/// Observes an evaluation. Every hook defaults to doing nothing.
pub trait DiagnosticSink {
    /// `id` matched no input and no component. `path` lists the subcircuit
    /// types enclosing the instance, outermost first.
    fn unresolved_reference(&mut self, _id: &str, _path: &[String]) {}

    /// Called once per pin and instance, after the pin was derived. Cache hits
    /// are not reported.
    fn pin_evaluated(&mut self, _id: &str, _bits: &[bool]) {}

    fn subcircuit_loaded(&mut self, _type_name: &str) {}
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn unresolved_reference(&mut self, id: &str, path: &[String]) {
        (**self).unresolved_reference(id, path)
    }

    fn pin_evaluated(&mut self, id: &str, bits: &[bool]) {
        (**self).pin_evaluated(id, bits)
    }

    fn subcircuit_loaded(&mut self, type_name: &str) {
        (**self).subcircuit_loaded(type_name)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoDiagnostics;
impl DiagnosticSink for NoDiagnostics {}

/// Forwards diagnostics to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDiagnostics;

impl DiagnosticSink for LogDiagnostics {
    fn unresolved_reference(&mut self, id: &str, path: &[String]) {
        if path.is_empty() {
            log::warn!("Component not found: {id}");
        } else {
            log::warn!("Component not found: {id} (in {})", path.join("/"));
        }
    }

    fn pin_evaluated(&mut self, id: &str, bits: &[bool]) {
        log::trace!("{id} = {}", bits::format(bits));
    }

    fn subcircuit_loaded(&mut self, type_name: &str) {
        log::debug!("instantiating subcircuit `{type_name}`");
    }
}

/// Records everything it is told.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    pub unresolved: Vec<String>,
    pub evaluations: BTreeMap<String, usize>,
    pub loads: Vec<String>,
}

impl Recorder {
    /// How many times `id` was derived, summed over all instances.
    pub fn evaluations_of(&self, id: &str) -> usize {
        self.evaluations.get(id).copied().unwrap_or(0)
    }
}

impl DiagnosticSink for Recorder {
    fn unresolved_reference(&mut self, id: &str, _path: &[String]) {
        self.unresolved.push(id.to_string());
    }

    fn pin_evaluated(&mut self, id: &str, _bits: &[bool]) {
        *self.evaluations.entry(id.to_string()).or_default() += 1;
    }

    fn subcircuit_loaded(&mut self, type_name: &str) {
        self.loads.push(type_name.to_string());
    }
}
