use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};

use digieval::{
    diagnostics::{DiagnosticSink, LogDiagnostics, Recorder},
    loader::DirectoryLoader,
    parser::parse_definition,
    truth_table::truth_table,
    definition::OutputSpec,
    Circuit, CircuitDefinition, Context, EvalOptions, SubcircuitMode,
};

#[derive(Parser)]
#[command(name = "digieval")]
#[command(about = "Evaluate hierarchical combinational logic circuits")]
struct Cli {
    /// Directory holding subcircuit definitions
    #[arg(long, global = true, default_value = "components")]
    components: PathBuf,

    /// File extension of subcircuit definitions
    #[arg(long, global = true, default_value = "txt")]
    extension: String,

    /// Evaluate every component of a subcircuit, not only those its output depends on
    #[arg(long, global = true)]
    all_components: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the circuit's output bit
    Run {
        /// Circuit definition file
        file: PathBuf,
    },
    /// Parse a definition and print it normalized
    Check { file: PathBuf },
    /// Print the output for every assignment of the declared inputs
    Table {
        file: PathBuf,
        /// Largest number of input bits to sweep
        #[arg(long, default_value_t = 16)]
        max_bits: usize,
    },
    /// Store a definition in the components directory under a type name
    Save {
        file: PathBuf,
        #[arg(long = "as")]
        type_name: String,
    },
}

/// Logs like [`LogDiagnostics`] and keeps a [`Recorder`] for the summary.
#[derive(Default)]
struct CliDiagnostics {
    log: LogDiagnostics,
    recorder: Recorder,
}

impl DiagnosticSink for CliDiagnostics {
    fn unresolved_reference(&mut self, id: &str, path: &[String]) {
        self.log.unresolved_reference(id, path);
        self.recorder.unresolved_reference(id, path);
    }

    fn pin_evaluated(&mut self, id: &str, bits: &[bool]) {
        self.log.pin_evaluated(id, bits);
    }

    fn subcircuit_loaded(&mut self, type_name: &str) {
        self.log.subcircuit_loaded(type_name);
        self.recorder.subcircuit_loaded(type_name);
    }
}

impl Cli {
    fn options(&self) -> EvalOptions {
        EvalOptions {
            subcircuit_mode: if self.all_components {
                SubcircuitMode::AllComponents
            } else {
                SubcircuitMode::OutputClosure
            },
            ..Default::default()
        }
    }
}

fn read_definition(file: &Path) -> Result<CircuitDefinition> {
    let text =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    parse_definition(&text).with_context(|| format!("failed to parse {}", file.display()))
}

fn output_line(output: &OutputSpec, value: bool) -> String {
    format!(
        "Output from {} index {}: {}",
        output.pin, output.index, value as u8
    )
}

fn unresolved_warning(unresolved: &[String]) -> Option<String> {
    if unresolved.is_empty() {
        return None;
    }
    Some(format!(
        "warning: {} unresolved reference(s): {}",
        unresolved.len(),
        unresolved.join(", ")
    ))
}

/// Writes `definition` where `loader` looks up `type_name`.
fn save_definition(
    definition: &CircuitDefinition,
    type_name: &str,
    loader: &DirectoryLoader,
) -> Result<PathBuf> {
    let path = loader.path_for(type_name)?;
    fs::create_dir_all(&loader.root)
        .with_context(|| format!("failed to create {}", loader.root.display()))?;
    fs::write(&path, definition.to_string())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let loader = DirectoryLoader::new(&cli.components).with_extension(&cli.extension);
    let options = cli.options();

    match cli.command {
        Commands::Run { file } => {
            let definition = read_definition(&file)?;
            let output = definition.output.clone();
            let mut cx = Context::new(&loader, CliDiagnostics::default()).with_options(options);
            let value = Circuit::new(definition)
                .output(&mut cx)
                .with_context(|| format!("failed to evaluate {}", file.display()))?;
            println!("{}", output_line(&output, value));
            let recorder = cx.into_sink().recorder;
            log::info!("{} subcircuit instances", recorder.loads.len());
            if let Some(warning) = unresolved_warning(&recorder.unresolved) {
                eprintln!("{warning}");
            }
        }
        Commands::Check { file } => {
            print!("{}", read_definition(&file)?);
        }
        Commands::Table { file, max_bits } => {
            let definition = read_definition(&file)?;
            let options = EvalOptions {
                max_sweep_bits: max_bits,
                ..options
            };
            let mut cx = Context::new(&loader, LogDiagnostics).with_options(options);
            print!("{}", truth_table(&definition, &mut cx)?);
        }
        Commands::Save { file, type_name } => {
            let definition = read_definition(&file)?;
            let path = save_definition(&definition, &type_name, &loader)?;
            println!("Component saved to {}", path.display());
        }
    }
    Ok(())
}
