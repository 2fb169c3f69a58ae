//! Command-line front end for the Blend65 analysis core. Takes one or
//! more source files, parses each into a module, runs the orchestrator
//! over the set, and prints the resulting diagnostics.

use std::path::PathBuf;

use clap::Parser;

use blend65_compiler::config::{AnalysisConfig, TargetVariant};
use blend65_compiler::frontend;
use blend65_compiler::Orchestrator;

/// Command line interface for the Blend65 analysis core.
#[derive(Parser)]
struct CompilerCLIOptions {
    /// Paths of source files to analyze. Each becomes its own module,
    /// named after the file stem unless it declares its own `module` name.
    #[clap(parse(from_os_str), required = true)]
    paths: Vec<PathBuf>,

    /// Target video standard; drives the SID-cadence recommendation.
    #[clap(long, default_value = "pal")]
    target: String,

    /// Skip the hardware-specific analyses (zero-page, SID, VIC-II).
    #[clap(long, action)]
    no_hw_analysis: bool,

    /// Print every diagnostic even when the run otherwise succeeded.
    #[clap(long, action)]
    verbose: bool,
}

impl CompilerCLIOptions {
    fn analysis_config(&self) -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        if self.target.eq_ignore_ascii_case("ntsc") {
            config.target = TargetVariant::Ntsc60;
        }
        if self.no_hw_analysis {
            config.run_hardware_analysis = false;
        }
        config
    }
}

fn module_name_for(path: &std::path::Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli_args = CompilerCLIOptions::parse();
    let mut orchestrator = Orchestrator::new(cli_args.analysis_config());
    let mut had_parse_errors = false;

    for path in &cli_args.paths {
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("error: could not read {}: {err}", path.display());
                std::process::exit(exitcode::NOINPUT);
            }
        };

        let default_name = module_name_for(path);
        match frontend::parse(&source) {
            Ok(program) => {
                let name = if program.module.explicit { program.module.dotted() } else { default_name };
                if let Err(err) = orchestrator.add_module(name, program) {
                    eprintln!("error: {err}");
                    std::process::exit(exitcode::SOFTWARE);
                }
            }
            Err(diagnostics) => {
                had_parse_errors = true;
                for diagnostic in diagnostics {
                    eprintln!("{}: {}", path.display(), diagnostic.render());
                }
            }
        }
    }

    if had_parse_errors {
        std::process::exit(exitcode::DATAERR);
    }

    let result = orchestrator.analyze_all();

    for diagnostic in &result.diagnostics {
        println!("{}", diagnostic.render());
    }

    if result.success {
        if cli_args.verbose {
            println!("analyzed {} module(s), {} diagnostic(s)", result.modules.len(), result.diagnostics.len());
        }
        std::process::exit(exitcode::OK);
    } else {
        std::process::exit(exitcode::DATAERR);
    }
}
