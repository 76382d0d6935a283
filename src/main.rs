use std::process::ExitCode;

use clap::Parser;

use issue_filter::config::Config;
use issue_filter::error::{self, Error};
use issue_filter::{Diagnostic, Expr, FilterContext, Snapshot};


fn main() -> ExitCode {
    let config = Config::parse();
    config.init_logging();

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "filter run failed");
            eprintln!("error: {error}");
            ExitCode::FAILURE
        },
    }
}

/// Compiles the filter, reports its diagnostics and prints the matching issues of the snapshot.
pub fn run(config: &Config) -> Result<(), Error> {
    let mut snapshot = Snapshot::load(&config.snapshot)?;
    snapshot.current_milestone = config.current_milestone(&snapshot);

    let (expr, diagnostics) = compile(&config.filter, !config.no_color);
    if config.show_tree {
        println!("{expr}");
    }

    let ctx = FilterContext::from_source(&snapshot, config.now());
    for issue in issue_filter::evaluate(&expr, &ctx) {
        println!("#{:<6}{}", issue.id, issue.title);
    }
    Ok(())
}

fn compile(source: &str, color: bool) -> (Expr, Vec<Diagnostic>) {
    let (expr, diagnostics) = issue_filter::compile(source);
    eprint!("{}", error::render_diagnostics(source, &diagnostics, color));
    (expr, diagnostics)
}
