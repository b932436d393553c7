use agm_pi::cancel::CancelToken;
use agm_pi::engine::PiEngine;
use agm_pi::event::{EventSinkBox, NullSink};
use agm_pi::reporter::ConsoleReporter;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of decimal digits of pi to compute
    digits: usize,

    /// Iteration cap for the AGM loop
    #[arg(long, default_value_t = 60)]
    max_iterations: u32,

    /// Suppress progress reporting on stderr
    #[arg(long)]
    quiet: bool,

    /// Emit the result as a JSON object
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let sink: EventSinkBox = if cli.quiet {
        Box::new(NullSink)
    } else {
        Box::new(ConsoleReporter::new())
    };

    // Ctrl-C flips the cooperative flag; the engine finishes the current
    // iteration, finalizes, and we still print the best estimate.
    let cancel = CancelToken::new();
    signal_hook::flag::register(signal_hook::consts::SIGINT, cancel.flag()).into_diagnostic()?;

    let mut engine = PiEngine::new(sink).with_cancel_token(cancel);
    let result = engine.compute(cli.digits, cli.max_iterations).into_diagnostic()?;

    if cli.json {
        let report = serde_json::json!({
            "value": result.digits(),
            "iterations_run": result.iterations_run,
            "elapsed_seconds": result.elapsed_seconds(),
        });
        println!("{report}");
    } else {
        println!("{}", result.digits());
    }

    Ok(())
}
