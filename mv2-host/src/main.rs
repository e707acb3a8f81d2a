//! Command-line entry point for the MV2 host software.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mv2_host::{HostError, MxrFile, Runner, ScriptSet, SerialChannel};

#[derive(Parser)]
#[command(version, about = "Run MV2 measurement scripts over a serial link")]
struct Args {
    /// Measurement script
    script: PathBuf,
    /// XML schema the script was written against
    schema: PathBuf,
    /// Serial port the instrument is attached to, e.g. /dev/ttyACM0
    port: String,
    /// Append results to this MXR record file
    record: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(HostError::Interrupted) => {
            // ^C between iterations is a clean stop, matching the exit
            // behavior prior operators script against.
            println!("Interrupt received!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), HostError> {
    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupt);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    // The schema is consumed by the external validator; here it only has to
    // exist so a typo'd path fails before the instrument resets.
    std::fs::metadata(&args.schema)?;

    let scripts = ScriptSet::load(&args.script)?;
    let channel = SerialChannel::open(&args.port)?;
    let mut record = match &args.record {
        Some(path) => Some(MxrFile::create(path)?),
        None => None,
    };

    let mut runner = Runner::new(channel, &scripts)?.with_interrupt(interrupt);
    runner.run(|run| {
        print!("{}", run.results_csv());
        if let Some(record) = record.as_mut() {
            record.append_run(&run.headings_csv(), &run.results_csv())?;
        }
        Ok(())
    })?;
    Ok(())
}
