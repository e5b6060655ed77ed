use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use genbank::{Reader, SequenceCase, Writer, WriterOptions};
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;

#[derive(Parser, Debug)]
#[command(
    name = "genbank",
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None,
)]
struct Cli {
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse every record of a file and report the first error
    Lint {
        /// GenBank file, optionally compressed
        file: PathBuf,

        /// Keep vendor-specific sections instead of dropping them
        #[arg(long)]
        keep_unknown: bool,
    },
    /// Re-serialize every record of a file
    Fmt {
        /// GenBank file, optionally compressed
        file: PathBuf,

        /// Output path; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the ORIGIN block in lowercase
        #[arg(long)]
        lowercase: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // A logger that fails to install only loses diagnostics.
    let _ = SimpleLogger::new().with_level(level).init();

    let result = match cli.command {
        Command::Lint { file, keep_unknown } => lint(&file, keep_unknown),
        Command::Fmt {
            file,
            output,
            lowercase,
        } => fmt(&file, output, lowercase),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn lint(path: &Path, keep_unknown: bool) -> Result<(), Box<dyn Error>> {
    let options = genbank::ReaderOptions::new().keep_unknown_sections(keep_unknown);
    let reader = Reader::from_path_with_options(path, options)?;

    let mut count = 0usize;
    let mut features = 0usize;
    for record in reader {
        let record = record.map_err(|err| format!("{}: {}", path.display(), err))?;
        info!(
            "{}: {} {} with {} features",
            record.name(),
            record.len(),
            record.unit.as_str(),
            record.features.len()
        );
        features += record.features.len();
        count += 1;
    }

    println!(
        "{}: {} records, {} features",
        path.display(),
        count,
        features
    );
    Ok(())
}

fn fmt(path: &Path, output: Option<PathBuf>, lowercase: bool) -> Result<(), Box<dyn Error>> {
    let case = if lowercase {
        SequenceCase::Lower
    } else {
        SequenceCase::Preserve
    };
    let writer = Writer::with_options(WriterOptions::new().sequence_case(case));

    let sink: Box<dyn Write> = match &output {
        Some(out) => Box::new(File::create(out)?),
        None => Box::new(io::stdout().lock()),
    };
    let mut sink = BufWriter::with_capacity(64 * 1024, sink);

    let mut count = 0usize;
    for record in Reader::from_path(path)? {
        let record = record.map_err(|err| format!("{}: {}", path.display(), err))?;
        writer.write_record(&record, &mut sink)?;
        count += 1;
    }
    sink.flush()?;

    info!("wrote {} records", count);
    Ok(())
}
