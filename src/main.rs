use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use time_use_summary::execution::{ExecutionEngine, ExecutionOptions, TracingExecutionObserver};
use time_use_summary::frame::grouped_records_to_frame;
use time_use_summary::ingestion::{
    CompositeObserver, FileObserver, IngestionObserver, IngestionOptions, TracingObserver,
};
use time_use_summary::pipeline::{EngineKind, PipelineOptions, SummaryPipeline};
use time_use_summary::processing::GroupedRecord;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "time-use-summary",
    version,
    about = "Average daily hours on primary needs, work and other activities by working status, sex and age"
)]
struct Args {
    /// Survey CSV with one row per respondent.
    input: PathBuf,

    /// Engine running projection and aggregation: parallel, frame or sql.
    #[arg(long, default_value_t = EngineKind::Parallel)]
    engine: EngineKind,

    /// Worker threads; also caps chunks in flight. Defaults to the available parallelism.
    #[arg(long)]
    threads: Option<NonZeroUsize>,

    /// Rows per chunk for the parallel engine.
    #[arg(long, default_value = "4096")]
    chunk_size: NonZeroUsize,

    /// Single-byte field delimiter.
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    delimiter: u8,

    /// Print the groups as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Append ingestion outcomes to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn execution_options(&self) -> ExecutionOptions {
        let mut opts = ExecutionOptions {
            chunk_size: self.chunk_size.get(),
            ..Default::default()
        };
        if let Some(n) = self.threads {
            opts.num_threads = Some(n.get());
            opts.max_in_flight_chunks = n.get();
        }
        opts
    }
}

fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s.as_bytes() {
        [b] => Ok(*b),
        _ => Err(format!("must be a single byte, got '{s}'")),
    }
}

fn render(groups: &[GroupedRecord], json: bool) -> Result<String, Box<dyn std::error::Error>> {
    if json {
        Ok(serde_json::to_string_pretty(groups)?)
    } else {
        Ok(grouped_records_to_frame(groups)?.to_string())
    }
}

fn main() -> ExitCode {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    info!(input = %args.input.display(), engine = %args.engine, "startup");

    let mut observers: Vec<Arc<dyn IngestionObserver>> = vec![Arc::new(TracingObserver)];
    if let Some(path) = &args.log_file {
        observers.push(Arc::new(FileObserver::new(path)));
    }
    let ingestion = IngestionOptions {
        delimiter: args.delimiter,
        observer: Some(Arc::new(CompositeObserver::new(observers))),
        ..Default::default()
    };

    let engine = ExecutionEngine::new(args.execution_options()).with_observer(Arc::new(TracingExecutionObserver));
    let pipeline = SummaryPipeline::new(
        &engine,
        PipelineOptions {
            engine: args.engine,
            ..Default::default()
        },
    );

    let groups = match pipeline.run_path(&args.input, &ingestion) {
        Ok(groups) => groups,
        Err(e) => {
            error!(error = %e, "summary failed");
            return ExitCode::FAILURE;
        }
    };

    match render(&groups, args.json) {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "failed to render output");
            ExitCode::FAILURE
        }
    }
}
