use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use tracing::{debug, error, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};
use webcheck::{
    Pipeline,
    actors::StopReason,
    config::{Config, load_config},
    storage::{BackendConnector, InfluxConnector, MemoryBackend},
};

const DEFAULT_CONFIG: &str = "config.toml";

#[derive(Debug, Clone, Parser)]
#[command(
    about = "Periodically check websites and store their availability in InfluxDB",
    after_help = "If you don't pass a URL as argument, you must specify a urls list in your config file."
)]
struct Args {
    /// Websites to check (`URL` or `label::URL`), merged with the urls of the config file
    urls: Vec<String>,

    /// Config file (TOML, or JSON with a .json extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Check periodicity in seconds
    #[arg(long)]
    interval: Option<u64>,

    /// Number of concurrent probers
    #[arg(long, alias = "nb-collector")]
    probers: Option<usize>,

    /// Number of concurrent writers
    #[arg(long, alias = "nb-archiver")]
    writers: Option<usize>,

    /// Capacity of the work and results queues
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// HTTP timeout of a single check in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Verify TLS certificates of checked websites
    #[arg(long)]
    verify_tls: bool,

    /// Log points instead of writing them to InfluxDB
    #[arg(long)]
    dry_run: bool,

    /// Log everything down to trace level
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Command-line values take precedence over the config file
    fn apply(&self, config: &mut Config) {
        let general = &mut config.general;

        if let Some(interval) = self.interval {
            general.interval = interval;
        }
        if let Some(probers) = self.probers {
            general.probers = probers;
        }
        if let Some(writers) = self.writers {
            general.writers = writers;
        }
        if let Some(capacity) = self.queue_capacity {
            general.queue_capacity = capacity;
        }
        if let Some(timeout) = self.timeout {
            general.timeout = timeout;
        }
        if self.verify_tls {
            general.insecure_tls = false;
        }
    }
}

fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };
    let filter = filter::Targets::new().with_targets(vec![("webcheck", level)]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

/// Completes on interrupt, terminate or quit
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("can not listen for interrupt: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let unix_signals = async {
        use tokio::signal::unix::{SignalKind, signal};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::quit()),
        ) {
            (Ok(mut terminate), Ok(mut quit)) => {
                tokio::select! {
                    _ = terminate.recv() => {}
                    _ = quit.recv() => {}
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                error!("can not listen for termination signals: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let unix_signals = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = unix_signals => {}
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init(args.verbose);
    trace!("started with args: {args:?}");

    // without URLs on the command line the config file is mandatory
    let required = args.config.is_some() || args.urls.is_empty();
    let path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    let mut config = match load_config(&path, required) {
        Ok(config) => config,
        Err(e) if args.urls.is_empty() => {
            eprintln!("{}", Args::command().render_help());
            return Err(e);
        }
        Err(e) => return Err(e),
    };
    args.apply(&mut config);
    config.apply_env();
    config.validate()?;

    let targets = config.targets(&args.urls);
    if targets.is_empty() {
        eprintln!("{}", Args::command().render_help());
        std::process::exit(2);
    }
    debug!("checking {} website(s)", targets.len());

    let connector: Arc<dyn BackendConnector> = if args.dry_run {
        info!("dry run: points are logged, not stored");
        Arc::new(MemoryBackend::new().logging())
    } else {
        Arc::new(InfluxConnector::new(config.influx.clone()))
    };

    let pipeline = Pipeline::start(&config, targets, connector)?;
    let report = pipeline.dispatcher.run(shutdown_signal()).await;

    let stats = pipeline.stats.snapshot();
    info!(
        "stopped after {} cycle(s): {} probe(s) ok, {} failed, {} write(s) ok, {} failed",
        report.cycles,
        stats.probes_succeeded,
        stats.probes_failed,
        stats.writes_succeeded,
        stats.writes_failed
    );

    if report.reason == StopReason::QueueClosed {
        anyhow::bail!("all probers stopped");
    }

    // in-flight probes and writes are dropped on purpose
    println!("See you soon !");
    std::process::exit(0);
}
