use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use fairrent_api::{AppState, RestApi};
use fairrent_core::{EstimatorKind, InferenceService, TrainingConfig, TrainingPipeline};
use fairrent_storage::{load_records, ModelStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Rent prediction and fairness scoring
#[derive(Parser, Debug)]
#[command(name = "fairrent")]
#[command(about = "Predict fair rents and flag over- or underpriced listings", long_about = None)]
struct Cli {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve predictions over HTTP
    Serve(ServeArgs),
    /// Train a model from a CSV of historical listings
    Train(TrainArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Path to the model artifact
    #[arg(short, long, default_value = "models/rent_model.bundle")]
    model_path: PathBuf,

    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// HTTP API port
    #[arg(long, default_value_t = 5000)]
    http_port: u16,
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// CSV file of historical listings
    #[arg(short, long, default_value = "data/flats.csv")]
    data: PathBuf,

    /// Where to write the model artifact
    #[arg(short, long, default_value = "models/rent_model.bundle")]
    output: PathBuf,

    /// random-forest, linear or mean
    #[arg(long, default_value = "random-forest")]
    estimator: EstimatorKind,

    #[arg(long, default_value_t = 200)]
    n_estimators: usize,

    #[arg(long)]
    max_depth: Option<usize>,

    #[arg(long, default_value_t = 2)]
    min_samples_split: usize,

    #[arg(long, default_value_t = 1)]
    min_samples_leaf: usize,

    /// Share of records held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    test_fraction: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

impl TrainArgs {
    fn config(&self) -> TrainingConfig {
        TrainingConfig {
            estimator: self.estimator,
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            test_fraction: self.test_fraction,
            seed: self.seed,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Train(args) => train(args).await,
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    info!("Starting FairRent v{}", env!("CARGO_PKG_VERSION"));
    info!("Model path: {:?}", args.model_path);

    let store = Arc::new(ModelStore::new(&args.model_path));
    let service = Arc::new(InferenceService::new(store.load_or_degrade()));
    if !service.is_loaded() {
        info!("Serving without a model; POST /reload once the artifact exists");
    }

    let state = AppState::new(service, store);
    let host = args.host.clone();
    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on {}:{}", host, http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(state, host, http_port).await {
                error!("HTTP server error: {}", e);
            }
        })
    });

    info!("HTTP API: http://localhost:{}/", args.http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}

async fn train(args: TrainArgs) -> anyhow::Result<()> {
    let pipeline = TrainingPipeline::new(args.config())?;

    let records = load_records(&args.data)?;
    info!("Loaded {} records from {:?}", records.len(), args.data);

    let outcome = tokio::task::spawn_blocking(move || pipeline.fit_and_evaluate(&records))
        .await
        .context("Training task panicked")??;

    match outcome.evaluation {
        Some(eval) => info!(
            "MAE: {:.2}, R2: {:.4} ({} train / {} test)",
            eval.mae, eval.r2, eval.n_train, eval.n_test
        ),
        None => info!("No held-out records, skipping evaluation"),
    }

    let artifact = ModelStore::new(&args.output).save(&outcome.bundle)?;
    info!(
        "Model saved to {:?} ({} bytes, sha256 {})",
        args.output, artifact.size, artifact.checksum
    );
    Ok(())
}
