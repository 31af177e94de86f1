//! Plant Disease Classification CLI
//!
//! Entry point for the inference service (`serve`), the binary training
//! command (`train`) and one-off local predictions (`predict`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use plant_disease::backend::{backend_name, TrainingBackend};
use plant_disease::model::TrainingConfig;
use plant_disease::server::{run_server, ServerConfig, ServiceContext};
use plant_disease::training::run_training;
use plant_disease::utils::logging::{init_logging, LogConfig};
use plant_disease::utils::{format_bytes, format_duration};

/// Plant Disease Classification
///
/// Serves a pretrained leaf classifier over HTTP and trains a small binary
/// CNN from a class-per-folder image directory.
#[derive(Parser, Debug)]
#[command(name = "plant_disease")]
#[command(version)]
#[command(about = "Plant leaf disease classification with Burn", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false", global = true)]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by `serve` and `predict`
#[derive(Args, Debug)]
struct ModelArgs {
    /// Weights of the served classifier
    #[arg(long, env = "PLANT_MODEL_PATH", default_value = "plant_disease_model.mpk")]
    model: PathBuf,

    /// JSON object mapping class names to output indices
    #[arg(long, env = "PLANT_CLASS_INDICES_PATH", default_value = "class_indices.json")]
    class_indices: PathBuf,

    /// JSON file replacing the built-in disease advice table
    #[arg(long, env = "PLANT_DISEASE_INFO_PATH")]
    disease_info: Option<PathBuf>,

    /// Side length uploads are resized to
    #[arg(long, default_value = "160")]
    image_size: usize,
}

impl ModelArgs {
    fn apply(self, config: &mut ServerConfig) {
        config.model_path = self.model;
        config.class_indices_path = self.class_indices;
        config.disease_info_path = self.disease_info;
        config.image_size = self.image_size;
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP inference service
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Maximum upload size in MiB
        #[arg(long, default_value = "10")]
        body_limit_mb: usize,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Train the binary leaf classifier
    Train {
        /// Directory with one subdirectory per class [default: uploads]
        #[arg(short, long)]
        data_dir: Option<String>,

        /// Where to write the trained weights [default: plant_model.mpk]
        #[arg(short, long)]
        output: Option<String>,

        /// Number of training epochs [default: 10]
        #[arg(short, long)]
        epochs: Option<usize>,

        /// Batch size for training [default: 32]
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Image size (square) [default: 150]
        #[arg(long)]
        image_size: Option<usize>,

        /// Fraction of each class held out for validation [default: 0.2]
        #[arg(long)]
        validation_split: Option<f64>,

        /// Learning rate [default: 0.001]
        #[arg(short, long)]
        learning_rate: Option<f64>,

        /// Random seed for shuffling [default: 42]
        #[arg(long)]
        seed: Option<u64>,

        /// JSON training configuration; flags override its fields
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Classify a single image file and print the service response
    Predict {
        /// Path to input image
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        model: ModelArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };

    let _ = init_logging(&log_config);

    print_banner();

    match cli.command {
        Commands::Serve {
            host,
            port,
            body_limit_mb,
            model,
        } => {
            let mut config = ServerConfig {
                host,
                port,
                ..Default::default()
            }
            .with_body_limit_mb(body_limit_mb);
            model.apply(&mut config);

            cmd_serve(config)?;
        }

        Commands::Train {
            data_dir,
            output,
            epochs,
            batch_size,
            image_size,
            validation_split,
            learning_rate,
            seed,
            config,
        } => {
            let mut training = load_training_config(config.as_deref())?;

            if let Some(v) = data_dir {
                training.data_dir = v;
            }
            if let Some(v) = output {
                training.output_path = v;
            }
            if let Some(v) = epochs {
                training.epochs = v;
            }
            if let Some(v) = batch_size {
                training.batch_size = v;
            }
            if let Some(v) = image_size {
                training.image_size = v;
            }
            if let Some(v) = validation_split {
                training.validation_split = v;
            }
            if let Some(v) = learning_rate {
                training.learning_rate = v;
            }
            if let Some(v) = seed {
                training.seed = v;
            }

            cmd_train(&training)?;
        }

        Commands::Predict { input, model } => {
            let mut config = ServerConfig::default();
            model.apply(&mut config);

            cmd_predict(&input, &config)?;
        }
    }

    Ok(())
}

fn load_training_config(path: Option<&Path>) -> Result<TrainingConfig> {
    match path {
        Some(path) => TrainingConfig::load(path)
            .with_context(|| format!("failed to read training config {:?}", path)),
        None => Ok(TrainingConfig::default()),
    }
}

fn print_banner() {
    println!(
        "{}",
        r#"
 ╔══════════════════════════════════════════════════╗
 ║   🌱 Plant Disease Classification                ║
 ║   Leaf diagnosis with Burn + Rust                ║
 ╚══════════════════════════════════════════════════╝
  "#
        .green()
    );
}

fn cmd_serve(config: ServerConfig) -> Result<()> {
    println!("{}", "Starting Inference Service...".green().bold());
    println!("  🧠 Backend:       {}", backend_name());
    println!("  📦 Model:         {:?}", config.model_path);
    println!("  🏷️  Class indices: {:?}", config.class_indices_path);
    match &config.disease_info_path {
        Some(path) => println!("  📖 Disease info:  {:?}", path),
        None => println!("  📖 Disease info:  built-in table"),
    }
    println!("  🌐 Listening on:  http://{}", config.bind_address());
    println!();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_server(config))?;

    Ok(())
}

fn cmd_train(config: &TrainingConfig) -> Result<()> {
    println!("{}", "Training Configuration:".cyan().bold());
    println!("  📁 Data directory:   {}", config.data_dir);
    println!("  🔄 Epochs:           {}", config.epochs);
    println!("  📦 Batch size:       {}", config.batch_size);
    println!("  🖼️  Image size:       {}x{}", config.image_size, config.image_size);
    println!("  ✂️  Validation split: {}", config.validation_split);
    println!("  📈 Learning rate:    {}", config.learning_rate);
    println!("  🧠 Backend:          {}", backend_name());
    println!();

    let report = run_training::<TrainingBackend>(config)?;

    println!();
    println!("{}", "Training Complete!".green().bold());
    println!("  🏷️  Classes:    {}", report.class_names.join(", "));
    println!(
        "  📊 Samples:    {} training / {} validation",
        report.num_training, report.num_validation
    );
    if let Some(last) = report.final_metrics() {
        println!(
            "  📈 Final:      loss {:.4}, accuracy {:.2}%",
            last.loss,
            last.accuracy * 100.0
        );
        if let (Some(val_loss), Some(val_acc)) = (last.val_loss, last.val_accuracy) {
            println!(
                "  ✅ Validation: loss {:.4}, accuracy {:.2}%",
                val_loss,
                val_acc * 100.0
            );
        }
    }
    println!(
        "  💾 Saved to:   {:?} ({})",
        report.model_path,
        format_bytes(report.model_bytes)
    );
    println!("  ⏱️  Duration:   {}", format_duration(report.duration_secs));

    Ok(())
}

fn cmd_predict(input: &Path, config: &ServerConfig) -> Result<()> {
    info!("Running prediction on: {:?}", input);

    let bytes = std::fs::read(input).with_context(|| format!("failed to read {:?}", input))?;
    let context = ServiceContext::load(config)?;
    let response = context.predict(&bytes)?;

    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_training_config_without_file() {
        assert_eq!(load_training_config(None).unwrap(), TrainingConfig::default());
    }

    #[test]
    fn test_missing_training_config_keeps_io_error() {
        let err = load_training_config(Some(Path::new("/no/such/train.json"))).unwrap_err();

        assert!(format!("{:#}", err).starts_with("failed to read training config"));
        let io = err.root_cause().downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
    }
}
