use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use werbench::report::render_eval_report;
use werbench::run::EvalOptions;
use werbench::{align, config, extract, read_tokens, run, Config};

#[derive(Parser)]
#[command(name = "werbench")]
#[command(author, version, about = "Token-level WER evaluation for speech-to-text transcripts", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate hypothesis files against references and write reports
    Evaluate {
        /// Output directory containing hypothesis .txt/.token.txt files
        #[arg(long)]
        out: PathBuf,

        /// Samples directory containing reference token files
        #[arg(long)]
        samples: Option<PathBuf>,

        /// Worker threads (0 = number of CPU cores)
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Score a single reference/hypothesis file pair
    Align {
        /// Reference token file
        reference: PathBuf,

        /// Hypothesis token file
        hypothesis: PathBuf,

        /// Also print the alignment trace
        #[arg(long)]
        trace: bool,
    },

    /// Extract plain-text transcripts from STT provider JSON responses
    Extract {
        /// Output directory containing recognition .json files
        #[arg(long)]
        out: PathBuf,
    },

    /// Configure settings
    Config {
        /// Set the default samples directory
        #[arg(long)]
        samples: Option<String>,

        /// Set the default worker count (0 = number of CPU cores)
        #[arg(long)]
        workers: Option<usize>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

fn init_logging(verbose: bool, config: &Config) {
    let filter = if verbose {
        EnvFilter::new("werbench=debug")
    } else {
        EnvFilter::new(format!("werbench={}", config.logging.level))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();
    init_logging(cli.verbose, &config);

    match cli.command {
        Commands::Evaluate {
            out,
            samples,
            workers,
        } => {
            let options = EvalOptions {
                out_dir: out,
                samples_dir: samples
                    .unwrap_or_else(|| PathBuf::from(&config.evaluation.samples_dir)),
                workers: workers.unwrap_or(config.evaluation.workers),
            };
            let summary = run::run(&options).await?;
            info!(
                "Done: {} pair(s) evaluated, {} skipped",
                summary.evaluated, summary.skipped
            );
            println!("Summary: {}", summary.summary_path.display());
        }

        Commands::Align {
            reference,
            hypothesis,
            trace,
        } => {
            let ref_tokens = read_tokens(&reference)?;
            let hyp_tokens = read_tokens(&hypothesis)?;
            let result = align(&ref_tokens, &hyp_tokens);
            print!(
                "{}",
                render_eval_report(&reference, &hypothesis, &ref_tokens, &hyp_tokens, &result)
            );
            if trace {
                println!("=== Alignment ===");
                for op in &result.trace {
                    println!(
                        "{}\t{}\t{}",
                        op.reference().unwrap_or(""),
                        op.hypothesis().unwrap_or(""),
                        op.tag()
                    );
                }
            }
        }

        Commands::Extract { out } => {
            let written = extract::extract_dir(&out)?;
            println!("Extracted {written} transcript(s)");
        }

        Commands::Config {
            samples,
            workers,
            show,
        } => {
            if show {
                config::show()?;
            } else {
                config::update(samples, workers)?;
            }
        }
    }

    Ok(())
}
