use anyhow::Context;
use clap::Parser;
use clap::ValueEnum;
use rotation::check;
use rotation::schedule::{self, ScheduleConfig};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Cli {
    /// JSON file with a ScheduleConfig. Flags below override its fields.
    #[clap(long)]
    config: Option<PathBuf>,
    /// Number of items in the pool.
    #[clap(long, short = 'n')]
    n_items: Option<usize>,
    /// Minimum distance between two occurrences of the same item.
    #[clap(long, short = 'd')]
    min_dist: Option<usize>,
    /// Number of chained permutations.
    #[clap(long, short = 'r')]
    rounds: Option<usize>,
    #[clap(long)]
    swap_fraction: Option<f64>,
    #[clap(long)]
    drop_probability: Option<f64>,
    #[clap(long, short = 's')]
    seed: Option<String>,
    /// Path to output file. If not provided, outputs to stdout.
    #[clap(long, short = 'o', default_value = "")]
    output: String,
    #[clap(long, short = 'f', default_value = "len")]
    format: Format,
    #[clap(long, short = 'c', default_value_t = false)]
    compact: bool,
}

#[derive(Default, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Only the length of the final sequence.
    #[default]
    Len,
    Json,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<ScheduleConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
            }
            None => ScheduleConfig::default(),
        };
        if let Some(v) = self.n_items {
            config.n_items = v;
        }
        if let Some(v) = self.min_dist {
            config.min_dist = v;
        }
        if let Some(v) = self.rounds {
            config.rounds = v;
        }
        if let Some(v) = self.swap_fraction {
            config.swap_fraction = v;
        }
        if let Some(v) = self.drop_probability {
            config.drop_probability = v;
        }
        if let Some(v) = &self.seed {
            config.seed = v.clone();
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let config = args.load_config()?;
    tracing::info!(?config, "generating schedule");
    let schedule = schedule::generate(&config).context("Failed to generate schedule")?;

    if let Some(gap) = schedule.rounds_min_gap() {
        tracing::info!(gap, min_dist = config.min_dist, "minimum gap across rounds");
    }
    tracing::info!(
        violations = check::count_violations(&schedule.sequence, config.min_dist),
        "repeats closer than min_dist after post-processing"
    );

    let mut w: Box<dyn Write> = if args.output.is_empty() {
        Box::new(std::io::stdout())
    } else {
        Box::new(
            fs::File::create(&args.output)
                .with_context(|| format!("Failed to create {}", args.output))?,
        )
    };

    match args.format {
        Format::Len => writeln!(w, "{}", schedule.sequence.len())?,
        Format::Json => {
            if args.compact {
                serde_json::to_writer(&mut w, &schedule)?;
            } else {
                serde_json::to_writer_pretty(&mut w, &schedule)?;
            }
            writeln!(w)?;
        }
    }
    Ok(())
}
