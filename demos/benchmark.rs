//! Runs the full classifier suite on MNIST and/or ORL, raw and PCA-reduced,
//! and writes one CSV report per dataset.
//!
//! ```text
//! cargo run --release --example benchmark -- \
//!     [--mnist DIR] [--orl DIR] [--config FILE] [--out DIR]
//! ```
//!
//! Without `--mnist` or `--orl` a synthetic set of Gaussian blobs is used.

use clap::Parser;
use ndarray::Array2;
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Normal;
use patrec::experiment::run_suite;
use patrec::{Config, DataSource, Element, FeatureStore, Mnist, Orl, RunRecord, report};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "benchmark")]
#[command(about = "Run every classifier on MNIST and/or ORL, raw and PCA-reduced")]
struct Args {
    /// Directory holding the four MNIST IDX files.
    #[arg(long)]
    mnist: Option<PathBuf>,

    /// Directory holding orl_data.txt and orl_lbls.txt.
    #[arg(long)]
    orl: Option<PathBuf>,

    /// TOML file overriding the default parameters.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory the CSV reports are written to.
    #[arg(long, default_value = ".")]
    out: PathBuf,
}

/// Four well separated classes in 16 dimensions, 60 training and 20 testing
/// samples each.
fn synthetic_blobs(seed: u64) -> Result<FeatureStore, Box<dyn std::error::Error>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let dim = 16;
    let noise = Normal::new(0.0, 1.0)?;

    let mut store = FeatureStore::new(dim);
    for class in 0..4 {
        let center = Array2::random_using((1, dim), noise, &mut rng) * 6.0;
        let samples = Array2::random_using((80, dim), noise, &mut rng) + &center;
        for (i, row) in samples.rows().into_iter().enumerate() {
            let element = Element::new(row.to_owned(), class);
            if i < 60 {
                store.push_training(element)?;
            } else {
                store.push_testing(element)?;
            }
        }
    }
    Ok(store)
}

fn benchmark(
    name: &str,
    store: &FeatureStore,
    config: &Config,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "{name}: {} training / {} testing samples, {} classes, {} features",
        store.training_len(),
        store.testing().len(),
        store.num_classes(),
        store.vector_size()
    );

    let mut records: Vec<RunRecord> = run_suite(name, store, config, false)?;
    records.extend(run_suite(name, store, config, true)?);

    for record in &records {
        println!(
            "  {:<16} pca={:<5} accuracy={:.4} time={:.3}s",
            record.algorithm, record.pca, record.accuracy, record.seconds
        );
    }

    let path = args.out.join(format!("{}_results.csv", name.to_lowercase()));
    report::write_csv(&path, &records)?;
    println!("  written to {}", path.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };

    let mut sources: Vec<Box<dyn DataSource>> = Vec::new();
    if let Some(dir) = &args.mnist {
        sources.push(Box::new(Mnist::new(dir)));
    }
    if let Some(dir) = &args.orl {
        sources.push(Box::new(Orl::new(dir)));
    }

    if sources.is_empty() {
        let store = synthetic_blobs(config.perceptron.seed.unwrap_or(0))?;
        return benchmark("blobs", &store, &config, &args);
    }

    for source in &sources {
        let store = source.load()?;
        benchmark(source.name(), &store, &config, &args)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "benchmark", "--mnist", "data/mnist", "--config", "patrec.toml", "--out", "reports",
        ])
        .unwrap();
        assert_eq!(args.mnist, Some(PathBuf::from("data/mnist")));
        assert_eq!(args.orl, None);
        assert_eq!(args.config, Some(PathBuf::from("patrec.toml")));
        assert_eq!(args.out, PathBuf::from("reports"));
    }

    #[test]
    fn test_out_defaults_to_current_dir() {
        let args = Args::try_parse_from(["benchmark", "--orl", "orl"]).unwrap();
        assert_eq!(args.out, PathBuf::from("."));
    }

    #[test]
    fn test_missing_value_is_rejected() {
        assert!(Args::try_parse_from(["benchmark", "--mnist"]).is_err());
        assert!(Args::try_parse_from(["benchmark", "--unknown", "x"]).is_err());
    }

    #[test]
    fn test_synthetic_blobs_shape() {
        let store = synthetic_blobs(0).unwrap();
        assert_eq!(store.vector_size(), 16);
        assert_eq!(store.num_classes(), 4);
        assert_eq!(store.training_len(), 240);
        assert_eq!(store.testing().len(), 80);
    }
}
