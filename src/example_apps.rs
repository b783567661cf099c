use std::error::Error;

use clap::{Parser, error::ErrorKind};

use crate::config::BalancedSamplerConfig;
use crate::flattened::FlattenedBalancedSampler;
use crate::metrics::summarize_epoch;
use crate::sampler::{BalancedBatchSampler, EpochSampler};
use crate::types::{IndexBatch, LabelName};

#[derive(Debug, Parser)]
#[command(
    name = "balanced_epoch_demo",
    disable_help_subcommand = true,
    about = "Draw label-balanced P x K epochs",
    long_about = "Draw epochs of label-balanced batches (P labels x K instances) from an inline label list and print each batch with an epoch summary.",
    after_help = "Set RUST_LOG=balanced_sampler=trace to see per-batch sampler events."
)]
struct BalancedEpochDemoCli {
    #[arg(
        long,
        default_value = "0,1,2,3,4,0,1,2,3,4,0,1,2",
        help = "Comma-separated label of each dataset item, in index order"
    )]
    labels: String,
    #[arg(
        short = 'p',
        long = "labels-per-batch",
        default_value_t = 2,
        value_parser = parse_positive_usize,
        help = "Distinct labels per batch (P)"
    )]
    labels_per_batch: usize,
    #[arg(
        short = 'k',
        long = "instances-per-label",
        default_value_t = 3,
        value_parser = parse_positive_usize,
        help = "Instances per label in a batch (K)"
    )]
    instances_per_label: usize,
    #[arg(long, help = "Optional deterministic seed override")]
    seed: Option<u64>,
    #[arg(
        long,
        default_value_t = 1,
        value_parser = parse_positive_u64,
        help = "Number of epochs to draw"
    )]
    epochs: u64,
    #[arg(long, help = "Print one flat index sequence per epoch instead of batches")]
    flat: bool,
}

/// Run the balanced epoch demo with CLI-style arguments (program name excluded).
pub fn run_balanced_epoch_demo<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) = parse_cli::<BalancedEpochDemoCli, _>(
        std::iter::once("balanced_epoch_demo".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let labels = parse_labels(&cli.labels)?;
    let mut config = BalancedSamplerConfig::new(cli.labels_per_batch, cli.instances_per_label);
    config.seed = cli.seed.or(config.seed);

    let sampler = BalancedBatchSampler::from_config(labels.iter().cloned(), &config)?;
    println!(
        "items={} labels={} p={} k={} batch_size={} labels_per_epoch={} batches_in_epoch={} seed={}",
        labels.len(),
        sampler.n_labels(),
        sampler.labels_per_batch(),
        sampler.instances_per_label(),
        sampler.batch_size(),
        sampler.labels_per_epoch(),
        sampler.batches_in_epoch(),
        sampler.seed(),
    );

    if cli.flat {
        let flat = FlattenedBalancedSampler::from_batch_sampler(sampler);
        for epoch in 0..cli.epochs {
            let indices = collect_epoch(&flat, epoch);
            println!("epoch {epoch} ({} indices): {indices:?}", indices.len());
        }
        return Ok(());
    }

    for epoch in 0..cli.epochs {
        let batches: Vec<IndexBatch> = collect_epoch(&sampler, epoch);
        println!("epoch {epoch}");
        for (batch_idx, batch) in batches.iter().enumerate() {
            let rendered: Vec<String> = batch
                .iter()
                .map(|idx| format!("{idx}:{}", labels[*idx]))
                .collect();
            println!("  batch {batch_idx}: [{}]", rendered.join(", "));
        }
        let summary = summarize_epoch(&labels, &batches, sampler.instances_per_label());
        println!(
            "  summary: batches={} indices={} labels_sampled={}/{} dropped={} repeated={} balanced={}",
            summary.batches,
            summary.total_indices,
            summary.labels_sampled,
            summary.labels_in_data,
            summary.dropped_labels,
            summary.repeated_indices,
            summary.all_balanced(),
        );
    }

    Ok(())
}

fn collect_epoch<S: EpochSampler>(sampler: &S, epoch: u64) -> Vec<S::Item> {
    sampler.epoch_iter(epoch).collect()
}

fn parse_labels(raw: &str) -> Result<Vec<LabelName>, String> {
    let labels: Vec<LabelName> = raw
        .split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect();
    if labels.is_empty() {
        return Err("--labels expects at least one comma-separated label".to_string());
    }
    Ok(labels)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("invalid value '{raw}': expected a positive integer"))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(raw: &str) -> Result<u64, String> {
    let parsed = raw
        .parse::<u64>()
        .map_err(|_| format!("invalid value '{raw}': expected a positive integer"))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}
