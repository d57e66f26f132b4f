//! `sigbt signals generate`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use sigbt_strategy::{producer_by_name, write_signals_csv, Action};

use super::{load_anchor_candles, read_candles};

#[derive(Args)]
pub struct GenerateArgs {
    /// Producer name
    #[arg(long, default_value = "anchor-lag")]
    strategy: String,

    /// Target candle CSV
    #[arg(long)]
    target: PathBuf,

    /// Anchor candle CSV(s), in the producer's declared anchor order
    #[arg(long = "anchor")]
    anchors: Vec<PathBuf>,

    /// Output signal CSV
    #[arg(long)]
    out: PathBuf,
}

pub fn signals_generate(args: GenerateArgs) -> Result<()> {
    let producer = producer_by_name(&args.strategy)?;
    let target = read_candles(&args.target)?;
    let anchors = load_anchor_candles(producer.as_ref(), &args.anchors)?;

    let signals = producer
        .generate(&target, &anchors)
        .with_context(|| format!("strategy '{}' failed", producer.name()))?;
    write_signals_csv(&args.out, &signals)?;

    let count = |a: Action| signals.iter().filter(|s| s.action == a).count();
    println!("strategy={}", producer.name());
    println!("rows={}", signals.len());
    println!(
        "buy={} sell={} hold={}",
        count(Action::Buy),
        count(Action::Sell),
        count(Action::Hold)
    );
    println!("signals_path={}", args.out.display());
    Ok(())
}
