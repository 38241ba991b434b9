//! logsegment Dump Binary
//!
//! Reconstructs a segment file and prints its records.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use logsegment::metrics::CountingMetrics;
use logsegment::{
    CorruptionPolicy, Segment, SegmentConfig, SegmentContext, SegmentDirectory, SegmentStartEnd,
};
use tracing_subscriber::{fmt, EnvFilter};

/// Segment file inspector
#[derive(Parser, Debug)]
#[command(name = "logsegment-dump")]
#[command(about = "Inspect a write-ahead log segment file")]
#[command(version)]
struct Args {
    /// Segment file (log_<start>-<end> or log_inprogress_<start>)
    file: PathBuf,

    /// Start index, if the file name does not follow the naming scheme
    #[arg(long)]
    start: Option<u64>,

    /// End index of a closed segment (omit for an open segment)
    #[arg(long, requires = "start")]
    end: Option<u64>,

    /// Corruption policy: exception | warn_and_return
    #[arg(short, long, default_value = "warn_and_return")]
    policy: CorruptionPolicy,

    /// Maximum serialized entry size in bytes
    #[arg(long, default_value_t = 32 * 1024 * 1024)]
    max_entry_size: u64,

    /// Keep closed segment entries cached while reading
    #[arg(short, long)]
    keep_cache: bool,

    /// After reading, evict the cache and reload this index from disk
    #[arg(short, long)]
    load: Option<u64>,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,logsegment=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> logsegment::Result<()> {
    let start_end = match (args.start, args.end) {
        (Some(start), Some(end)) => SegmentStartEnd::closed(start, end),
        (Some(start), None) => SegmentStartEnd::open(start),
        _ => SegmentStartEnd::from_path(&args.file).ok_or_else(|| {
            logsegment::SegmentError::Config(format!(
                "Cannot derive segment range from {}; pass --start/--end",
                args.file.display()
            ))
        })?,
    };

    let data_dir = args
        .file
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let config = SegmentConfig::builder()
        .data_dir(data_dir)
        .corruption_policy(args.policy)
        .max_entry_size(args.max_entry_size)
        .keep_entry_in_cache(args.keep_cache)
        .build();

    let metrics = Arc::new(CountingMetrics::new());
    let context = SegmentContext::from_directory(SegmentDirectory::open(config.clone())?)
        .with_metrics(metrics.clone());

    tracing::info!("logsegment-dump v{}", logsegment::VERSION);
    tracing::info!("Segment: {} ({})", start_end, args.file.display());
    tracing::info!("Corruption policy: {}", config.corruption_policy);

    let segment = match Segment::load_segment(
        context,
        &args.file,
        start_end,
        config.keep_entry_in_cache,
        None,
    )? {
        Some(segment) => segment,
        None => {
            println!("{}: no entries (file deleted)", start_end);
            return Ok(());
        }
    };

    println!("{:>12} {:>8} {:>14} {:>12} {:>10}", "INDEX", "TERM", "KIND", "OFFSET", "SIZE");
    for record in segment.log_records() {
        let header = record.header();
        println!(
            "{:>12} {:>8} {:>14} {:>12} {:>10}",
            header.index(),
            header.term(),
            format!("{:?}", header.kind),
            record.offset(),
            header.serialized_size
        );
    }
    println!();
    println!("segment:          {}", segment);
    println!("entries:          {}", segment.num_entries());
    println!("total file size:  {}", segment.total_file_size());
    println!("cache size:       {}", segment.total_cache_size());

    if let Some(index) = args.load {
        let record = segment.log_record(index).ok_or_else(|| {
            logsegment::SegmentError::Config(format!("Index {} is not in {}", index, segment))
        })?;
        segment.evict_cache();
        let entry = segment.load_cache(record.term_index())?;
        println!();
        println!("loaded {}: {} payload bytes", entry.term_index(), entry.payload.len());
        println!("cache entries:    {}", segment.cached_entries());
        println!("loading times:    {}", segment.loading_times());
    }
    println!("entries read:     {}", metrics.entries_read());
    println!("segment loads:    {}", metrics.segment_loads());

    Ok(())
}
