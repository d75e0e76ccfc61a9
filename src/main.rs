use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use ponder::boundary::Records;
use ponder::config::{self, PROGRESS_INTERVAL};
use ponder::export;
use ponder::models::RecordKind;
use ponder::parser::DblpRdfParser;
use ponder::pipeline::Pipeline;
use ponder::reader::DumpReader;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "ponder")]
#[command(about = "Extract DBLP RDF dumps into relational tables")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract papers, authors and authorships into TSV tables
    Extract(ExtractArgs),
    /// Count records per type without processing them
    Scan(ScanArgs),
}

#[derive(Args)]
struct ExtractArgs {
    /// Path to the DBLP dump (.rdf, .rdf.gz or .rdf.bz2)
    #[arg(short, long, default_value = config::DEFAULT_INPUT)]
    input: PathBuf,

    /// Output directory for generated tables
    #[arg(short, long)]
    output: PathBuf,

    /// Worker threads (defaults to twice the core count)
    #[arg(long)]
    threads: Option<usize>,

    /// Limit number of records to process (for testing)
    #[arg(long)]
    limit: Option<u64>,

    /// Dry run - don't write output files
    #[arg(long)]
    dry_run: bool,

    /// Clear existing outputs before starting
    #[arg(long)]
    clean: bool,
}

#[derive(Args)]
struct ScanArgs {
    /// Path to the DBLP dump (.rdf, .rdf.gz or .rdf.bz2)
    #[arg(short, long, default_value = config::DEFAULT_INPUT)]
    input: PathBuf,

    /// Stop after this many records
    #[arg(long)]
    limit: Option<u64>,
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn run_extract(args: ExtractArgs) -> Result<()> {
    if args.clean && !args.dry_run {
        clean_output(&args.output)?;
    }

    info!("Starting extraction pass");
    let start_extracting = Instant::now();
    let pb = spinner();
    pb.set_message("Scanning dump");
    let result = Pipeline::new(DblpRdfParser)
        .threads(args.threads.unwrap_or_else(config::default_threads))
        .limit(args.limit)
        .progress(pb)
        .run(DumpReader::open(&args.input)?)?;
    let extraction_duration = start_extracting.elapsed();
    info!(
        duration_secs = extraction_duration.as_secs_f64(),
        "Extraction complete"
    );

    let start_export = Instant::now();
    let summary = if args.dry_run {
        info!("Dry run, skipping export");
        None
    } else {
        Some(export::write_tables(&result, &args.output)?)
    };
    let export_duration = start_export.elapsed();

    let stats = result.stats();
    println!();
    println!("=== Summary ===");
    println!(
        "Extraction time:    {:.2}s",
        extraction_duration.as_secs_f64()
    );
    println!("Export time:        {:.2}s", export_duration.as_secs_f64());
    println!(
        "Total time:         {:.2}s",
        (extraction_duration + export_duration).as_secs_f64()
    );
    println!();
    println!("Lines read:         {}", stats.lines_read);
    println!("Records detected:   {}", stats.records());
    for kind in RecordKind::ALL {
        println!("  {:<17} {}", format!("{kind}:"), stats.records_of(kind));
    }
    println!("Papers committed:   {}", stats.papers_committed);
    println!("Duplicate papers:   {}", stats.duplicate_papers);
    println!("Authors:            {}", result.max_author_id());
    println!("Authorships:        {}", stats.authorships);
    println!("Records skipped:    {}", stats.skipped());
    println!("Parse failures:     {}", stats.parse_failures);
    println!("Author mismatches:  {}", stats.relation_mismatches);
    println!("Worker panics:      {}", stats.task_panics);
    println!("Unterminated:       {}", stats.unterminated_records);
    if let Some(summary) = summary {
        println!();
        println!(
            "Rows written:       {} papers, {} authors, {} authorships",
            summary.papers, summary.authors, summary.authorships
        );
        println!("Output directory:   {}", args.output.display());
    }

    Ok(())
}

fn clean_output(output: &Path) -> Result<()> {
    if output.exists() {
        info!("Cleaning output directory: {}", output.display());
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clean output directory: {}", output.display()))?;
    }
    Ok(())
}

fn run_scan(args: ScanArgs) -> Result<()> {
    let start = Instant::now();
    let pb = spinner();
    let mut records = Records::new(DumpReader::open(&args.input)?);
    let mut counts = [0u64; RecordKind::COUNT];
    let mut total: u64 = 0;

    while args.limit.is_none_or(|max| total < max) {
        let Some(record) = records.next() else {
            break;
        };
        counts[record?.kind.index()] += 1;
        total += 1;
        if total % PROGRESS_INTERVAL == 0 {
            pb.set_message(format!("{total} records"));
        }
    }
    pb.finish_and_clear();

    println!();
    println!("=== Scan ===");
    println!("Scan time:          {:.2}s", start.elapsed().as_secs_f64());
    println!("Lines read:         {}", records.lines_read());
    println!("Records detected:   {total}");
    for kind in RecordKind::ALL {
        println!("  {:<17} {}", format!("{kind}:"), counts[kind.index()]);
    }
    if records.ended_unterminated() {
        println!("Dump ended inside an unterminated record");
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::Extract(args) => run_extract(args),
        Commands::Scan(args) => run_scan(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
