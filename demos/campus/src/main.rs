//! Campus pedestrian-flow campaign.
//!
//! Simulates a morning of class changes on a synthetic campus walkway
//! network for several day types, rerouting pedestrians off crowded paths
//! and writing per-run statistics to the output directory.
//!
//! Run with:
//!   cargo run -p campus --release
//!   cargo run -p campus --release -- --runs 5 --day-type MWF --day-type TTh
//!   cargo run -p campus --release -- --schedule-dir data/ --config campaign.json
//!
//! Output (CSV backend): `output/campus/<DayType>_runNN_stats.csv`,
//! `<DayType>_runNN_lanes.csv` and `short_batches.csv`.

mod network;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use cf_core::{BuildingId, GeoPoint, TimeOfDay};
use cf_mobility::{WalkConfig, WalkStepper};
use cf_output::{CsvWriter, OutputWriter, RunOutputObserver};
use cf_schedule::{
    Building, CsvScheduleSource, DayType, MemoryScheduleSource, ScheduleSource, load_occupancy_reader,
};
use cf_sim::{CampaignBuilder, CampaignConfig, CampaignReport};
use cf_spatial::DijkstraOracle;

// ── Constants ─────────────────────────────────────────────────────────────────

const DEFAULT_OUTPUT: &str = "output/campus";

/// 07:00, just before the first class change.
const START_SECS: u32 = 7 * 3600;

/// Four simulated hours.
const HORIZON_TICKS: u64 = 4 * 3600;

const RUNS_PER_DAY_TYPE: u32 = 2;

const SEED: u64 = 2024;

/// Built-in occupancy schedule, used when `--schedule-dir` is not given.
/// Pedestrians leave a building when its slot ends.
const OCCUPANCY_CSV: &str = "\
building_id,name,lat,lon,start_time,end_time,occupancy_value,day_type
1,Atrium,33.938286,-84.518969,07:00:00,08:00:00,40,Base
2,Library,33.940275,-84.520132,07:30:00,08:15:00,25,Base
3,Engineering,33.941640,-84.517420,08:00:00,09:15:00,60,Base
4,Student Center,33.939410,-84.515880,09:00:00,10:00:00,35,Base
1,Atrium,33.938286,-84.518969,07:00:00,07:50:00,80,MWF
3,Engineering,33.941640,-84.517420,07:00:00,07:50:00,120,MWF
2,Library,33.940275,-84.520132,08:00:00,08:50:00,45,MWF
3,Engineering,33.941640,-84.517420,08:00:00,08:50:00,90,MWF
5,Recreation,33.936850,-84.516750,08:00:00,09:30:00,30,MWF
1,Atrium,33.938286,-84.518969,08:00:00,09:15:00,110,TTh
3,Engineering,33.941640,-84.517420,08:00:00,09:15:00,70,TTh
4,Student Center,33.939410,-84.515880,09:30:00,10:45:00,50,TTh
2,Library,33.940275,-84.520132,09:30:00,10:45:00,30,TTh
";

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Sqlite,
    Parquet,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "campus")]
#[command(about = "Simulate pedestrian flow on a campus walkway network")]
#[command(version)]
struct Args {
    #[arg(long, help = "Campaign configuration (JSON); missing fields keep their defaults")]
    config: Option<PathBuf>,

    #[arg(long, help = "Directory holding occupancy.csv and buildings.csv")]
    schedule_dir: Option<PathBuf>,

    #[cfg(feature = "sqlite")]
    #[arg(long, conflicts_with = "schedule_dir", help = "SQLite database holding the schedule tables")]
    schedule_db: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_OUTPUT, help = "Output directory")]
    out: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv, help = "Output backend")]
    format: OutputFormat,

    #[arg(long, help = "Runs per day type")]
    runs: Option<u32>,

    #[arg(long = "day-type", help = "Day type to simulate (repeatable)")]
    day_types: Vec<DayType>,

    #[arg(long, help = "Master RNG seed")]
    seed: Option<u64>,

    #[arg(long, help = "Ticks (seconds) to simulate per run")]
    horizon: Option<u64>,

    #[arg(long, help = "Print the effective configuration as JSON and exit")]
    print_config: bool,

    #[arg(short, long, help = "Enable verbose logging")]
    verbose: bool,

    #[arg(long, help = "Enable per-tick debug logging")]
    debug: bool,
}

// ── Setup ─────────────────────────────────────────────────────────────────────

fn init_logging(args: &Args) {
    let level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn campaign_config(args: &Args) -> Result<CampaignConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => {
            let mut c = CampaignConfig::default();
            c.run.start_time_of_day = TimeOfDay::from_secs(START_SECS);
            c.run.horizon_ticks = HORIZON_TICKS;
            c.run.seed = SEED;
            c.runs_per_day_type = RUNS_PER_DAY_TYPE;
            c.day_types = vec![DayType::Base, DayType::Mwf, DayType::Tth];
            c
        }
    };

    if let Some(runs) = args.runs {
        config.runs_per_day_type = runs;
    }
    if !args.day_types.is_empty() {
        config.day_types = args.day_types.clone();
    }
    if let Some(seed) = args.seed {
        config.run.seed = seed;
    }
    if let Some(horizon) = args.horizon {
        config.run.horizon_ticks = horizon;
    }

    config.validate().context("invalid campaign configuration")?;
    Ok(config)
}

fn embedded_schedule() -> Result<MemoryScheduleSource> {
    let rows = load_occupancy_reader(OCCUPANCY_CSV.as_bytes()).context("parsing built-in schedule")?;
    let buildings = network::BUILDINGS
        .iter()
        .enumerate()
        .map(|(i, &(name, lat, lon))| Building {
            id:       BuildingId(i as u32 + 1),
            name:     name.to_string(),
            location: GeoPoint::new(lat, lon),
        })
        .collect();
    Ok(MemoryScheduleSource::new(rows, buildings))
}

fn schedule_source(args: &Args) -> Result<Box<dyn ScheduleSource>> {
    #[cfg(feature = "sqlite")]
    if let Some(db) = &args.schedule_db {
        let source = cf_schedule::SqliteScheduleSource::open(db)
            .with_context(|| format!("opening {}", db.display()))?;
        return Ok(Box::new(source));
    }
    Ok(match &args.schedule_dir {
        Some(dir) => Box::new(CsvScheduleSource::new(dir)),
        None => Box::new(embedded_schedule()?),
    })
}

// ── Campaign ──────────────────────────────────────────────────────────────────

fn run_campaign<W: OutputWriter>(
    writer: W,
    config: CampaignConfig,
    source: &dyn ScheduleSource,
) -> Result<CampaignReport> {
    let (net, entrances) = network::build_campus();
    let net = Arc::new(net);
    tracing::debug!(?entrances, "building entrances");
    println!("Network: {} nodes, {} directed walkways", net.node_count(), net.edge_count());

    let mut obs = RunOutputObserver::new(writer, &config);
    let mut runner = CampaignBuilder::new(
        config,
        source,
        DijkstraOracle::new(Arc::clone(&net)),
        WalkStepper::new(Arc::clone(&net), WalkConfig::default()),
    )
    .build()?;

    let result = runner.run(&mut obs);
    // Flush whatever reached the writer, even when a run failed.
    let flushed = obs.finish();
    let report = result?;
    flushed?;
    Ok(report)
}

fn run_with_format(
    format: OutputFormat,
    out: &Path,
    config: CampaignConfig,
    source: &dyn ScheduleSource,
) -> Result<CampaignReport> {
    match format {
        OutputFormat::Csv => run_campaign(CsvWriter::new(out)?, config, source),
        #[cfg(feature = "sqlite")]
        OutputFormat::Sqlite => run_campaign(cf_output::SqliteWriter::new(out)?, config, source),
        #[cfg(feature = "parquet")]
        OutputFormat::Parquet => run_campaign(cf_output::ParquetWriter::new(out)?, config, source),
        #[allow(unreachable_patterns)]
        other => bail!("output format {other:?} needs the matching cargo feature"),
    }
}

fn print_report(report: &CampaignReport) {
    println!();
    println!(
        "{:<14} {:>8} {:>8} {:>8} {:>8} {:>9} {:>7}",
        "run", "end", "injected", "skipped", "reroutes", "congested", "short"
    );
    for run in &report.runs {
        let end = match (&run.end, &run.aborted) {
            (Some(end), _) => format!("{end:?}"),
            (None, Some(_)) => "Aborted".to_string(),
            (None, None) => "-".to_string(),
        };
        println!(
            "{:<14} {:>8} {:>8} {:>8} {:>8} {:>9} {:>7}",
            run.label.to_string(),
            end,
            run.injected,
            run.skipped,
            run.reroutes,
            run.congested_lanes,
            run.short_batches.len(),
        );
    }
    println!();
    println!("Total injected: {}", report.total_injected());
    println!("Total reroutes: {}", report.total_reroutes());
    let short: Vec<String> = report.runs_with_short_batches().map(|r| r.label.to_string()).collect();
    if !short.is_empty() {
        println!("Runs with skipped spawns: {}", short.join(", "));
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    // 1. Configuration.
    let config = campaign_config(&args)?;
    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }
    println!(
        "Campaign: {} day type(s) × {} run(s), {} ticks from {}",
        config.day_types.len(),
        config.runs_per_day_type,
        config.run.horizon_ticks,
        config.run.start_time_of_day,
    );

    // 2. Schedule.
    let source = schedule_source(&args)?;

    // 3. Output directory.
    std::fs::create_dir_all(&args.out).with_context(|| format!("creating {}", args.out.display()))?;

    // 4. Run.
    let started = Instant::now();
    let report = run_with_format(args.format, &args.out, config, source.as_ref())?;
    let elapsed = started.elapsed();

    // 5. Summary.
    print_report(&report);
    println!("Wall time: {:.2}s", elapsed.as_secs_f64());
    println!("Output in: {}", args.out.display());
    Ok(())
}
