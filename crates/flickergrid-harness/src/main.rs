#![forbid(unsafe_code)]

//! Headless flickering-grid runner.

use std::fs;
use std::process;

use flickergrid_core::{DEFAULT_SEED, FlickerConfig};
use flickergrid_harness::cli::{LOG_FILTER_ENV, Opts};
use flickergrid_harness::{HeadlessHost, RunLogger, RunSummary, Scenario, snapshot};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(opts: &Opts) -> Result<RunSummary, String> {
    let mut config = match opts.config.as_deref() {
        Some(json) => FlickerConfig::from_json(json).map_err(|e| format!("--config: {e}"))?,
        None => FlickerConfig::default(),
    };
    if let Some(seed) = opts.seed {
        config.seed = Some(seed);
    }
    let seed = config.seed.unwrap_or(DEFAULT_SEED);

    let scenario = if let Some(path) = &opts.scenario {
        let script = fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "script".to_string());
        Scenario::parse(name, &script).map_err(|e| format!("{}: {e}", path.display()))?
    } else if opts.storm > 0 {
        Scenario::storm(seed, opts.storm, opts.width, opts.height)
    } else {
        Scenario::steady(opts.width, opts.height, opts.dpr, opts.ticks, opts.frame_ms)
    };

    let mut log = match &opts.run_log {
        Some(path) => RunLogger::open(path)
            .map_err(|e| format!("cannot open run log {}: {e}", path.display()))?,
        None => RunLogger::noop(),
    };

    let mut host = HeadlessHost::new(config).map_err(|e| format!("invalid config: {e}"))?;
    let summary = host.run(&scenario, &mut log);

    if let Some(path) = &opts.png
        && let Some(surface) = host.surface()
    {
        snapshot::save_png(surface, path).map_err(|e| format!("cannot write {}: {e}", path.display()))?;
    }
    Ok(summary)
}

fn main() {
    init_tracing();
    let opts = Opts::parse();
    match run(&opts) {
        Ok(summary) => {
            println!(
                "{} seed={:#x} grid={}x{} frames={} skipped={} lit={} checksum={}",
                summary.case,
                summary.seed,
                summary.columns,
                summary.rows,
                summary.frames,
                summary.skipped,
                summary.lit,
                summary.final_checksum.as_deref().unwrap_or("-"),
            );
        }
        Err(msg) => {
            eprintln!("{msg}");
            process::exit(1);
        }
    }
}
