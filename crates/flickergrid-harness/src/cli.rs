#![forbid(unsafe_code)]

//! Command-line argument parsing for the headless runner.
//!
//! Parses args manually. Environment variables with the `FLICKERGRID_` prefix
//! override defaults; explicit flags override both.

use std::env;
use std::path::PathBuf;
use std::process;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tracing filter variable, read by the binary before anything else.
pub const LOG_FILTER_ENV: &str = "FLICKERGRID_LOG";

pub const HELP_TEXT: &str = "\
flickergrid-harness: run the flickering grid headless and deterministically

USAGE:
    flickergrid-harness [OPTIONS]

OPTIONS:
    --seed=N             RNG seed (default: built-in seed)
    --width=PX           Container width in logical px (default: 320)
    --height=PX          Container height in logical px (default: 180)
    --dpr=X              Device pixel ratio (default: 1)
    --ticks=N            Frames to render in the steady scenario (default: 120)
    --frame-ms=MS        Frame interval in ms (default: 16.667)
    --config=JSON        Component props as a JSON object
    --scenario=PATH      Play a step script instead of the steady scenario
    --storm=N            Play N seeded random events instead
    --run-log=PATH       Append JSONL run records to PATH
    --png=PATH           Write the final frame as a PNG
    --help, -h           Show this help message
    --version, -V        Show version

ENVIRONMENT VARIABLES:
    FLICKERGRID_SEED       Override --seed
    FLICKERGRID_WIDTH      Override --width
    FLICKERGRID_HEIGHT     Override --height
    FLICKERGRID_TICKS      Override --ticks
    FLICKERGRID_RUN_LOG    Override --run-log
    FLICKERGRID_LOG        Tracing filter, e.g. `flickergrid_core=debug`";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq)]
pub struct Opts {
    pub seed: Option<u64>,
    pub width: f32,
    pub height: f32,
    pub dpr: f32,
    pub ticks: u32,
    pub frame_ms: f64,
    /// Raw JSON props.
    pub config: Option<String>,
    pub scenario: Option<PathBuf>,
    /// Number of storm events; 0 disables.
    pub storm: usize,
    pub run_log: Option<PathBuf>,
    pub png: Option<PathBuf>,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            seed: None,
            width: 320.0,
            height: 180.0,
            dpr: 1.0,
            ticks: 120,
            frame_ms: 1000.0 / 60.0,
            config: None,
            scenario: None,
            storm: 0,
            run_log: None,
            png: None,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(Opts),
    Help,
    Version,
}

fn parse_value<T: std::str::FromStr>(flag: &str, val: &str) -> Result<T, String> {
    val.parse()
        .map_err(|_| format!("Invalid --{flag} value: {val}"))
}

/// Container extent: finite and non-negative.
fn parse_extent(flag: &str, val: &str) -> Result<f32, String> {
    match val.parse::<f32>() {
        Ok(n) if n.is_finite() && n >= 0.0 => Ok(n),
        _ => Err(format!("Invalid --{flag} value: {val}")),
    }
}

impl Opts {
    /// Parse the process arguments and environment, exiting on `--help`,
    /// `--version` or bad input.
    pub fn parse() -> Self {
        let args: Vec<String> = env::args().skip(1).collect();
        match Self::parse_from(&args, |key| env::var(key).ok()) {
            Ok(Command::Run(opts)) => opts,
            Ok(Command::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Command::Version) => {
                println!("flickergrid-harness {VERSION}");
                process::exit(0);
            }
            Err(msg) => {
                eprintln!("{msg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Parse `args` (without the program name), reading overrides through
    /// `var`.
    pub fn parse_from<F>(args: &[String], var: F) -> Result<Command, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        // Environment first.
        if let Some(val) = var("FLICKERGRID_SEED")
            && let Ok(n) = val.parse()
        {
            opts.seed = Some(n);
        }
        if let Some(val) = var("FLICKERGRID_WIDTH")
            && let Ok(n) = parse_extent("width", &val)
        {
            opts.width = n;
        }
        if let Some(val) = var("FLICKERGRID_HEIGHT")
            && let Ok(n) = parse_extent("height", &val)
        {
            opts.height = n;
        }
        if let Some(val) = var("FLICKERGRID_TICKS")
            && let Ok(n) = val.parse()
        {
            opts.ticks = n;
        }
        if let Some(val) = var("FLICKERGRID_RUN_LOG")
            && !val.is_empty()
        {
            opts.run_log = Some(PathBuf::from(val));
        }

        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Ok(Command::Help),
                "--version" | "-V" => return Ok(Command::Version),
                other => {
                    if let Some(val) = other.strip_prefix("--seed=") {
                        opts.seed = Some(parse_value("seed", val)?);
                    } else if let Some(val) = other.strip_prefix("--width=") {
                        opts.width = parse_extent("width", val)?;
                    } else if let Some(val) = other.strip_prefix("--height=") {
                        opts.height = parse_extent("height", val)?;
                    } else if let Some(val) = other.strip_prefix("--dpr=") {
                        opts.dpr = parse_value("dpr", val)?;
                    } else if let Some(val) = other.strip_prefix("--ticks=") {
                        opts.ticks = parse_value("ticks", val)?;
                    } else if let Some(val) = other.strip_prefix("--frame-ms=") {
                        opts.frame_ms = parse_value("frame-ms", val)?;
                    } else if let Some(val) = other.strip_prefix("--config=") {
                        opts.config = Some(val.to_string());
                    } else if let Some(val) = other.strip_prefix("--scenario=") {
                        opts.scenario = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--storm=") {
                        opts.storm = parse_value("storm", val)?;
                    } else if let Some(val) = other.strip_prefix("--run-log=") {
                        opts.run_log = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--png=") {
                        opts.png = Some(PathBuf::from(val));
                    } else {
                        return Err(format!("Unknown argument: {other}"));
                    }
                }
            }
        }

        Ok(Command::Run(opts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn default_opts() {
        let opts = Opts::default();
        assert_eq!(opts.seed, None);
        assert_eq!((opts.width, opts.height, opts.dpr), (320.0, 180.0, 1.0));
        assert_eq!(opts.ticks, 120);
        assert_eq!(opts.storm, 0);
        assert!(opts.run_log.is_none());
    }

    #[test]
    fn version_string_nonempty() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn help_text_lists_env_vars() {
        assert!(HELP_TEXT.contains("FLICKERGRID_SEED"));
        assert!(HELP_TEXT.contains(LOG_FILTER_ENV));
    }

    #[test]
    fn flags_parse() {
        let cmd = Opts::parse_from(
            &args(&[
                "--seed=9",
                "--width=200",
                "--height=100",
                "--dpr=2",
                "--ticks=5",
                "--storm=40",
                "--png=out/frame.png",
                "--config={\"gap\":2}",
            ]),
            no_env,
        )
        .unwrap();
        let Command::Run(opts) = cmd else {
            panic!("expected run");
        };
        assert_eq!(opts.seed, Some(9));
        assert_eq!((opts.width, opts.height, opts.dpr), (200.0, 100.0, 2.0));
        assert_eq!(opts.ticks, 5);
        assert_eq!(opts.storm, 40);
        assert_eq!(opts.png, Some(PathBuf::from("out/frame.png")));
        assert_eq!(opts.config.as_deref(), Some("{\"gap\":2}"));
    }

    #[test]
    fn env_overrides_defaults_flags_override_env() {
        let env = |key: &str| match key {
            "FLICKERGRID_SEED" => Some("5".to_string()),
            "FLICKERGRID_TICKS" => Some("7".to_string()),
            "FLICKERGRID_WIDTH" => Some("not-a-number".to_string()),
            _ => None,
        };
        let Ok(Command::Run(opts)) = Opts::parse_from(&args(&["--ticks=3"]), env) else {
            panic!("expected run");
        };
        assert_eq!(opts.seed, Some(5));
        assert_eq!(opts.ticks, 3);
        assert_eq!(opts.width, 320.0);
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert_eq!(
            Opts::parse_from(&args(&["--bogus", "-h"]), no_env),
            Err("Unknown argument: --bogus".to_string())
        );
        assert_eq!(Opts::parse_from(&args(&["-h"]), no_env), Ok(Command::Help));
        assert_eq!(
            Opts::parse_from(&args(&["--version"]), no_env),
            Ok(Command::Version)
        );
    }

    #[test]
    fn bad_values_are_reported() {
        assert_eq!(
            Opts::parse_from(&args(&["--seed=x"]), no_env),
            Err("Invalid --seed value: x".to_string())
        );
    }

    #[test]
    fn non_finite_extents_are_rejected() {
        assert_eq!(
            Opts::parse_from(&args(&["--width=inf", "--storm=5"]), no_env),
            Err("Invalid --width value: inf".to_string())
        );
        assert_eq!(
            Opts::parse_from(&args(&["--height=NaN"]), no_env),
            Err("Invalid --height value: NaN".to_string())
        );
        assert_eq!(
            Opts::parse_from(&args(&["--width=-1"]), no_env),
            Err("Invalid --width value: -1".to_string())
        );
        let env = |key: &str| (key == "FLICKERGRID_WIDTH").then(|| "inf".to_string());
        let Ok(Command::Run(opts)) = Opts::parse_from(&[], env) else {
            panic!("expected run");
        };
        assert_eq!(opts.width, 320.0);
    }
}
