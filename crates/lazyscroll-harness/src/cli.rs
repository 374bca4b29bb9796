#![forbid(unsafe_code)]

//! Command-line argument parsing for `lazyscroll-sim`.
//!
//! Parses args manually to keep the binary lean. Supports environment
//! variable overrides via the `LAZYSCROLL_SIM_*` prefix; flags win over env.

use std::env;
use std::process;

use lazyscroll_core::logging::LogFormat;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
lazyscroll-sim: scripted session against a fake paged dataset

USAGE:
    lazyscroll-sim [OPTIONS]

OPTIONS:
    --data-size=N        Rows in the fake dataset (default: 1000)
    --start-index=N      Row the first page starts at (default: 0)
    --page-size=N        Rows per fetched page (default: 20)
    --height=PX          Viewport height in pixels (default: 300)
    --row-height=PX      Row height in pixels (default: 30)
    --steps=N            Scroll steps in each direction (default: 40)
    --stride=PX          Pixels scrolled per step (default: 90)
    --latency=N          Steps before a fetch is delivered (default: 1)
    --seed=N             Dataset seed (default: 0)
    --malformed-every=N  Drop the id of every Nth row (default: off)
    --jsonl=PATH         Write the step trace as JSONL ('-' for stdout)
    --log-format=FMT     Log format: 'full', 'compact' or 'json' (default: full)
    --help, -h           Show this help message
    --version, -V        Show version

ENVIRONMENT VARIABLES:
    LAZYSCROLL_SIM_DATA_SIZE       Override --data-size
    LAZYSCROLL_SIM_START_INDEX     Override --start-index
    LAZYSCROLL_SIM_PAGE_SIZE       Override --page-size
    LAZYSCROLL_SIM_STEPS           Override --steps
    LAZYSCROLL_SIM_LATENCY         Override --latency
    LAZYSCROLL_SIM_SEED            Override --seed
    LAZYSCROLL_SIM_JSONL           Override --jsonl
    LAZYSCROLL_SIM_LOG_FORMAT      Override --log-format
    LAZYSCROLL_LOG                 Log filter (falls back to RUST_LOG)
    LAZYSCROLL_*                   Scroller settings (id prop, overscan, ...)";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq)]
pub struct Opts {
    /// Rows in the fake dataset.
    pub data_size: usize,
    /// Row the first page starts at.
    pub start_index: usize,
    /// Rows per fetched page.
    pub page_size: usize,
    /// Viewport height in pixels.
    pub height: f64,
    /// Row height in pixels.
    pub row_height: f64,
    /// Scroll steps in each direction.
    pub steps: usize,
    /// Pixels scrolled per step.
    pub stride: f64,
    /// Steps before a fetch is delivered.
    pub latency: u64,
    /// Dataset seed.
    pub seed: u64,
    /// Drop the id of every Nth row (0 = never).
    pub malformed_every: usize,
    /// Trace output path, `-` for stdout.
    pub jsonl: Option<String>,
    /// Subscriber format.
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParseError {
    Help,
    Version,
    InvalidValue { flag: &'static str, value: String },
    UnknownArg(String),
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            data_size: 1000,
            start_index: 0,
            page_size: 20,
            height: 300.0,
            row_height: 30.0,
            steps: 40,
            stride: 90.0,
            latency: 1,
            seed: 0,
            malformed_every: 0,
            jsonl: None,
            log_format: LogFormat::Full,
        }
    }
}

fn parse_flag<T: std::str::FromStr>(flag: &'static str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue {
        flag,
        value: value.to_string(),
    })
}

fn parse_pixels(flag: &'static str, value: &str) -> Result<f64, ParseError> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed);
    match number.parse::<f64>() {
        Ok(px) if px.is_finite() && px > 0.0 => Ok(px),
        _ => Err(ParseError::InvalidValue {
            flag,
            value: value.to_string(),
        }),
    }
}

impl Opts {
    /// Parse command-line arguments and environment variables.
    ///
    /// Environment variables take precedence over defaults but are overridden
    /// by explicit command-line flags.
    pub fn parse() -> Self {
        match Self::parse_from_env_and_args(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(opts) => opts,
            Err(ParseError::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Err(ParseError::Version) => {
                println!("lazyscroll-sim {VERSION}");
                process::exit(0);
            }
            Err(ParseError::InvalidValue { flag, value }) => {
                eprintln!("Invalid {flag} value: {value}");
                process::exit(1);
            }
            Err(ParseError::UnknownArg(arg)) => {
                eprintln!("Unknown argument: {arg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    fn parse_from_env_and_args<I, S, F>(args: I, get_env: F) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        // Environment first
        if let Some(val) = get_env("LAZYSCROLL_SIM_DATA_SIZE")
            && let Ok(n) = val.parse()
        {
            opts.data_size = n;
        }
        if let Some(val) = get_env("LAZYSCROLL_SIM_START_INDEX")
            && let Ok(n) = val.parse()
        {
            opts.start_index = n;
        }
        if let Some(val) = get_env("LAZYSCROLL_SIM_PAGE_SIZE")
            && let Ok(n) = val.parse()
        {
            opts.page_size = n;
        }
        if let Some(val) = get_env("LAZYSCROLL_SIM_STEPS")
            && let Ok(n) = val.parse()
        {
            opts.steps = n;
        }
        if let Some(val) = get_env("LAZYSCROLL_SIM_LATENCY")
            && let Ok(n) = val.parse()
        {
            opts.latency = n;
        }
        if let Some(val) = get_env("LAZYSCROLL_SIM_SEED")
            && let Ok(n) = val.parse()
        {
            opts.seed = n;
        }
        if let Some(val) = get_env("LAZYSCROLL_SIM_JSONL")
            && !val.trim().is_empty()
        {
            opts.jsonl = Some(val);
        }
        if let Some(val) = get_env("LAZYSCROLL_SIM_LOG_FORMAT")
            && let Some(format) = LogFormat::parse(&val)
        {
            opts.log_format = format;
        }

        // Then flags
        for arg in args {
            let arg = arg.as_ref();
            match arg {
                "--help" | "-h" => return Err(ParseError::Help),
                "--version" | "-V" => return Err(ParseError::Version),
                other => {
                    if let Some(val) = other.strip_prefix("--data-size=") {
                        opts.data_size = parse_flag("--data-size", val)?;
                    } else if let Some(val) = other.strip_prefix("--start-index=") {
                        opts.start_index = parse_flag("--start-index", val)?;
                    } else if let Some(val) = other.strip_prefix("--page-size=") {
                        opts.page_size = parse_flag("--page-size", val)?;
                        if opts.page_size == 0 {
                            return Err(ParseError::InvalidValue {
                                flag: "--page-size",
                                value: val.to_string(),
                            });
                        }
                    } else if let Some(val) = other.strip_prefix("--height=") {
                        opts.height = parse_pixels("--height", val)?;
                    } else if let Some(val) = other.strip_prefix("--row-height=") {
                        opts.row_height = parse_pixels("--row-height", val)?;
                    } else if let Some(val) = other.strip_prefix("--steps=") {
                        opts.steps = parse_flag("--steps", val)?;
                    } else if let Some(val) = other.strip_prefix("--stride=") {
                        opts.stride = parse_pixels("--stride", val)?;
                    } else if let Some(val) = other.strip_prefix("--latency=") {
                        opts.latency = parse_flag("--latency", val)?;
                    } else if let Some(val) = other.strip_prefix("--seed=") {
                        opts.seed = parse_flag("--seed", val)?;
                    } else if let Some(val) = other.strip_prefix("--malformed-every=") {
                        opts.malformed_every = parse_flag("--malformed-every", val)?;
                    } else if let Some(val) = other.strip_prefix("--jsonl=") {
                        opts.jsonl = Some(val.to_string());
                    } else if let Some(val) = other.strip_prefix("--log-format=") {
                        opts.log_format =
                            LogFormat::parse(val).ok_or_else(|| ParseError::InvalidValue {
                                flag: "--log-format",
                                value: val.to_string(),
                            })?;
                    } else {
                        return Err(ParseError::UnknownArg(other.to_string()));
                    }
                }
            }
        }

        Ok(opts)
    }
}
