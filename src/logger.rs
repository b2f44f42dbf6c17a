//! Process logging on top of `log4rs`.
//!
//! Two categories are routed to separate rolling files:
//! - `app.log`: everything logged through the `log` facade
//! - `metrics.log`: per-iteration timings, logged on target [`METRICS_TARGET`]

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};

/// Log target for benchmark metrics lines.
pub const METRICS_TARGET: &str = "tripbench::metrics";

const ROLL_SIZE: u64 = 10 * 1024 * 1024;
const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";

/// Parse a level name; unknown names fall back to `info`.
pub fn parse_level(level: Option<&str>) -> LevelFilter {
    match level.unwrap_or("info").to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn rolling(
    base: &Path,
    stem: &str,
    keep: u32,
) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", base.join(format!("{stem}.{{}}.log")).display()), keep)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    let appender = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))?;
    Ok(appender)
}

/// Build the file logging configuration without installing it.
///
/// # Errors
/// Returns an error if the directory cannot be created or an appender cannot open its file.
pub fn build_config(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<usize>,
    console: bool,
) -> Result<Config, Box<dyn std::error::Error>> {
    let base = dir
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    std::fs::create_dir_all(&base)?;
    let keep = u32::try_from(retention.unwrap_or(7)).unwrap_or(7);
    let lvl = parse_level(level);

    let mut builder = Config::builder()
        .appender(Appender::builder().build("app", Box::new(rolling(&base, "app", keep)?)))
        .appender(Appender::builder().build("metrics", Box::new(rolling(&base, "metrics", keep)?)))
        .logger(
            Logger::builder()
                .appender("metrics")
                .additive(false)
                .build(METRICS_TARGET, lvl),
        );
    let mut root = Root::builder().appender("app");
    if console {
        let stderr = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new("[{l}] {m}{n}")))
            .build();
        builder = builder.appender(Appender::builder().build("console", Box::new(stderr)));
        root = root.appender("console");
    }
    Ok(builder.build(root.build(lvl))?)
}

/// Configure logging globally for the process. A second initialisation is ignored.
/// - dir: base directory for logs; if None, current directory.
/// - level: off|error|warn|info|debug|trace
/// - retention: number of rolled files to keep (default 7)
///
/// # Errors
/// Returns an error if the log directory or files cannot be created.
pub fn configure_logging(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(dir, level, retention, false)?;
    let _ = log4rs::init_config(config);
    Ok(())
}

/// Log to stderr only, for interactive CLI use.
pub fn init_console(level: Option<&str>) {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("[{l}] {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("console", Box::new(stderr)))
        .build(Root::builder().appender("console").build(parse_level(level)));
    if let Ok(config) = config {
        let _ = log4rs::init_config(config);
    }
}

/// Files plus stderr when `dir` is given, stderr alone otherwise. Falls back
/// to stderr if the log files cannot be opened.
pub fn init_with(dir: Option<&Path>, level: Option<&str>, retention: Option<usize>) {
    let Some(dir) = dir else {
        init_console(level);
        return;
    };
    match build_config(Some(dir), level, retention, true) {
        Ok(config) => {
            let _ = log4rs::init_config(config);
        }
        Err(e) => {
            init_console(level);
            log::warn!("file logging unavailable ({e}); using stderr");
        }
    }
}

/// Configure logging from environment variables if present:
/// - TRIPBENCH_LOG_DIR (files are only written when this is set)
/// - TRIPBENCH_LOG_LEVEL
/// - TRIPBENCH_LOG_RETENTION
pub fn configure_from_env() {
    let dir = std::env::var("TRIPBENCH_LOG_DIR").ok().map(PathBuf::from);
    let level = std::env::var("TRIPBENCH_LOG_LEVEL").ok();
    let retention =
        std::env::var("TRIPBENCH_LOG_RETENTION").ok().and_then(|s| s.parse::<usize>().ok());
    init_with(dir.as_deref(), level.as_deref(), retention);
}
