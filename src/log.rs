//! Logging for ptxsim runs.
//!
//! Ordinary messages are printed to stdout and warnings and errors to stderr, coloured when the
//! stream is a terminal. A run also copies its messages into two files in the output folder.
use anyhow::{Context, Result, bail};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{Level, LevelFilter, Record};
use std::env;
use std::fmt::Arguments;
use std::fs::File;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// Environment variable which takes precedence over the configured log level
const LOG_LEVEL_VAR: &str = "PTXSIM_LOG_LEVEL";

/// The log level used when neither the environment nor the settings file gives one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Messages below warning level from a run
const LOG_INFO_FILE_NAME: &str = "ptxsim_info.log";

/// Warnings and errors from a run
const LOG_ERROR_FILE_NAME: &str = "ptxsim_error.log";

/// Whether [`init`] has already succeeded
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Set up the program logger.
///
/// The level comes from `PTXSIM_LOG_LEVEL` if set, otherwise from `configured_level`, otherwise
/// [`DEFAULT_LOG_LEVEL`]. Valid levels are `off`, `error`, `warn`, `info`, `debug` and `trace`.
///
/// If `output_dir` is given, `ptxsim_info.log` and `ptxsim_error.log` are (re)created in it. The
/// info file always records at least `info` messages, whatever the terminal level.
pub fn init(configured_level: Option<&str>, output_dir: Option<&Path>) -> Result<()> {
    let level = match env::var(LOG_LEVEL_VAR) {
        Ok(level) => parse_log_level(&level).with_context(|| format!("Invalid {LOG_LEVEL_VAR}"))?,
        Err(_) => parse_log_level(configured_level.unwrap_or(DEFAULT_LOG_LEVEL))?,
    };

    let mut dispatch = Dispatch::new()
        .chain(
            terminal_chain(std::io::stdout().is_terminal())
                .filter(|metadata| metadata.level() > Level::Warn)
                .level(level)
                .chain(std::io::stdout()),
        )
        .chain(
            terminal_chain(std::io::stderr().is_terminal())
                .level(level.min(LevelFilter::Warn))
                .chain(std::io::stderr()),
        );

    if let Some(output_dir) = output_dir {
        let create = |name: &str| {
            let path = output_dir.join(name);
            File::create(&path)
                .with_context(|| format!("Could not create log file {}", path.display()))
        };
        dispatch = dispatch
            .chain(
                Dispatch::new()
                    .filter(|metadata| metadata.level() > Level::Warn)
                    .format(|out, message, record| write_line(out, message, record, None))
                    .level(level.max(LevelFilter::Info))
                    .chain(create(LOG_INFO_FILE_NAME)?),
            )
            .chain(
                Dispatch::new()
                    .format(|out, message, record| write_line(out, message, record, None))
                    .level(LevelFilter::Warn)
                    .chain(create(LOG_ERROR_FILE_NAME)?),
            );
    }

    dispatch.apply().context("Logger already initialised")?;
    let _ = LOGGER_INIT.set(());

    Ok(())
}

/// Convert a log level name (in any case) to a [`LevelFilter`]
pub fn parse_log_level(name: &str) -> Result<LevelFilter> {
    let level = match name.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    };

    Ok(level)
}

/// A dispatch for a terminal stream, coloured if `colour` is set
fn terminal_chain(colour: bool) -> Dispatch {
    let colours = colour.then(|| {
        ColoredLevelConfig::new()
            .error(Color::Red)
            .warn(Color::Yellow)
            .info(Color::Green)
            .debug(Color::Blue)
            .trace(Color::Magenta)
    });

    Dispatch::new().format(move |out, message, record| {
        write_line(out, message, record, colours.as_ref());
    })
}

/// Format one message as `[HH:MM:SS LEVEL target] message`
fn write_line(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    colours: Option<&ColoredLevelConfig>,
) {
    let timestamp = Local::now().format("%H:%M:%S");
    let target = record.target();
    match colours {
        Some(colours) => {
            let level = colours.color(record.level());
            out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
        }
        None => {
            let level = record.level();
            out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
        }
    }
}
