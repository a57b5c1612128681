//! rltail - Terminal Log Tail Viewer
//!
//! Follows a growing log file with a bounded in-memory history, live search and formatting.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use rltail::render::ui::ColorTheme;
use rltail::render::TerminalUI;
use rltail::{Application, FileSource, ViewerConfig};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn cli() -> Command {
    Command::new("rltail")
        .version(rltail::VERSION)
        .about("A terminal log tail viewer with live search")
        .long_about(
            "rltail follows a log file, keeping the most recent records in a bounded buffer. \
             Search, paging and formatting stay consistent while old records are evicted.",
        )
        .arg(
            Arg::new("file")
                .help("Path to the log file to follow")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file (defaults to <config dir>/rltail/config.toml)"),
        )
        .arg(
            Arg::new("capacity")
                .long("capacity")
                .value_name("RECORDS")
                .value_parser(value_parser!(usize))
                .help("Maximum number of records kept in memory"),
        )
        .arg(
            Arg::new("refresh")
                .long("refresh")
                .value_name("SECONDS")
                .value_parser(value_parser!(u64))
                .help("Seconds between polls for new records"),
        )
        .arg(
            Arg::new("raw")
                .long("raw")
                .action(ArgAction::SetTrue)
                .help("Start in raw mode instead of formatted"),
        )
        .arg(
            Arg::new("no-follow")
                .long("no-follow")
                .action(ArgAction::SetTrue)
                .help("Start with follow mode disabled"),
        )
        .arg(
            Arg::new("regex")
                .long("regex")
                .action(ArgAction::SetTrue)
                .help("Treat search queries as regular expressions"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Write diagnostics to this file"),
        )
}

/// Base configuration plus command-line overrides, and the config file that was read.
fn load_config(matches: &ArgMatches) -> Result<(ViewerConfig, Option<PathBuf>)> {
    let (config, path) = base_config(matches.get_one::<PathBuf>("config"))?;
    Ok((apply_overrides(config, matches)?, path))
}

fn apply_overrides(mut config: ViewerConfig, matches: &ArgMatches) -> Result<ViewerConfig> {
    if let Some(&capacity) = matches.get_one::<usize>("capacity") {
        config.capacity = capacity;
    }
    if let Some(&refresh) = matches.get_one::<u64>("refresh") {
        config.refresh_interval_secs = refresh;
    }
    if matches.get_flag("raw") {
        config.start_formatted = false;
    }
    if matches.get_flag("no-follow") {
        config.start_following = false;
    }
    if matches.get_flag("regex") {
        config.regex_search = true;
    }
    if let Some(path) = matches.get_one::<PathBuf>("log-file") {
        config.log_file = Some(path.clone());
    }

    config.validate()?;
    Ok(config)
}

#[cfg(feature = "config")]
fn base_config(path: Option<&PathBuf>) -> Result<(ViewerConfig, Option<PathBuf>)> {
    Ok(match path {
        Some(path) => (ViewerConfig::load(path)?, Some(path.clone())),
        None => ViewerConfig::discover()?,
    })
}

#[cfg(not(feature = "config"))]
fn base_config(path: Option<&PathBuf>) -> Result<(ViewerConfig, Option<PathBuf>)> {
    if path.is_some() {
        anyhow::bail!("This build does not support configuration files");
    }
    Ok((ViewerConfig::default(), None))
}

/// The TUI owns the terminal, so diagnostics go to a file when one is configured.
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Cannot open log file {}", path.display()))?;
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
        None => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error"))
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let Some(file_path) = matches.get_one::<PathBuf>("file").cloned() else {
        anyhow::bail!("A log file path is required");
    };

    if !file_path.exists() {
        anyhow::bail!("File does not exist: {}", file_path.display());
    }

    if !file_path.is_file() {
        anyhow::bail!("Path is not a regular file: {}", file_path.display());
    }

    let (config, config_path) = load_config(&matches)?;
    init_logging(config.log_file.as_deref())?;
    log::info!("rltail {} starting on {}", rltail::VERSION, file_path.display());
    if let Some(path) = &config_path {
        log::info!("Loaded configuration from {}", path.display());
    }

    let source = Arc::new(FileSource::open(&file_path, config.capacity)?);
    let theme = ColorTheme::from_scheme(&config.colors);
    let ui_renderer = Box::new(TerminalUI::with_theme(theme)?);

    let mut app = Application::new(config, source, ui_renderer);
    app.run().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert!(!rltail::VERSION.is_empty());
    }

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn flags_override_config() {
        let matches = cli()
            .try_get_matches_from([
                "rltail",
                "app.log",
                "--config",
                "/nonexistent/rltail.toml",
            ])
            .unwrap();
        assert!(load_config(&matches).is_err());

        let matches = cli()
            .try_get_matches_from([
                "rltail",
                "app.log",
                "--capacity",
                "10",
                "--refresh",
                "2",
                "--raw",
                "--no-follow",
                "--regex",
            ])
            .unwrap();
        let config = apply_overrides(ViewerConfig::default(), &matches).unwrap();
        assert_eq!(config.capacity, 10);
        assert_eq!(config.refresh_interval_secs, 2);
        assert!(!config.start_formatted);
        assert!(!config.start_following);
        assert!(config.regex_search);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let matches = cli()
            .try_get_matches_from(["rltail", "app.log", "--capacity", "0"])
            .unwrap();
        assert!(apply_overrides(ViewerConfig::default(), &matches).is_err());
    }

    #[cfg(feature = "config")]
    #[test]
    fn explicit_config_file_is_read_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "capacity = 7\nregex_search = true\n").unwrap();

        let config_arg = path.to_string_lossy().into_owned();
        let matches = cli()
            .try_get_matches_from([
                "rltail",
                "app.log",
                "--config",
                config_arg.as_str(),
                "--refresh",
                "3",
            ])
            .unwrap();
        let (config, used) = load_config(&matches).unwrap();
        assert_eq!(used.as_deref(), Some(path.as_path()));
        assert_eq!(config.capacity, 7);
        assert!(config.regex_search);
        assert_eq!(config.refresh_interval_secs, 3);
    }
}
