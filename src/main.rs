mod archive;
mod args;
mod colors;
mod component;
mod config;
mod installer;
mod layout;
mod license;
mod platform;
mod retry;
mod runtime;
mod tool;
mod vars;
mod version;

use crate::args::Args;
use crate::colors::*;
use crate::config::*;
use crate::installer::{InstallError, Installer};
use crate::layout::Layout;
use crate::platform::PlatformInfo;
use crate::runtime::NodeRuntime;
use crate::tool::CdkTool;
use crate::version::{Info, Version};
use anyhow::anyhow;
use clap::Parser;
use std::panic;
use std::path::{self, Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use tracing::{level_filters::*, *};
use tracing_subscriber::EnvFilter;

// Exit code used in case there were no errors.
#[doc(hidden)]
const EXIT_OK: i32 = 0;

// Exit code used in case of errors.
#[doc(hidden)]
const EXIT_NOK: i32 = 1;

// Maximum number of characters printed per license notice.
#[doc(hidden)]
const LICENSE_EXCERPT_CHARS: usize = 1000;

/// Main entry point for the application.
fn main() {
    // enable ansi support to use colorised/styled output
    #[cfg(windows)]
    let _ = nu_ansi_term::enable_ansi_support();

    // delegate, a panic ends up as a failed run as well
    let result = panic::catch_unwind(internal_main);
    std::process::exit(exit_code(result));
}

// Maps the result of the internal main entry point to the exit code, reporting errors not reported yet.
#[doc(hidden)]
fn exit_code(result: thread::Result<anyhow::Result<()>>) -> i32 {
    match result {
        Ok(Ok(())) => EXIT_OK,
        // the installer already logged the failed step
        Ok(Err(err)) if err.is::<InstallError>() => EXIT_NOK,
        Ok(Err(err)) => {
            let err_str = ATTENTION_COLOR.paint(format!("err = {err:#}"));
            eprintln!("Failed!\r\n\t{err_str}");
            EXIT_NOK
        }
        // the panic hook already printed the message
        Err(_) => EXIT_NOK,
    }
}

// Internal main entry point for the application.
#[doc(hidden)]
fn internal_main() -> anyhow::Result<()> {
    // remember start date/time
    let start = Instant::now();

    // parse arguments
    let args = Args::parse();

    // stop here in case only the version was requested
    if args.version {
        print_version();
        return Ok(());
    }

    // init tracing
    init_tracing(&args);

    // print parsed arguments
    trace!("arguments: {args:#?}");

    // load settings, they stay fixed for the whole run
    let (settings, basedir) = load_settings(&args)?;
    debug!(?settings);
    debug!(basedir = %basedir.display());

    // resolve install directory
    let platform = PlatformInfo::detect();
    let directory = args.directory.as_deref().unwrap_or(&settings.config.directory);
    let layout = Layout::resolve(&basedir, directory, &platform, &settings.config.node.version)?;
    let path = PATH_COLOR.paint(layout.root().to_string_lossy());

    // the license notices don't need anything else
    if args.license {
        print_licenses(&layout);
        return Ok(());
    }

    let runtime = NodeRuntime::new(&settings.config.node, &layout, platform.clone());
    let tool = CdkTool::new(&settings.config.cdk, &layout);

    if args.info {
        println!("{}", Info::collect(platform, &layout, &runtime, &tool, &settings.config.cdk.package));
        return Ok(());
    }

    if !args.quiet {
        println!("Processing installation at {path}");
    }

    let installer = Installer::new(platform, Box::new(runtime), Box::new(tool), license::records(&layout), settings.offline);
    if args.install {
        installer.reinstall_tool()?;
        info!("AWS CDK installed successfully");
    } else {
        let report = installer.run()?;
        debug!(runtime = ?report.runtime, tool = ?report.tool, licenses_written = report.licenses_written);
        if !report.runtime.attempted() && !report.tool.attempted() {
            info!("Node.js and AWS CDK are already present.");
        }
        info!("AWS CDK wrapper successfully installed.");
    }

    // print some statistics
    if !args.quiet {
        println!("Processed installation at  {path}");
        let elapsed = start.elapsed();
        println!("Total time: {}", format_elapsed(elapsed));
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        println!("Finished at: {}", format_now(now));
    }

    Ok(())
}

// Loads the settings and determines the base directory for relative paths.
#[doc(hidden)]
fn load_settings(args: &Args) -> anyhow::Result<(Settings, PathBuf)> {
    let offline = args.offline || offline_from_env();

    // without config file everything is relative to the executable, which lives inside the package
    let Some(config_path) = &args.config else {
        let exe = std::env::current_exe()?;
        let basedir = exe.parent().ok_or_else(|| anyhow!("failed to determine base directory"))?.to_path_buf();
        return Ok((Settings { config: Config::default(), offline }, basedir));
    };

    let config_path = PathBuf::from(config_path);
    let config_path = path::absolute(&config_path).unwrap_or(config_path);
    info!("Using configuration from {}.", config_path.display());
    let config = Config::load_from_file(&config_path)?;
    let basedir = config_path.parent().map(Path::to_path_buf).ok_or_else(|| anyhow!("failed to determine base directory"))?;

    Ok((Settings { config, offline }, basedir))
}

// Prints the license notices present in the install directory.
#[doc(hidden)]
fn print_licenses(layout: &Layout) {
    println!("License Information:");
    println!("--------------------");
    let mut found = false;
    for record in license::records(layout) {
        let Some(text) = record.installed_text() else {
            debug!(path = %record.target_path.display(), "license notice missing");
            continue;
        };
        found = true;
        let title = record.title();
        println!();
        println!("{}", TITLE_COLOR.paint(title));
        println!("{}", "-".repeat(title.len()));
        println!("{}", license::excerpt(text.trim(), LICENSE_EXCERPT_CHARS));
    }
    if !found {
        let path = PATH_COLOR.paint(layout.root().to_string_lossy());
        println!("No license notices found at {path}");
    }
}

// Formats the elapsed time with a resolution of seconds.
#[doc(hidden)]
fn format_elapsed(elapsed: Duration) -> String {
    // null out everything below seconds
    let elapsed = Duration::from_secs(elapsed.as_secs());

    // format the remaining duration
    humantime::format_duration(elapsed).to_string()
}

// Formats the given date/time in the local offset (UTC as fallback).
#[doc(hidden)]
fn format_now(now: OffsetDateTime) -> String {
    // define format
    const FORMAT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory][offset_minute]");

    // local offset or UTC
    let offset = UtcOffset::current_local_offset();
    let offset = offset.unwrap_or(UtcOffset::UTC);
    trace!(?offset);

    // format
    let now = now.to_offset(offset);
    now.format(&FORMAT).unwrap_or(now.to_string())
}

// Prints the version and the path of the executable.
#[doc(hidden)]
fn print_version() {
    let version = Version::default();
    if let Ok(exe) = std::env::current_exe() {
        let exe = PATH_COLOR.paint(exe.to_string_lossy());
        println!("{version} [{exe}]");
    } else {
        println!("{version}");
    }
}

// Initialises the tracing framework based on given command line arguments.
#[doc(hidden)]
fn init_tracing(args: &Args) {
    // warnings of a post-install hook must be visible by default
    let level_filter = match (args.quiet, args.verbose) {
        (true, _) => LevelFilter::ERROR.into(),
        (false, 0) => LevelFilter::INFO.into(),
        (false, 1) => LevelFilter::DEBUG.into(),
        (false, _) => LevelFilter::TRACE.into(),
    };
    let env_filter = EnvFilter::from_default_env().add_directive(level_filter);
    tracing_subscriber::fmt() //
        .with_env_filter(env_filter)
        .with_target(false)
        .without_time()
        .init();
}

#[cfg(test)]
mod tests {

    use super::*;
    use test_log::test;

    #[test]
    fn elapsed_drops_fractions() {
        assert_eq!(format_elapsed(Duration::from_millis(61_999)), "1m 1s");
    }

    #[test]
    fn load_settings_from_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let config_path = tempdir.path().join("cdk-installer.yml");
        std::fs::write(&config_path, "directory: cdk\ncdk:\n  version: 2\n").unwrap();
        let config_arg = config_path.to_string_lossy().into_owned();
        let args = Args::try_parse_from(["program", "--offline", "--config", config_arg.as_str()]).unwrap();

        let (settings, basedir) = load_settings(&args).unwrap();
        assert!(settings.offline);
        assert_eq!(settings.config.directory, "cdk");
        assert_eq!(settings.config.cdk.package_spec(), "aws-cdk@2");
        assert_eq!(basedir, tempdir.path());
    }

    #[test]
    fn load_settings_with_broken_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let config_path = tempdir.path().join("cdk-installer.yml");
        std::fs::write(&config_path, "unknown: true\n").unwrap();
        let config_arg = config_path.to_string_lossy().into_owned();
        let args = Args::try_parse_from(["program", "--config", config_arg.as_str()]).unwrap();

        assert!(load_settings(&args).is_err());
    }

    #[test]
    fn exit_code_of_successful_run() {
        assert_eq!(exit_code(Ok(Ok(()))), EXIT_OK);
    }

    #[test]
    fn exit_code_of_failed_install_step() {
        let err = anyhow::Error::from(InstallError::Tool("AWS CDK".to_string()));
        assert_eq!(exit_code(Ok(Err(err))), EXIT_NOK);
    }

    #[test]
    fn exit_code_of_unexpected_error() {
        assert_eq!(exit_code(Ok(Err(anyhow!("broken config")))), EXIT_NOK);
    }

    #[test]
    fn exit_code_of_panic() {
        let result = panic::catch_unwind(|| -> anyhow::Result<()> { panic!("unexpected state") });
        assert_eq!(exit_code(result), EXIT_NOK);
    }
}
