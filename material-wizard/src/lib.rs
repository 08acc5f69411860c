// Material entry wizard: records construction materials against a project through the
// backend REST API. `wizard` holds the pure flow, `api` the HTTP collaborators, `tui` the
// terminal front-end.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod tui;
pub mod utils;
pub mod wizard;

use crate::config::Settings;
use log::{error, info};

#[derive(Clone, Copy)]
enum LogFormat {
    Json,
    Text,
}

fn render_record(
    format: LogFormat,
    message: &std::fmt::Arguments<'_>,
    record: &log::Record<'_>,
) -> String {
    let timestamp = match format {
        LogFormat::Json => chrono::Utc::now().to_rfc3339(),
        LogFormat::Text => chrono::Local::now()
            .format("%Y-%m-%d %H:%M:%S%.3f")
            .to_string(),
    };
    let message_str = format!("{}", message);
    let (phase, step, cleaned_message) = utils::logging::parse_log_metadata(&message_str);
    let line = utils::logging::LogLine::new(
        &timestamp,
        record.level(),
        record.target(),
        &cleaned_message,
        phase.as_deref(),
        step.as_deref(),
    );
    match format {
        LogFormat::Json => line.to_json(),
        LogFormat::Text => line.to_text(),
    }
}

/// Initialize logging with fern
///
/// Writes two files per run into the log folder:
/// - `material-wizard-<ts>.log`: one JSON object per line
/// - `material-wizard-<ts>.txt`: human-readable
///
/// stdout is optional and stays off in TUI mode so the terminal UI is not corrupted.
pub fn init_logging(with_stdout: bool, settings: &Settings) -> anyhow::Result<()> {
    let log_dir = utils::path_resolver::resolve_log_folder(settings.logging.dir.as_deref())?;

    let timestamp = chrono::Utc::now().format("%Y-%m-%d-%H%M%S");
    let json_log_file = log_dir.join(format!("material-wizard-{}.log", timestamp));
    let txt_log_file = log_dir.join(format!("material-wizard-{}.txt", timestamp));

    let mut dispatch = fern::Dispatch::new()
        .level(settings.logging.level_filter())
        // reqwest/hyper internals are noise at debug level.
        .level_for("hyper", log::LevelFilter::Warn)
        .level_for("hyper_util", log::LevelFilter::Warn)
        .level_for("reqwest", log::LevelFilter::Info);

    if with_stdout {
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "{}",
                        render_record(LogFormat::Text, message, record)
                    ))
                })
                .chain(std::io::stdout()),
        );
    }

    dispatch = dispatch
        .chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "{}",
                        render_record(LogFormat::Json, message, record)
                    ))
                })
                .chain(fern::log_file(&json_log_file)?),
        )
        .chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "{}",
                        render_record(LogFormat::Text, message, record)
                    ))
                })
                .chain(fern::log_file(&txt_log_file)?),
        );

    dispatch.apply()?;

    info!(
        "[PHASE: initialization] Logging initialized, log directory: {:?}",
        log_dir
    );
    Ok(())
}

/// Interactive terminal wizard.
pub fn run_tui(settings: &Settings, prefill_project: Option<&str>) {
    // TUI mode: file logging only.
    if let Err(e) = init_logging(false, settings) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!(
        "[PHASE: initialization] Material wizard starting, backend {}",
        settings.api.base_url
    );

    if let Err(e) = tui::run(settings, prefill_project) {
        error!("[PHASE: tui] Wizard failed: {:#}", e);
        eprintln!("Material wizard failed: {:#}", e);
        std::process::exit(1);
    }
}

/// Render a single TUI frame without a terminal and exit. Used by automated checks.
pub fn run_tui_smoke(settings: &Settings, target: Option<String>) {
    if let Err(e) = init_logging(false, settings) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let target = target.unwrap_or_else(|| "chooser".to_string());
    match tui::smoke(settings, &target) {
        Ok(()) => println!("TUI smoke OK: {}", target),
        Err(e) => {
            error!("[PHASE: tui] [STEP: smoke] Smoke render failed: {:#}", e);
            eprintln!("TUI smoke failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Print the effective configuration as TOML (auth token masked).
pub fn print_config(settings: &Settings) -> anyhow::Result<()> {
    let rendered = config::to_toml(settings)?;
    print!("{}", rendered);
    Ok(())
}
