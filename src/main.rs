use boxrefine::app::AnnotatorApp;
use boxrefine::cli::Args;
use boxrefine::config::{EditorSettings, SETTINGS_FILE};
use boxrefine::paths;

use clap::Parser;
use eframe::egui;
use log::{debug, info, warn};

/// eframe window/app state, kept apart from the editable settings file.
const WINDOW_STATE_FILE: &str = "boxrefine_window.ron";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Create path configuration from CLI args and environment
    let path_config = paths::PathConfig::from_env_and_cli(args.config_dir.clone());
    if let Err(e) = paths::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {}", e);
    }

    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .clone()
            .unwrap_or_else(|| paths::data_file("boxrefine.log", &path_config));
        let file = std::fs::File::create(&log_path)
            .map_err(|e| format!("Failed to create log file {}: {}", log_path.display(), e))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .filter_module("egui", log::LevelFilter::Info)
            .filter_module("eframe", log::LevelFilter::Info)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging, RUST_LOG wins if set
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .filter_module("egui", log::LevelFilter::Info)
            .filter_module("eframe", log::LevelFilter::Info)
            .format_timestamp_millis()
            .init();
    }

    info!("boxrefine {} starting", env!("CARGO_PKG_VERSION"));
    debug!("Command-line args: {:?}", args);

    let settings_path = paths::config_file(SETTINGS_FILE, &path_config);
    info!("Settings: {}", settings_path.display());
    let mut settings = EditorSettings::load(&settings_path).unwrap_or_else(|e| {
        warn!("{:#}; using defaults", e);
        EditorSettings::default()
    });
    if let Some(name) = &args.annotator {
        settings.annotator = name.clone();
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!("boxrefine v{}", env!("CARGO_PKG_VERSION")))
            .with_inner_size([1400.0, 900.0])
            .with_resizable(true),
        persist_window: true,
        persistence_path: Some(paths::data_file(WINDOW_STATE_FILE, &path_config)),
        ..Default::default()
    };

    let data_root = args.data_root.clone();
    let initial_id = args.id.clone();

    eframe::run_native(
        "boxrefine",
        native_options,
        Box::new(move |cc| {
            // View state from the last session, if any
            let mut app: AnnotatorApp = cc
                .storage
                .and_then(|storage| storage.get_string(eframe::APP_KEY))
                .and_then(|json| serde_json::from_str(&json).ok())
                .unwrap_or_else(|| {
                    info!("No persisted state found, creating default app");
                    AnnotatorApp::default()
                });

            app.attach(path_config, settings, data_root);
            app.open_initial(initial_id.as_deref());
            Ok(Box::new(app))
        }),
    )?;

    Ok(())
}
