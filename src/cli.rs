use clap::Parser;
use std::path::PathBuf;

// Build version with target info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Math:   glam f64\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Oriented 3D box refinement over colored point clouds
#[derive(Parser, Debug, Default)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Annotation store root (one sub-directory per sample id)
    #[arg(short = 'd', long = "data-root", value_name = "DIR")]
    pub data_root: Option<PathBuf>,

    /// Sample id to open on startup (default: first id in the store)
    #[arg(short = 'i', long = "id", value_name = "ID")]
    pub id: Option<String>,

    /// Annotator name written into annotation_meta.json
    #[arg(short = 'u', long = "annotator", value_name = "NAME")]
    pub annotator: Option<String>,

    /// Enable debug logging to file (default: boxrefine.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}
