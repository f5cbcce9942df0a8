use clap::{Args, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum ReportCommands {
    /// Show the canonical step timeline of a report
    Inspect(InspectArgs),
    /// Write SRT subtitles for the narrated steps
    Subtitles(SubtitlesArgs),
    /// Save the cropped screenshot of every step
    Screenshots(ScreenshotsArgs),
    /// Export step-by-step instructions as JSON with screenshots
    Export(ExportArgs),
    /// Generate a keyboard macro replaying the key presses of every recorded step
    Keys(KeysArgs),
    /// Narrate, trim and subtitle a screen recording of the session
    Build(BuildArgs),
    /// Show the narrator config file, creating it with defaults if missing
    Config,
}

/// Report selection shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Steps Recorder report (.mht file, .zip archive or http(s) URL)
    #[arg(value_hint = ValueHint::AnyPath)]
    pub report: String,

    /// Comma separated step indices to drop (1-based, as shown by inspect)
    #[arg(long, value_delimiter = ',')]
    pub remove: Vec<usize>,

    /// Rewrite generated descriptions into shorter spoken sentences
    #[arg(long)]
    pub tidy: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub common: ReportArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SubtitlesArgs {
    #[command(flatten)]
    pub common: ReportArgs,

    /// JSON array with the narration length in seconds of each step (null for none)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub durations: Option<PathBuf>,

    /// Output file; prints to stdout when omitted
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::FilePath)]
    pub out_file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ScreenshotsArgs {
    #[command(flatten)]
    pub common: ReportArgs,

    /// Directory to write screenshotN.<ext> files into
    #[arg(short = 'o', long = "out-dir", value_hint = ValueHint::DirPath)]
    pub out_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub common: ReportArgs,

    /// Directory for instructions.json and the screenshots
    #[arg(short = 'o', long = "out-dir", value_hint = ValueHint::DirPath)]
    pub out_dir: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScriptFormat {
    Json,
    Kbml,
}

#[derive(Args, Debug, Clone)]
pub struct KeysArgs {
    /// Steps Recorder report (.mht file, .zip archive or http(s) URL)
    #[arg(value_hint = ValueHint::AnyPath)]
    pub report: String,

    /// Macro format
    #[arg(long, value_enum, default_value = "json")]
    pub format: KeyScriptFormat,

    /// Output file; prints to stdout when omitted
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::FilePath)]
    pub out_file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub common: ReportArgs,

    /// Screen recording of the session
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub video: PathBuf,

    /// Output path; defaults to <report>_narrated.mp4 in the current directory
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::FilePath)]
    pub out_file: Option<PathBuf>,

    /// Directory for intermediate files; defaults to the cache directory
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub work_dir: Option<PathBuf>,

    /// Print the ffmpeg commands instead of running them (skips narration)
    #[arg(long)]
    pub dry_run: bool,
}
