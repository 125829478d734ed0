use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Diffraction image format detection and model extraction
#[derive(Parser, Debug)]
#[command(
    name = "dxformat",
    about = "Identify diffraction image formats and read their experiment models",
    version,
    author,
    long_about = "dxformat scores image files against every registered format, picks the \
                  most specific format that understands each file, and reads goniometer, \
                  detector, beam and scan models from its header. Files may be plain, \
                  gzip or bzip2 compressed, or given as URLs."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Resolve the format of one or more image files",
        long_about = "Scores each file against the registered formats and reports the \
                      format that would be used to read it.\n\n\
                      Examples:\n  \
                      dxformat find image_0001.ser\n  \
                      dxformat find --all *.ser\n  \
                      dxformat find -f json image_0001.ser.gz"
    )]
    Find(FindArgs),

    #[command(
        about = "Read the experiment models of one image file",
        long_about = "Resolves the format of a file, reads it and prints every model that \
                      could be built, with the reason for each one that could not.\n\n\
                      Examples:\n  \
                      dxformat show image_0001.ser\n  \
                      dxformat show --min-confidence 2 image_0001.ser\n  \
                      dxformat show -f yaml https://example.org/data/image_0001.ser"
    )]
    Show(ShowArgs),

    #[command(about = "List registered formats")]
    Formats(FormatsArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct FindArgs {
    #[arg(value_name = "FILES", required = true, help = "Image files or URLs")]
    pub files: Vec<PathBuf>,

    #[arg(long, help = "Show the score of every registered format")]
    pub all: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ShowArgs {
    #[arg(value_name = "FILE", help = "Image file or URL")]
    pub file: PathBuf,

    #[arg(
        long,
        value_name = "SCORE",
        help = "Minimum format score to accept (defaults to DXFORMAT_MIN_CONFIDENCE)"
    )]
    pub min_confidence: Option<u32>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct FormatsArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
