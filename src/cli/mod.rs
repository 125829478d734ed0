pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, FindArgs, FormatsArgs, OutputFormatArg, ShowArgs};
pub use output::{FindReport, InstanceReport, OutputFormat, OutputFormatter};
