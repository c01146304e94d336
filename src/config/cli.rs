use crate::config::Overrides;
use crate::domain::model::{BillForm, BillFormat};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "bill-manager")]
#[command(about = "Validate, save, and recall bills")]
#[command(version)]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding `Bills/` and `lastBill.json`
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Validate a bill and save it
    Save(SaveArgs),
    /// Show the most recently saved bill
    Last,
}

#[derive(Debug, Clone, Args)]
pub struct SaveArgs {
    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub price: String,

    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub items: String,

    #[arg(long, default_value = "")]
    pub filename: String,

    /// Output format; defaults to the configured format
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Json,
    Text,
}

impl From<FormatArg> for BillFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => Self::Json,
            FormatArg::Text => Self::Text,
        }
    }
}

impl SaveArgs {
    pub fn form(&self) -> BillForm {
        BillForm::new(
            self.description.as_str(),
            self.price.as_str(),
            self.items.as_str(),
            self.filename.as_str(),
        )
    }
}

impl CliConfig {
    pub fn overrides(&self) -> Overrides {
        let format = match &self.command {
            Command::Save(args) => args.format.map(BillFormat::from),
            Command::Last => None,
        };

        Overrides {
            root_dir: self.data_dir.clone(),
            format,
            verbose: self.verbose,
            log_json: self.log_json,
        }
    }
}
