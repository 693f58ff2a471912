// src/cli.rs
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ConfigOverrides;

/// Preview EPS files as SVG, converted with ps2pdf and pdf2svg
#[derive(Parser, Debug)]
#[command(name = "epsview", version)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// ps2pdf executable
    #[arg(long, value_name = "PATH", global = true)]
    pub ps2pdf: Option<String>,

    /// pdf2svg executable
    #[arg(long, value_name = "PATH", global = true)]
    pub pdf2svg: Option<String>,

    /// Per-tool timeout in seconds (0 disables)
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Directory for the generated html previews
    #[arg(short, long, value_name = "DIR", global = true)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert each input once and exit
    Render {
        /// Files, directories or glob patterns
        #[arg(required = true, value_name = "INPUTS")]
        inputs: Vec<String>,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,
    },
    /// Keep previews up to date as the inputs change
    Watch {
        /// Files, directories or glob patterns
        #[arg(required = true, value_name = "INPUTS")]
        inputs: Vec<String>,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Print status lines instead of the dashboard
        #[arg(long)]
        no_tui: bool,
    },
}

impl CliArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            ps2pdf: self.ps2pdf.clone(),
            pdf2svg: self.pdf2svg.clone(),
            timeout_secs: self.timeout,
            out_dir: self.out_dir.clone(),
        }
    }

    pub fn uses_dashboard(&self) -> bool {
        matches!(self.command, Command::Watch { no_tui: false, .. })
    }
}
