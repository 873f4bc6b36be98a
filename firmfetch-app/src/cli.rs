use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use firmfetch_config::{EmptyPolicy, FirmfetchConfig};

/// Collect firmware and driver packages from the vendor support site.
#[derive(Parser, Debug)]
#[command(name = "firmfetch")]
#[command(version)]
pub(crate) struct Cli {
    /// YAML configuration file; `firmfetch.yaml` is read when present
    #[arg(short, long, env = "FIRMFETCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Only visit these OS codes (repeatable)
    #[arg(long = "only", value_name = "CODE")]
    pub only: Vec<String>,

    /// Print the OS catalog and exit
    #[arg(long)]
    pub list: bool,

    /// Also search page source, buttons and data attributes for links
    #[arg(long)]
    pub deep: bool,

    /// What to do when a page has no matching packages
    #[arg(long, value_enum)]
    pub on_empty: Option<OnEmptyArg>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OnEmptyArg {
    Skip,
    Prompt,
    TakeAll,
}

impl From<OnEmptyArg> for EmptyPolicy {
    fn from(arg: OnEmptyArg) -> Self {
        match arg {
            OnEmptyArg::Skip => EmptyPolicy::Skip,
            OnEmptyArg::Prompt => EmptyPolicy::Prompt,
            OnEmptyArg::TakeAll => EmptyPolicy::TakeAll,
        }
    }
}

impl Cli {
    /// Flags win over file and environment settings.
    pub fn apply(&self, cfg: &mut FirmfetchConfig) {
        if self.deep {
            cfg.scan.deep = true;
        }
        if let Some(policy) = self.on_empty {
            cfg.on_empty = policy.into();
        }
    }
}
