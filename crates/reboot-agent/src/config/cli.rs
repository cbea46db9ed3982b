use clap::{Parser, Subcommand};
use utils::version;

use crate::config::daemon::DaemonArgs;

#[derive(Parser)]
#[command(about, long_about, version = &**version::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the reboot agent controller
    Daemon(Box<DaemonArgs>),
    /// Print the effective reboot configuration and exit
    #[command(name = "show-config")]
    ShowConfig(Box<DaemonArgs>),
}
