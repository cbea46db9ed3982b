use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::reboot::DEFAULT_MAX_ATTEMPTS;

#[derive(Parser, Clone, Debug)]
pub struct DaemonArgs {
    #[arg(
        long,
        env = "KUBECONFIG",
        value_hint = clap::ValueHint::FilePath,
        help = "Path to kubeconfig file (defaults to cluster config or ~/.kube/config)"
    )]
    pub kubeconfig: Option<PathBuf>,

    #[arg(
        long,
        env = "REBOOT_AGENT_NAMESPACE",
        help = "Kubernetes namespace to watch (empty for all namespaces)"
    )]
    pub namespace: Option<String>,

    #[arg(
        long,
        env = "REBOOT_AGENT_MAX_ATTEMPTS",
        default_value_t = DEFAULT_MAX_ATTEMPTS,
        help = "Number of conflicting replace attempts before a restart is abandoned"
    )]
    pub max_attempts: u32,

    #[arg(
        long,
        env = "REBOOT_AGENT_INITIAL_BACKOFF",
        default_value = "10s",
        value_parser = humantime::parse_duration,
        help = "Backoff before the first retry after a conflict, e.g. 10s or 500ms"
    )]
    pub initial_backoff: Duration,

    #[arg(
        long,
        env = "REBOOT_AGENT_BACKOFF_INCREMENT",
        default_value = "5s",
        value_parser = humantime::parse_duration,
        help = "Amount the backoff grows by after every conflict"
    )]
    pub backoff_increment: Duration,

    #[arg(
        long,
        env = "REBOOT_AGENT_LOG_PATH",
        value_hint = clap::ValueHint::DirPath,
        help = "Directory for daily rotating log files (stderr only when unset)"
    )]
    pub log_path: Option<PathBuf>,
}
