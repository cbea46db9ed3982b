use core::error::Error;
use std::fmt;
use std::time::Duration;

use error_stack::Report;

use crate::config::daemon::DaemonArgs;

/// Annotation a pod carries to ask for a rolling restart of its deployment.
pub const REBOOT_REQUESTED_ANNOTATION: &str = "reboot-agent.v1.sdlt.local/reboot";
/// Annotation marking a reboot that is already underway. Observed only.
pub const REBOOT_IN_PROGRESS_ANNOTATION: &str = "reboot-agent.v1.sdlt.local/reboot-in-progress";
/// Pod-template annotation whose change makes the deployment roll its pods.
pub const RESTARTED_AT_ANNOTATION: &str = "kubectl.kubernetes.io/restartedAt";

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(10);
pub const DEFAULT_BACKOFF_INCREMENT: Duration = Duration::from_secs(5);

/// Errors raised while building the reboot configuration.
#[derive(Debug, derive_more::Display)]
pub enum ConfigError {
    #[display("max attempts must be at least 1, got {value}")]
    InvalidMaxAttempts { value: u32 },
}

impl Error for ConfigError {}

/// Process-wide reboot configuration.
///
/// Built once at startup and shared read-only by every restart operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebootConfig {
    pub trigger_key: String,
    pub in_progress_key: String,
    pub restarted_at_key: String,
    /// Conflicting replace attempts allowed before giving up.
    pub max_attempts: u32,
    /// Sleep after the first conflict.
    pub initial_backoff: Duration,
    /// Added to the backoff after every sleep.
    pub backoff_increment: Duration,
}

impl Default for RebootConfig {
    fn default() -> Self {
        Self {
            trigger_key: REBOOT_REQUESTED_ANNOTATION.to_string(),
            in_progress_key: REBOOT_IN_PROGRESS_ANNOTATION.to_string(),
            restarted_at_key: RESTARTED_AT_ANNOTATION.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            backoff_increment: DEFAULT_BACKOFF_INCREMENT,
        }
    }
}

impl TryFrom<&DaemonArgs> for RebootConfig {
    type Error = Report<ConfigError>;

    fn try_from(args: &DaemonArgs) -> Result<Self, Self::Error> {
        if args.max_attempts == 0 {
            return Err(Report::new(ConfigError::InvalidMaxAttempts {
                value: args.max_attempts,
            }));
        }

        Ok(Self {
            max_attempts: args.max_attempts,
            initial_backoff: args.initial_backoff,
            backoff_increment: args.backoff_increment,
            ..Self::default()
        })
    }
}

impl fmt::Display for RebootConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "trigger annotation:     {}", self.trigger_key)?;
        writeln!(f, "in-progress annotation: {}", self.in_progress_key)?;
        writeln!(f, "restart annotation:     {}", self.restarted_at_key)?;
        writeln!(f, "max attempts:           {}", self.max_attempts)?;
        writeln!(
            f,
            "initial backoff:        {}",
            humantime::format_duration(self.initial_backoff)
        )?;
        write!(
            f,
            "backoff increment:      {}",
            humantime::format_duration(self.backoff_increment)
        )
    }
}
