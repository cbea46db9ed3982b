use anyhow::Result;
use clap::Parser;
use reboot_agent::app::Application;
use reboot_agent::config::Cli;
use reboot_agent::config::Commands;
use reboot_agent::config::DaemonArgs;
use reboot_agent::config::RebootConfig;
use utils::version;

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

fn reboot_config(daemon_args: &DaemonArgs) -> Result<RebootConfig> {
    RebootConfig::try_from(daemon_args).map_err(|e| anyhow::anyhow!("{e:?}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_global_hooks();

    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon(daemon_args) => run_daemon(*daemon_args).await,
        Commands::ShowConfig(daemon_args) => {
            println!("{}", reboot_config(&daemon_args)?);
            Ok(())
        }
    }
}

async fn run_daemon(daemon_args: DaemonArgs) -> Result<()> {
    let _guard = utils::logging::init(daemon_args.log_path.as_ref());

    tracing::info!("Starting reboot agent daemon {}", &**version::VERSION);

    let config = reboot_config(&daemon_args)?;
    tracing::info!(
        max_attempts = config.max_attempts,
        initial_backoff = ?config.initial_backoff,
        backoff_increment = ?config.backoff_increment,
        namespace = ?daemon_args.namespace,
        "Loaded reboot configuration"
    );

    let app = Application::new(daemon_args, config);
    app.run().await
}
