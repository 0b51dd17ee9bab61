use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use boardctl::config::{Config, Overrides, PinBackend};
use boardctl::ipc::ControlClient;
use boardctl::logging::init_tracing;
use boardctl::pattern::Pattern;
use boardctl::shutdown::ShutdownManager;

#[derive(Parser)]
#[command(name = "boardctl", version, about = "Status LED and peripheral line controller")]
struct Cli {
    /// Config file (default: <config dir>/boardctl/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Control socket path, overrides the config file
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the controller daemon
    Run {
        /// Initial LED pattern, whitespace-separated codes
        #[arg(long)]
        pattern: Option<String>,

        /// Initial LED tempo (1-254)
        #[arg(long)]
        tempo: Option<u32>,

        /// Initial peripheral mode (0 = boot, 1 = reset, 2 = run)
        #[arg(long)]
        mode: Option<u8>,

        /// GPIO implementation
        #[arg(long, value_enum)]
        pin_backend: Option<BackendArg>,
    },
    /// List published endpoints
    List,
    /// Print an endpoint's current value
    Read { endpoint: String },
    /// Replace an endpoint's value
    Write {
        endpoint: String,
        payload: String,
        /// Write offset; only 0 is accepted
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
    /// Print a JSON snapshot of the controller
    Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Sysfs,
    Memory,
}

impl From<BackendArg> for PinBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Sysfs => PinBackend::Sysfs,
            BackendArg::Memory => PinBackend::Memory,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_level = if matches!(cli.command, Command::Run { .. }) {
        "info"
    } else {
        "warn"
    };
    init_tracing(default_level);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: failed to start runtime: {}", err);
            return ExitCode::from(1);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let mut config = Config::load_from(&config_path)?;

    match cli.command {
        Command::Run {
            pattern,
            tempo,
            mode,
            pin_backend,
        } => {
            let codes = pattern
                .map(|text| Pattern::parse(&text).map(|p| p.codes().to_vec()))
                .transpose()
                .context("invalid --pattern")?;
            config.apply(Overrides {
                codes,
                tempo,
                mode,
                backend: pin_backend.map(PinBackend::from),
                socket_path: cli.socket,
            });

            let shutdown = Arc::new(ShutdownManager::new());
            let signals = {
                let shutdown = Arc::clone(&shutdown);
                tokio::spawn(async move {
                    if let Err(err) = shutdown.wait_for_shutdown().await {
                        tracing::error!(error = %err, "Failed to install signal handlers");
                        shutdown.signal_shutdown();
                    }
                })
            };

            let result = boardctl::daemon::run(config, Arc::clone(&shutdown)).await;
            shutdown.signal_shutdown();
            let _ = signals.await;
            result?;
        }
        command => {
            let socket = cli.socket.unwrap_or(config.control.socket_path);
            client_command(ControlClient::new(socket), command).await?;
        }
    }

    Ok(())
}

async fn client_command(client: ControlClient, command: Command) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    match command {
        Command::List => {
            for name in client.list().await? {
                writeln!(stdout, "{}", name)?;
            }
        }
        Command::Read { endpoint } => {
            write!(stdout, "{}", client.read(&endpoint).await?)?;
        }
        Command::Write {
            endpoint,
            payload,
            offset,
        } => {
            client.write(&endpoint, offset, payload.as_bytes()).await?;
        }
        Command::Status => {
            let status = client.status().await?;
            writeln!(stdout, "{}", serde_json::to_string_pretty(&status)?)?;
        }
        Command::Run { .. } => {}
    }
    stdout.flush()?;
    Ok(())
}
