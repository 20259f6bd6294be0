use std::io::Write;
use std::path::Path;

use clap::Parser;
use log::{debug, LevelFilter};

mod config;
mod lifecycle;
mod twitch;

use config::Credentials;
use lifecycle::Lifecycle;
use twitch::{Result, SendOutcome, TwitchApi, TwitchError, REDIRECT_URI};

#[derive(Parser)]
#[command(name = "twitch-say")]
#[command(version)]
#[command(about = "Send a single chat message to a Twitch channel")]
struct Cli {
    /// The message to send
    message: Option<String>,

    /// Show debug diagnostics
    #[arg(short, long)]
    verbose: bool,

    /// Interactively enter Twitch credentials
    #[arg(long)]
    setup: bool,

    /// Copy this binary into ~/.local/bin
    #[arg(long)]
    install: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.install {
        return install_binary();
    }

    let store_path = config::default_store_path()?;
    debug!("Credential store: {}", store_path.display());

    if cli.setup {
        return run_setup(&store_path);
    }

    let message = cli
        .message
        .ok_or_else(|| TwitchError::ConfigError("no message given; see --help".to_string()))?;

    send_message(&store_path, &message).await
}

async fn send_message(store_path: &Path, message: &str) -> Result<()> {
    let mut creds = Credentials::from_file(store_path)?;
    let lifecycle = Lifecycle::new(&creds);

    let mut stdin = std::io::stdin().lock();
    let session = lifecycle
        .ensure_session(&mut creds, store_path, &mut stdin)
        .await?;

    let api = TwitchApi::new(&creds.client_id, &session.access_token);
    let outcome = api
        .send_message(&session.broadcaster_id, &session.broadcaster_id, message)
        .await?;

    match outcome {
        SendOutcome::Sent { .. } => {
            println!("Message sent to #{}", creds.twitch_username);
            Ok(())
        }
        SendOutcome::Dropped { code, message } => Err(TwitchError::SendFailed {
            status: 200,
            body: format!("{}: {}", code, message),
        }),
    }
}

/// Prompt for credentials and write a fresh store. Stale tokens and the
/// cached broadcaster ID are deliberately not carried over.
fn run_setup(store_path: &Path) -> Result<()> {
    println!("twitch-say setup");
    println!("Register an application at https://dev.twitch.tv/console/apps");
    println!("with OAuth redirect URL {} to get a client ID and secret.\n", REDIRECT_URI);

    let creds = Credentials {
        twitch_username: prompt("Twitch username")?,
        client_id: prompt("Client ID")?,
        client_secret: prompt("Client secret")?,
        auth_token: None,
        refresh_token: None,
        broadcaster_id: None,
    };

    if creds.twitch_username.is_empty()
        || creds.client_id.is_empty()
        || creds.client_secret.is_empty()
    {
        return Err(TwitchError::ConfigError(
            "all three values are required".to_string(),
        ));
    }

    creds.to_file(store_path)?;
    println!("\nSaved to {}", store_path.display());
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn install_binary() -> Result<()> {
    let exe = std::env::current_exe()?;
    let target_dir = dirs::home_dir()
        .ok_or_else(|| TwitchError::ConfigError("no home directory".to_string()))?
        .join(".local")
        .join("bin");
    std::fs::create_dir_all(&target_dir)?;
    let target = target_dir.join("twitch-say");
    std::fs::copy(&exe, &target)?;
    println!("Installed to {}", target.display());
    println!("Make sure {} is on your PATH", target_dir.display());
    Ok(())
}
