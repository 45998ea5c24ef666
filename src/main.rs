use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use chrono::{DateTime, Utc};
use clap_complete::{Shell, generate};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use promptlist::{cli, config, error, types::Credential};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP playlist service
    Serve,

    /// Create one playlist from a prompt
    Generate(GenerateOptions),

    /// Check which Spotify user a credential belongs to
    Whoami(CredentialOptions),

    /// Manage account usage records
    Accounts(AccountsOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct CredentialOptions {
    /// Spotify access token
    #[clap(long, env = "SPOTIFY_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,

    /// Spotify refresh token, used once if the access token is rejected
    #[clap(long, env = "SPOTIFY_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,

    /// When the access token expires (RFC 3339), e.g. 2026-10-16T12:00:00Z
    #[clap(long, env = "SPOTIFY_TOKEN_EXPIRES_AT")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CredentialOptions {
    fn into_credential(self) -> Credential {
        Credential::new(self.access_token, self.refresh_token).with_expiry(self.expires_at)
    }
}

#[derive(Parser, Debug, Clone)]
pub struct GenerateOptions {
    /// What the playlist should be about
    pub prompt: String,

    /// Account the playlist is counted against
    #[clap(long, default_value = "local")]
    pub account: String,

    /// Open the playlist in the browser when done
    #[clap(long)]
    pub open: bool,

    #[clap(flatten)]
    pub credential: CredentialOptions,
}

#[derive(Parser, Debug, Clone)]
pub struct AccountsOptions {
    #[command(subcommand)]
    pub command: AccountsSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AccountsSubcommand {
    /// List accounts with their playlist counts
    List,

    /// Create an account record with zero playlists
    Add { account: String },

    /// Mark an account as subscribed
    Subscribe {
        account: String,

        /// Remove the subscription instead
        #[clap(long)]
        off: bool,
    },
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Serve => {
            init_tracing("promptlist=info");
            cli::serve().await
        }
        Command::Generate(opt) => {
            init_tracing("promptlist=warn");
            cli::generate(
                &opt.prompt,
                &opt.account,
                opt.credential.into_credential(),
                opt.open,
            )
            .await
        }
        Command::Whoami(opt) => {
            init_tracing("promptlist=warn");
            cli::whoami(opt.into_credential()).await
        }
        Command::Accounts(opt) => match opt.command {
            AccountsSubcommand::List => cli::list_accounts().await,
            AccountsSubcommand::Add { account } => cli::add_account(&account).await,
            AccountsSubcommand::Subscribe { account, off } => {
                cli::subscribe_account(&account, !off).await
            }
        },
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
