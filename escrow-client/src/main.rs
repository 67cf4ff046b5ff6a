//! Escrow Client
//!
//! Command-line entry point. Opens and takes trades against an escrow program
//! or serves the trade views and JSON API.
//!
//! ## Usage
//!
//! ```bash
//! escrow-client --config config/escrow-client.toml serve
//! escrow-client init-escrow --keypair alice.json --offered-token-account <pubkey> \
//!     --offered-amount 100 --receiving-token-account <pubkey> --expected-amount 250 \
//!     --program-id <pubkey>
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use escrow_client::{
    api::ApiServer, EscrowClient, EscrowClientConfig, InitiateEscrowRequest, KeyMaterial,
    TakeEscrowRequest,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "escrow-client")]
#[command(about = "Client for a two-party SPL token escrow program")]
struct Cli {
    /// Path to configuration file (default: config/escrow-client.toml or ESCROW_CLIENT_CONFIG_PATH env var)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Override the configured RPC endpoint
    #[arg(long, global = true)]
    rpc: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the trade views and JSON API
    Serve,
    /// Open a trade
    InitEscrow(InitEscrowArgs),
    /// Complete a trade as the counterparty
    TakeEscrow(TakeEscrowArgs),
    /// Read a trade record
    GetEscrow {
        #[arg(long)]
        escrow_account: String,
        #[arg(long)]
        program_id: String,
    },
}

#[derive(Args, Debug)]
struct SignerArgs {
    /// Signing key as comma-separated bytes or base58
    #[arg(long, conflicts_with = "keypair", required_unless_present = "keypair")]
    private_key: Option<String>,
    /// Path to a Solana CLI keypair file
    #[arg(long)]
    keypair: Option<String>,
}

impl SignerArgs {
    fn key_material(&self) -> Result<KeyMaterial> {
        match (&self.private_key, &self.keypair) {
            (Some(key), _) => Ok(KeyMaterial::new(key.clone())),
            (None, Some(path)) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read keypair file {}", path))?;
                Ok(KeyMaterial::new(content))
            }
            (None, None) => anyhow::bail!("Either --private-key or --keypair is required"),
        }
    }
}

#[derive(Args, Debug)]
struct InitEscrowArgs {
    #[command(flatten)]
    signer: SignerArgs,
    #[arg(long)]
    offered_token_account: String,
    #[arg(long)]
    offered_amount: u64,
    #[arg(long)]
    receiving_token_account: String,
    #[arg(long)]
    expected_amount: u64,
    #[arg(long)]
    program_id: String,
}

#[derive(Args, Debug)]
struct TakeEscrowArgs {
    #[command(flatten)]
    signer: SignerArgs,
    #[arg(long)]
    escrow_account: String,
    #[arg(long)]
    sending_token_account: String,
    #[arg(long)]
    receiving_token_account: String,
    #[arg(long)]
    expected_amount: u64,
    #[arg(long)]
    program_id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt::init();

    let mut config = EscrowClientConfig::load_from_path(cli.config.as_deref())?;
    if let Some(rpc) = cli.rpc {
        config.network.rpc_url = rpc;
        config.validate()?;
    }
    info!(
        "Network: {} (commitment {:?})",
        config.network.rpc_url, config.network.commitment
    );

    match cli.command {
        Command::Serve => {
            let server = ApiServer::new(config)?;
            server.run().await?;
        }
        Command::InitEscrow(args) => {
            let client = EscrowClient::new(&config.network)?;
            let request = InitiateEscrowRequest {
                private_key: args.signer.key_material()?,
                offered_token_account: args.offered_token_account,
                offered_amount: args.offered_amount,
                receiving_token_account: args.receiving_token_account,
                expected_amount: args.expected_amount,
                program_id: args.program_id,
            };
            let summary = client.initiate_escrow(&request).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::TakeEscrow(args) => {
            let client = EscrowClient::new(&config.network)?;
            let request = TakeEscrowRequest {
                private_key: args.signer.key_material()?,
                escrow_account: args.escrow_account,
                sending_token_account: args.sending_token_account,
                receiving_token_account: args.receiving_token_account,
                expected_amount: args.expected_amount,
                program_id: args.program_id,
            };
            let summary = client.take_escrow(&request).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::GetEscrow {
            escrow_account,
            program_id,
        } => {
            let client = EscrowClient::new(&config.network)?;
            let summary = client.get_escrow(&escrow_account, &program_id).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
