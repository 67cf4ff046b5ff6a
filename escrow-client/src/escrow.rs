//! Escrow Client
//!
//! Drives the external escrow program: opens a trade (`initiate_escrow`),
//! completes one as the counterparty (`take_escrow`) and reads trade records
//! back (`get_escrow`). The program enforces the escrow semantics; this module
//! only resolves accounts, assembles transactions and decodes results.

use chain_clients_svm::SvmRpcClient;
use serde::{Deserialize, Serialize};
use solana_program::program_pack::Pack;
use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use spl_token::state::Account as TokenAccount;
use std::str::FromStr;
use tracing::{info, warn};

use crate::amount;
use crate::config::NetworkConfig;
use crate::confirmation::wait_for_confirmation;
use crate::error::{EscrowClientError, Result};
use crate::instruction::{
    build_initiation_instructions, exchange, ExchangeAccounts, InitiationAccounts, RentExemption,
};
use crate::keys::KeyMaterial;
use crate::state::EscrowRecord;

// ============================================================================
// REQUEST/RESPONSE STRUCTURES
// ============================================================================

/// Inputs for opening a trade. Addresses are base58.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiateEscrowRequest {
    /// Initializer's signing key (comma-separated bytes or base58)
    pub private_key: KeyMaterial,
    /// Initializer's token account holding the offered asset
    pub offered_token_account: String,
    /// Offered amount moved into escrow
    #[serde(with = "amount")]
    pub offered_amount: u64,
    /// Initializer's token account receiving the counter-asset
    pub receiving_token_account: String,
    /// Counter-asset amount the initializer expects
    #[serde(with = "amount")]
    pub expected_amount: u64,
    /// Escrow program address
    pub program_id: String,
}

/// Inputs for completing a trade as the counterparty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TakeEscrowRequest {
    /// Taker's signing key
    pub private_key: KeyMaterial,
    /// Escrow record address returned when the trade was opened
    pub escrow_account: String,
    /// Taker's token account paying the counter-asset
    pub sending_token_account: String,
    /// Taker's token account receiving the offered asset
    pub receiving_token_account: String,
    /// Offered-asset amount the taker expects; must match the escrowed balance
    #[serde(with = "amount")]
    pub expected_amount: u64,
    /// Escrow program address
    pub program_id: String,
}

/// Decoded escrow record. All addresses are base58.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowSummary {
    pub escrow_account_pubkey: String,
    pub is_initialized: bool,
    pub initializer_account_pubkey: String,
    pub temp_token_account_pubkey: String,
    pub initializer_receiving_token_account_pubkey: String,
    #[serde(with = "amount")]
    pub expected_amount: u64,
    /// Signature of the transaction that created the record, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl EscrowSummary {
    pub fn from_record(escrow_account: &Pubkey, record: &EscrowRecord) -> Self {
        Self {
            escrow_account_pubkey: escrow_account.to_string(),
            is_initialized: record.is_initialized,
            initializer_account_pubkey: record.initializer_pubkey.to_string(),
            temp_token_account_pubkey: record.temp_token_account_pubkey.to_string(),
            initializer_receiving_token_account_pubkey: record
                .initializer_token_to_receive_account_pubkey
                .to_string(),
            expected_amount: record.expected_amount,
            signature: None,
        }
    }
}

/// Result of a completed trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakeSummary {
    pub signature: String,
    pub escrow_account_pubkey: String,
    /// Offered-asset amount released to the taker
    #[serde(with = "amount")]
    pub received_amount: u64,
    /// Counter-asset amount paid to the initializer
    #[serde(with = "amount")]
    pub paid_amount: u64,
    /// Whether the program closed the escrow record
    pub escrow_closed: bool,
}

// ============================================================================
// CLIENT
// ============================================================================

pub struct EscrowClient {
    rpc: SvmRpcClient,
    network: NetworkConfig,
}

impl EscrowClient {
    /// Creates a client bound to an explicit network configuration.
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        let rpc = SvmRpcClient::new(&network.rpc_url, network.commitment)?;
        Ok(Self {
            rpc,
            network: network.clone(),
        })
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Opens a trade.
    ///
    /// Resolves the offered account's mint, then submits one transaction that
    /// creates and funds a temp token account, creates the escrow record
    /// account and calls `InitEscrow`. Once the transaction reaches the
    /// configured commitment the record is read back and decoded.
    pub async fn initiate_escrow(&self, request: &InitiateEscrowRequest) -> Result<EscrowSummary> {
        let initializer = request.private_key.to_keypair()?;
        let offered_token_account = parse_pubkey(&request.offered_token_account)?;
        let receiving_token_account = parse_pubkey(&request.receiving_token_account)?;
        let program_id = parse_pubkey(&request.program_id)?;

        info!(
            "Initiating escrow: initializer={}, offered={} x{}, expected={}, program={}",
            initializer.pubkey(),
            offered_token_account,
            request.offered_amount,
            request.expected_amount,
            program_id
        );

        let offered = self.fetch_token_account(&offered_token_account).await?;
        self.fetch_token_account(&receiving_token_account).await?;
        info!("Offered token account {} holds mint {}", offered_token_account, offered.mint);
        if offered.amount < request.offered_amount {
            warn!(
                "Offered token account {} holds {} but {} is offered; the transfer will be rejected",
                offered_token_account, offered.amount, request.offered_amount
            );
        }

        let temp_token_account = Keypair::new();
        let escrow_account = Keypair::new();

        let rent = RentExemption {
            temp_token_account_lamports: self
                .rpc
                .get_minimum_balance_for_rent_exemption(TokenAccount::LEN)
                .await?,
            escrow_account_lamports: self
                .rpc
                .get_minimum_balance_for_rent_exemption(EscrowRecord::LEN)
                .await?,
        };

        let instructions = build_initiation_instructions(
            &program_id,
            &InitiationAccounts {
                initializer: initializer.pubkey(),
                offered_token_account,
                offered_mint: offered.mint,
                receiving_token_account,
                temp_token_account: temp_token_account.pubkey(),
                escrow_account: escrow_account.pubkey(),
            },
            rent,
            request.offered_amount,
            request.expected_amount,
        )?;

        // Freshly created accounts must co-sign their own creation.
        let signature = self
            .submit(&instructions, &initializer, &[&temp_token_account, &escrow_account])
            .await?;
        wait_for_confirmation(&self.rpc, &self.network, &signature).await?;

        let record = self.fetch_escrow_record(&escrow_account.pubkey(), &program_id).await?;
        info!(
            "Escrow {} initialized={}, expected_amount={}",
            escrow_account.pubkey(),
            record.is_initialized,
            record.expected_amount
        );

        let mut summary = EscrowSummary::from_record(&escrow_account.pubkey(), &record);
        summary.signature = Some(signature.to_string());
        Ok(summary)
    }

    /// Completes a trade as the counterparty with the `Exchange` instruction.
    pub async fn take_escrow(&self, request: &TakeEscrowRequest) -> Result<TakeSummary> {
        let taker = request.private_key.to_keypair()?;
        let escrow_account = parse_pubkey(&request.escrow_account)?;
        let sending_token_account = parse_pubkey(&request.sending_token_account)?;
        let receiving_token_account = parse_pubkey(&request.receiving_token_account)?;
        let program_id = parse_pubkey(&request.program_id)?;

        let record = self.fetch_escrow_record(&escrow_account, &program_id).await?;
        if !record.is_initialized {
            return Err(EscrowClientError::NotInitialized(escrow_account));
        }

        let temp = self
            .fetch_token_account(&record.temp_token_account_pubkey)
            .await?;
        if temp.amount != request.expected_amount {
            warn!(
                "Escrow {} holds {} but taker expects {}; the program will reject the exchange",
                escrow_account, temp.amount, request.expected_amount
            );
        }

        info!(
            "Taking escrow {}: taker={}, pays {} for {}",
            escrow_account,
            taker.pubkey(),
            record.expected_amount,
            request.expected_amount
        );

        let ix = exchange(
            &program_id,
            &ExchangeAccounts {
                taker: taker.pubkey(),
                taker_sending_token_account: sending_token_account,
                taker_receiving_token_account: receiving_token_account,
                temp_token_account: record.temp_token_account_pubkey,
                initializer: record.initializer_pubkey,
                initializer_receiving_token_account: record
                    .initializer_token_to_receive_account_pubkey,
                escrow_account,
            },
            request.expected_amount,
        )?;

        let signature = self.submit(&[ix], &taker, &[]).await?;
        wait_for_confirmation(&self.rpc, &self.network, &signature).await?;

        let escrow_closed = self.rpc.get_account(&escrow_account).await?.is_none();
        if !escrow_closed {
            warn!("Escrow {} still exists after exchange", escrow_account);
        }

        Ok(TakeSummary {
            signature: signature.to_string(),
            escrow_account_pubkey: escrow_account.to_string(),
            received_amount: request.expected_amount,
            paid_amount: record.expected_amount,
            escrow_closed,
        })
    }

    /// Reads and decodes an escrow record owned by `program_id`.
    pub async fn get_escrow(&self, escrow_account: &str, program_id: &str) -> Result<EscrowSummary> {
        let escrow_account = parse_pubkey(escrow_account)?;
        let program_id = parse_pubkey(program_id)?;
        let record = self.fetch_escrow_record(&escrow_account, &program_id).await?;
        Ok(EscrowSummary::from_record(&escrow_account, &record))
    }

    // ------------------------------------------------------------------------
    // helpers
    // ------------------------------------------------------------------------

    /// Fetches an SPL token account and decodes its state.
    async fn fetch_token_account(&self, pubkey: &Pubkey) -> Result<TokenAccount> {
        let account = self
            .rpc
            .get_account(pubkey)
            .await?
            .ok_or(EscrowClientError::AccountNotFound(*pubkey))?;

        if account.owner != spl_token::id() {
            return Err(EscrowClientError::InvalidTokenAccount {
                account: *pubkey,
                reason: format!("owned by {}, not the token program", account.owner),
            });
        }

        TokenAccount::unpack(&account.data).map_err(|e| EscrowClientError::InvalidTokenAccount {
            account: *pubkey,
            reason: e.to_string(),
        })
    }

    async fn fetch_escrow_record(&self, pubkey: &Pubkey, program_id: &Pubkey) -> Result<EscrowRecord> {
        let account = self
            .rpc
            .get_account(pubkey)
            .await?
            .ok_or(EscrowClientError::AccountNotFound(*pubkey))?;

        if account.owner != *program_id {
            return Err(EscrowClientError::InvalidEscrowAccount {
                account: *pubkey,
                reason: format!("owned by {}, not program {}", account.owner, program_id),
            });
        }

        EscrowRecord::unpack(&account.data)
    }

    /// Signs with the fee payer plus `signers` and submits with preflight.
    async fn submit(
        &self,
        instructions: &[Instruction],
        payer: &Keypair,
        signers: &[&Keypair],
    ) -> Result<Signature> {
        let blockhash = self.rpc.get_latest_blockhash().await?;

        let mut all_signers = Vec::with_capacity(signers.len() + 1);
        all_signers.push(payer);
        for signer in signers {
            if signer.pubkey() != payer.pubkey() {
                all_signers.push(*signer);
            }
        }

        let mut tx = Transaction::new_with_payer(instructions, Some(&payer.pubkey()));
        tx.try_sign(&all_signers, blockhash)
            .map_err(|e| EscrowClientError::Authentication(e.to_string()))?;

        let signature = self.rpc.send_transaction(&tx).await?;
        info!(
            "Submitted transaction {} ({} instructions, {} signers)",
            signature,
            instructions.len(),
            all_signers.len()
        );
        Ok(signature)
    }
}

fn parse_pubkey(value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value.trim()).map_err(|_| EscrowClientError::InvalidAddress(value.to_string()))
}
