//! Instruction definitions and builders for the escrow program.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::program_pack::Pack;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    sysvar,
};
use solana_system_interface::instruction as system_instruction;

use crate::error::{EscrowClientError, Result};
use crate::state::{seeds, EscrowRecord};

/// Escrow program instructions. Borsh writes the variant index as a single
/// leading byte, followed by the little-endian amount.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum EscrowInstruction {
    /// Start a trade by moving a funded temp token account under program
    /// control and recording the expected counter-asset amount.
    ///
    /// Accounts expected:
    /// 0. `[signer]` Initializer
    /// 1. `[writable]` Temp token account, owned by the initializer
    /// 2. `[]` Initializer's token account for the counter-asset
    /// 3. `[writable]` Escrow record account
    /// 4. `[]` Rent sysvar
    /// 5. `[]` Token program
    InitEscrow {
        /// Counter-asset amount the initializer expects to receive
        amount: u64,
    },

    /// Complete a trade.
    ///
    /// Accounts expected:
    /// 0. `[signer]` Taker
    /// 1. `[writable]` Taker's token account for the counter-asset
    /// 2. `[writable]` Taker's token account receiving the offered asset
    /// 3. `[writable]` Temp token account (PDA-owned)
    /// 4. `[writable]` Initializer's main account
    /// 5. `[writable]` Initializer's token account for the counter-asset
    /// 6. `[writable]` Escrow record account
    /// 7. `[]` Token program
    /// 8. `[]` Program PDA
    Exchange {
        /// Offered-asset amount the taker expects to receive
        amount: u64,
    },
}

impl EscrowInstruction {
    pub const INIT_ESCROW_TAG: u8 = 0;
    pub const EXCHANGE_TAG: u8 = 1;

    pub fn pack(&self) -> Result<Vec<u8>> {
        self.try_to_vec()
            .map_err(|e| EscrowClientError::Instruction(e.to_string()))
    }

    /// Decodes instruction data, rejecting unknown tags and trailing bytes.
    pub fn unpack(data: &[u8]) -> Result<Self> {
        Self::try_from_slice(data).map_err(|e| EscrowClientError::Instruction(e.to_string()))
    }
}

// ============================================================================
// ESCROW PROGRAM INSTRUCTIONS
// ============================================================================

pub fn init_escrow(
    program_id: &Pubkey,
    initializer: &Pubkey,
    temp_token_account: &Pubkey,
    receiving_token_account: &Pubkey,
    escrow_account: &Pubkey,
    expected_amount: u64,
) -> Result<Instruction> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*initializer, true),
            AccountMeta::new(*temp_token_account, false),
            AccountMeta::new_readonly(*receiving_token_account, false),
            AccountMeta::new(*escrow_account, false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        data: EscrowInstruction::InitEscrow {
            amount: expected_amount,
        }
        .pack()?,
    })
}

/// Accounts taking part in an `Exchange`.
#[derive(Debug, Clone)]
pub struct ExchangeAccounts {
    pub taker: Pubkey,
    pub taker_sending_token_account: Pubkey,
    pub taker_receiving_token_account: Pubkey,
    pub temp_token_account: Pubkey,
    pub initializer: Pubkey,
    pub initializer_receiving_token_account: Pubkey,
    pub escrow_account: Pubkey,
}

pub fn exchange(
    program_id: &Pubkey,
    accounts: &ExchangeAccounts,
    expected_amount: u64,
) -> Result<Instruction> {
    let (pda, _bump) = escrow_pda(program_id);

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(accounts.taker, true),
            AccountMeta::new(accounts.taker_sending_token_account, false),
            AccountMeta::new(accounts.taker_receiving_token_account, false),
            AccountMeta::new(accounts.temp_token_account, false),
            AccountMeta::new(accounts.initializer, false),
            AccountMeta::new(accounts.initializer_receiving_token_account, false),
            AccountMeta::new(accounts.escrow_account, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(pda, false),
        ],
        data: EscrowInstruction::Exchange {
            amount: expected_amount,
        }
        .pack()?,
    })
}

/// PDA the program uses as authority over temp token accounts.
pub fn escrow_pda(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[seeds::ESCROW_SEED], program_id)
}

// ============================================================================
// INITIATION BATCH
// ============================================================================

/// Inputs for the five-instruction initiation batch.
#[derive(Debug, Clone)]
pub struct InitiationAccounts {
    pub initializer: Pubkey,
    pub offered_token_account: Pubkey,
    pub offered_mint: Pubkey,
    pub receiving_token_account: Pubkey,
    pub temp_token_account: Pubkey,
    pub escrow_account: Pubkey,
}

/// Rent-exempt balances for the two accounts the batch creates.
#[derive(Debug, Clone, Copy)]
pub struct RentExemption {
    pub temp_token_account_lamports: u64,
    pub escrow_account_lamports: u64,
}

/// Builds the initiation batch, in order:
/// create temp account, initialize it for the mint, fund it, create the
/// escrow record account, then `InitEscrow`.
///
/// The freshly created accounts only gain an application owner through the
/// initialize instructions, so all five must land in one transaction.
pub fn build_initiation_instructions(
    program_id: &Pubkey,
    accounts: &InitiationAccounts,
    rent: RentExemption,
    offered_amount: u64,
    expected_amount: u64,
) -> Result<Vec<Instruction>> {
    let create_temp_account_ix = system_instruction::create_account(
        &accounts.initializer,
        &accounts.temp_token_account,
        rent.temp_token_account_lamports,
        spl_token::state::Account::LEN as u64,
        &spl_token::id(),
    );

    let init_temp_account_ix = spl_token::instruction::initialize_account(
        &spl_token::id(),
        &accounts.temp_token_account,
        &accounts.offered_mint,
        &accounts.initializer,
    )?;

    let transfer_ix = spl_token::instruction::transfer(
        &spl_token::id(),
        &accounts.offered_token_account,
        &accounts.temp_token_account,
        &accounts.initializer,
        &[],
        offered_amount,
    )?;

    let create_escrow_account_ix = system_instruction::create_account(
        &accounts.initializer,
        &accounts.escrow_account,
        rent.escrow_account_lamports,
        EscrowRecord::LEN as u64,
        program_id,
    );

    let init_escrow_ix = init_escrow(
        program_id,
        &accounts.initializer,
        &accounts.temp_token_account,
        &accounts.receiving_token_account,
        &accounts.escrow_account,
        expected_amount,
    )?;

    Ok(vec![
        create_temp_account_ix,
        init_temp_account_ix,
        transfer_ix,
        create_escrow_account_ix,
        init_escrow_ix,
    ])
}
