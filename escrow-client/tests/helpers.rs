//! Shared test helpers for escrow client tests
//!
//! Constants, on-chain account fixtures and wiremock helpers that stand in for
//! a Solana JSON-RPC node.

#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine as _};
use borsh::BorshSerialize;
use escrow_client::{EscrowRecord, KeyMaterial, NetworkConfig};
use serde_json::{json, Value};
use solana_program::{program_option::COption, program_pack::Pack};
use solana_sdk::{
    commitment_config::CommitmentLevel,
    hash::Hash,
    pubkey::Pubkey,
    signature::Keypair,
    transaction::Transaction,
};
use spl_token::state::{Account as TokenAccount, AccountState};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Rent-exempt minimum the mock node reports for a token account
pub const DUMMY_TOKEN_ACCOUNT_RENT: u64 = 2_039_280;

/// Rent-exempt minimum the mock node reports for an escrow record
pub const DUMMY_ESCROW_RENT: u64 = 1_621_680;

/// Slot reported for confirmed transactions
pub const DUMMY_SLOT: u64 = 4_242;

// ============================================================================
// FIXTURES
// ============================================================================

/// Network settings pointing at the mock node with short polling.
pub fn network_for(server: &MockServer) -> NetworkConfig {
    NetworkConfig {
        rpc_url: server.uri(),
        commitment: CommitmentLevel::Confirmed,
        poll_interval_ms: 10,
        confirmation_timeout_ms: 200,
    }
}

/// Key material in the comma-separated form the Solana CLI writes.
pub fn key_material(keypair: &Keypair) -> KeyMaterial {
    let bytes: Vec<String> = keypair.to_bytes().iter().map(|b| b.to_string()).collect();
    KeyMaterial::new(bytes.join(","))
}

/// Packed SPL token account state.
pub fn token_account_data(mint: &Pubkey, owner: &Pubkey, amount: u64) -> Vec<u8> {
    let account = TokenAccount {
        mint: *mint,
        owner: *owner,
        amount,
        delegate: COption::None,
        state: AccountState::Initialized,
        is_native: COption::None,
        delegated_amount: 0,
        close_authority: COption::None,
    };
    let mut data = vec![0u8; TokenAccount::LEN];
    TokenAccount::pack(account, &mut data).expect("pack token account");
    data
}

/// Borsh-encoded escrow record.
pub fn escrow_record_data(record: &EscrowRecord) -> Vec<u8> {
    record.try_to_vec().expect("serialize escrow record")
}

/// Record as the program writes it after `InitEscrow`.
pub fn initialized_record(expected_amount: u64) -> EscrowRecord {
    EscrowRecord {
        is_initialized: true,
        initializer_pubkey: Pubkey::new_unique(),
        temp_token_account_pubkey: Pubkey::new_unique(),
        initializer_token_to_receive_account_pubkey: Pubkey::new_unique(),
        expected_amount,
    }
}

// ============================================================================
// JSON-RPC RESPONSES
// ============================================================================

pub fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "result": result,
        "id": 1
    }))
}

pub fn rpc_error(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "error": { "code": code, "message": message },
        "id": 1
    }))
}

fn account_value(owner: &Pubkey, data: &[u8]) -> Value {
    json!({
        "context": { "slot": DUMMY_SLOT },
        "value": {
            "data": [STANDARD.encode(data), "base64"],
            "executable": false,
            "lamports": 2_039_280u64,
            "owner": owner.to_string(),
            "rentEpoch": 0,
            "space": data.len()
        }
    })
}

// ============================================================================
// MOUNT HELPERS
// ============================================================================

/// Serves `getAccountInfo` for one specific account.
pub async fn mount_account(server: &MockServer, pubkey: &Pubkey, owner: &Pubkey, data: &[u8]) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "getAccountInfo",
            "params": [pubkey.to_string()]
        })))
        .respond_with(rpc_result(account_value(owner, data)))
        .mount(server)
        .await;
}

/// Serves `getAccountInfo` for one account a limited number of times.
pub async fn mount_account_times(
    server: &MockServer,
    pubkey: &Pubkey,
    owner: &Pubkey,
    data: &[u8],
    times: u64,
) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "getAccountInfo",
            "params": [pubkey.to_string()]
        })))
        .respond_with(rpc_result(account_value(owner, data)))
        .up_to_n_times(times)
        .mount(server)
        .await;
}

/// Reports one specific account as missing.
pub async fn mount_missing_account(server: &MockServer, pubkey: &Pubkey) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "getAccountInfo",
            "params": [pubkey.to_string()]
        })))
        .respond_with(rpc_result(json!({ "context": { "slot": DUMMY_SLOT }, "value": null })))
        .mount(server)
        .await;
}

/// Serves `getAccountInfo` for any account not matched by an earlier mock.
/// Mount after the specific account mocks.
pub async fn mount_any_account(server: &MockServer, owner: &Pubkey, data: &[u8]) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getAccountInfo" })))
        .respond_with(rpc_result(account_value(owner, data)))
        .mount(server)
        .await;
}

/// Serves rent-exempt minimums for token accounts and escrow records.
pub async fn mount_rent(server: &MockServer) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "getMinimumBalanceForRentExemption",
            "params": [TokenAccount::LEN]
        })))
        .respond_with(rpc_result(json!(DUMMY_TOKEN_ACCOUNT_RENT)))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "getMinimumBalanceForRentExemption",
            "params": [EscrowRecord::LEN]
        })))
        .respond_with(rpc_result(json!(DUMMY_ESCROW_RENT)))
        .mount(server)
        .await;
}

pub async fn mount_blockhash(server: &MockServer) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getLatestBlockhash" })))
        .respond_with(rpc_result(json!({
            "context": { "slot": DUMMY_SLOT },
            "value": {
                "blockhash": Hash::new_from_array([9u8; 32]).to_string(),
                "lastValidBlockHeight": 100
            }
        })))
        .mount(server)
        .await;
}

/// Decodes the base64 wire transaction carried by a `sendTransaction` body.
fn decode_transaction(body: &Value) -> Transaction {
    let wire = STANDARD
        .decode(body["params"][0].as_str().expect("encoded transaction"))
        .expect("base64 transaction");
    bincode::deserialize(&wire).expect("bincode transaction")
}

/// Answers `sendTransaction` with the fee payer signature of the submitted
/// transaction, as a node does.
struct EchoSignature;

impl Respond for EchoSignature {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).expect("json body");
        let tx = decode_transaction(&body);
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "result": tx.signatures[0].to_string(),
            "id": body["id"]
        }))
    }
}

/// Reports a node version for clients that query it before sending.
pub async fn mount_version(server: &MockServer) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getVersion" })))
        .respond_with(rpc_result(json!({ "solana-core": "2.3.0", "feature-set": 1 })))
        .mount(server)
        .await;
}

/// Accepts exactly one submitted transaction.
pub async fn mount_send(server: &MockServer) {
    mount_version(server).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "sendTransaction" })))
        .respond_with(EchoSignature)
        .expect(1)
        .mount(server)
        .await;
}

/// Decodes the single transaction submitted to the mock node.
pub async fn submitted_transaction(server: &MockServer) -> Transaction {
    let requests = server.received_requests().await.expect("request recording enabled");
    let send = requests
        .iter()
        .map(|r| serde_json::from_slice::<Value>(&r.body).expect("json body"))
        .find(|body| body["method"] == "sendTransaction")
        .expect("sendTransaction request");
    decode_transaction(&send)
}

/// Rejects every submitted transaction at preflight.
pub async fn mount_send_preflight_failure(server: &MockServer, message: &str) {
    mount_version(server).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "sendTransaction" })))
        .respond_with(rpc_error(-32002, message))
        .mount(server)
        .await;
}

/// Reports every signature with the given status payload.
pub async fn mount_status(server: &MockServer, status: Value) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getSignatureStatuses" })))
        .respond_with(rpc_result(json!({
            "context": { "slot": DUMMY_SLOT },
            "value": [status]
        })))
        .mount(server)
        .await;
}

pub fn confirmed_status() -> Value {
    json!({
        "slot": DUMMY_SLOT,
        "confirmations": 1,
        "err": null,
        "status": { "Ok": null },
        "confirmationStatus": "confirmed"
    })
}

pub fn processed_status() -> Value {
    json!({
        "slot": DUMMY_SLOT,
        "confirmations": 0,
        "err": null,
        "status": { "Ok": null },
        "confirmationStatus": "processed"
    })
}

pub fn failed_status() -> Value {
    json!({
        "slot": DUMMY_SLOT,
        "confirmations": 1,
        "err": { "InstructionError": [4, { "Custom": 0 }] },
        "status": { "Err": { "InstructionError": [4, { "Custom": 0 }] } },
        "confirmationStatus": "confirmed"
    })
}

/// Status as older nodes report a rooted transaction: no confirmation count
/// and no `confirmationStatus` field.
pub fn rooted_status_without_level() -> Value {
    json!({
        "slot": DUMMY_SLOT,
        "confirmations": null,
        "err": null,
        "status": { "Ok": null }
    })
}
