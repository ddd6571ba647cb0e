//! JSON-RPC surface of the claim node

use std::sync::Arc;

use airdrop_ledger::{
    ClaimLedger, Clock, InMemoryToken, LedgerConfig, LedgerError, parse_signature,
};
use airdrop_merkle::{Address, MerkleProof, MerkleTree, parse_address, parse_amount};
use anyhow::{Context, Result};
use axum::{Json, extract::State as AxumState};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

/// Token account holding the airdrop funds
const AIRDROP_ADDRESS: Address = Address::with_last_byte(0xad);

/// Shared node state
pub(crate) struct NodeState {
    ledger: ClaimLedger,
}

pub(crate) type SharedState = Arc<NodeState>;

impl NodeState {
    /// Fund a fresh token ledger with the tree total and open the claim window
    pub(crate) fn new(
        tree: &MerkleTree,
        owner: Address,
        clock: Arc<dyn Clock>,
        duration_days: u64,
    ) -> Result<Self> {
        let token = Arc::new(InMemoryToken::new());
        token
            .mint(AIRDROP_ADDRESS, tree.total_amount())
            .context("Failed to fund airdrop account")?;
        info!(
            "Funded airdrop account {} with {}",
            AIRDROP_ADDRESS,
            tree.total_amount()
        );

        let config = LedgerConfig::for_tree(tree, owner, clock.now(), duration_days);
        let account = Arc::new(token.account(AIRDROP_ADDRESS));
        Ok(Self {
            ledger: ClaimLedger::new(config, account, clock),
        })
    }
}

/// Health check endpoint
pub(crate) async fn health() -> &'static str {
    "ok"
}

/// JSON-RPC request
#[derive(Deserialize)]
pub(crate) struct RpcRequest {
    #[serde(default)]
    #[allow(dead_code)]
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    id: Value,
}

/// JSON-RPC response
#[derive(Serialize)]
pub(crate) struct RpcResponse {
    jsonrpc: String,
    result: Value,
    id: Value,
}

/// Claim input for RPC
#[derive(Deserialize)]
struct ClaimInput {
    index: u64,
    address: String,
    amount: String,
    proof: Vec<String>,
    /// EIP-191 signature of the claim message by `address`
    signature: String,
}

/// Withdraw input for RPC
#[derive(Deserialize)]
struct WithdrawInput {
    from: String,
}

/// RPC handler
pub(crate) async fn rpc_handler(
    AxumState(state): AxumState<SharedState>,
    Json(req): Json<RpcRequest>,
) -> Json<RpcResponse> {
    let result = dispatch(&state, &req);

    Json(RpcResponse {
        jsonrpc: "2.0".to_string(),
        result,
        id: req.id,
    })
}

fn dispatch(state: &NodeState, req: &RpcRequest) -> Value {
    let ledger = &state.ledger;
    let first_param = req
        .params
        .as_ref()
        .and_then(|p| p.as_array())
        .and_then(|arr| arr.first());

    match req.method.as_str() {
        "airdrop_root" => json!(ledger.root()),
        "airdrop_status" => json!({
            "status": ledger.status(),
            "root": ledger.root(),
            "owner": ledger.owner(),
            "deadline": ledger.deadline(),
            "balance": ledger.balance().to_string(),
            "totalClaimed": ledger.total_claimed().to_string(),
        }),
        "airdrop_totalClaimed" => json!(ledger.total_claimed().to_string()),
        "airdrop_balanceOf" => match first_param.and_then(Value::as_str).map(parse_address) {
            Some(Ok(account)) => json!(ledger.balance_of(account).to_string()),
            _ => failure("MalformedRecord", "expected an address"),
        },
        "airdrop_isClaimed" => match first_param.and_then(Value::as_u64) {
            Some(index) => match ledger.is_claimed(index) {
                Ok(claimed) => json!(claimed),
                Err(e) => ledger_failure(&e),
            },
            None => failure("IndexOutOfRange", "expected an index"),
        },
        "airdrop_isClaimedBatch" => {
            let claimed: Vec<bool> = first_param
                .and_then(Value::as_array)
                .map(|arr| arr.iter().map(|v| is_claimed_or_false(ledger, v)).collect())
                .unwrap_or_default();
            json!(claimed)
        }
        "airdrop_claim" => handle_claim(ledger, first_param),
        "airdrop_withdraw" => handle_withdraw(ledger, first_param),
        "airdrop_getEvents" => json!(ledger.events()),
        _ => json!(null),
    }
}

/// Batch entry lookup: anything that is not an in-range `u64` reads as unclaimed
fn is_claimed_or_false(ledger: &ClaimLedger, index: &Value) -> bool {
    index
        .as_u64()
        .is_some_and(|index| ledger.is_claimed(index).unwrap_or(false))
}

fn handle_claim(ledger: &ClaimLedger, param: Option<&Value>) -> Value {
    let Some(input) = param.and_then(|p| serde_json::from_value::<ClaimInput>(p.clone()).ok())
    else {
        return failure("MalformedRecord", "invalid claim");
    };

    let parsed = parse_address(&input.address)
        .and_then(|account| Ok((account, parse_amount(&input.amount)?)));
    let (account, amount) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => return failure("MalformedRecord", &e.to_string()),
    };

    // A digest of the wrong length can never be on a valid path
    let proof = match MerkleProof::from_hex(&input.proof) {
        Ok(proof) => proof,
        Err(e) => return failure("InvalidProof", &e.to_string()),
    };

    let result = parse_signature(&input.signature).and_then(|signature| {
        ledger.claim_signed(input.index, account, amount, proof.siblings(), &signature)
    });
    match result {
        Ok(receipt) => json!({
            "success": true,
            "index": receipt.index,
            "account": receipt.account,
            "amount": receipt.amount.to_string(),
        }),
        Err(e) => ledger_failure(&e),
    }
}

fn handle_withdraw(ledger: &ClaimLedger, param: Option<&Value>) -> Value {
    let caller = param
        .and_then(|p| serde_json::from_value::<WithdrawInput>(p.clone()).ok())
        .map(|input| parse_address(&input.from));
    let caller = match caller {
        Some(Ok(caller)) => caller,
        _ => return failure("MalformedRecord", "expected { from }"),
    };

    match ledger.withdraw(caller) {
        Ok(amount) => json!({ "success": true, "amount": amount.to_string() }),
        Err(e) => ledger_failure(&e),
    }
}

fn ledger_failure(e: &LedgerError) -> Value {
    failure(e.kind(), &e.to_string())
}

fn failure(kind: &str, message: &str) -> Value {
    json!({ "success": false, "error": kind, "message": message })
}

#[cfg(test)]
mod tests {
    use airdrop_ledger::{
        ManualClock, SECONDS_PER_DAY, SigningKey, sign_claim, signature_to_hex, signer_address,
    };
    use airdrop_merkle::{AllocationRecord, Amount};

    use super::*;

    const START: u64 = 1_700_000_000;

    fn alice() -> SigningKey {
        SigningKey::from_slice(&[0xa1; 32]).unwrap()
    }

    fn bob() -> SigningKey {
        SigningKey::from_slice(&[0xb2; 32]).unwrap()
    }

    fn setup() -> (MerkleTree, Arc<ManualClock>, NodeState) {
        let tree = MerkleTree::build(vec![
            AllocationRecord::new(0, signer_address(&alice()), Amount::from(10u64)),
            AllocationRecord::new(1, signer_address(&bob()), Amount::from(20u64)),
        ])
        .unwrap();
        let clock = Arc::new(ManualClock::new(START));
        let owner = Address::repeat_byte(0x0f);
        let state = NodeState::new(&tree, owner, clock.clone(), 30).unwrap();
        (tree, clock, state)
    }

    fn call(state: &NodeState, method: &str, params: Value) -> Value {
        let req = RpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params: Some(params),
            id: json!(1),
        };
        dispatch(state, &req)
    }

    fn claim_params(tree: &MerkleTree, position: usize, signer: &SigningKey) -> Value {
        let payload = tree.proof_artifact(position).unwrap();
        let signature = sign_claim(&tree.root(), &payload.record(), signer).unwrap();
        json!([{
            "index": payload.index,
            "address": payload.address.to_string(),
            "amount": payload.amount.to_string(),
            "proof": payload.proof.to_hex(),
            "signature": signature_to_hex(&signature),
        }])
    }

    #[test]
    fn test_claim_flow() {
        let (tree, _clock, state) = setup();

        let result = call(&state, "airdrop_claim", claim_params(&tree, 0, &alice()));
        assert_eq!(result["success"], true);
        assert_eq!(result["amount"], "10");

        let again = call(&state, "airdrop_claim", claim_params(&tree, 0, &alice()));
        assert_eq!(again["error"], "AlreadyClaimed");

        assert_eq!(
            call(&state, "airdrop_isClaimedBatch", json!([[0, 1, 7, "0"]])),
            json!([true, false, false, false])
        );
        assert_eq!(
            call(&state, "airdrop_isClaimed", json!([7]))["error"],
            "IndexOutOfRange"
        );
        let alice_address = signer_address(&alice()).to_string();
        assert_eq!(
            call(&state, "airdrop_balanceOf", json!([alice_address])),
            json!("10")
        );
        assert_eq!(call(&state, "airdrop_root", json!([])), json!(tree.root()));
        assert_eq!(
            call(&state, "airdrop_totalClaimed", json!([])),
            json!("10")
        );
    }

    #[test]
    fn test_claim_signed_by_other_key_rejected() {
        let (tree, _clock, state) = setup();

        // Valid proof for alice's record, signed by bob
        let result = call(&state, "airdrop_claim", claim_params(&tree, 0, &bob()));
        assert_eq!(result["success"], false);
        assert_eq!(result["error"], "NotAuthorized");
        assert_eq!(call(&state, "airdrop_isClaimed", json!([0])), json!(false));
        assert_eq!(
            call(&state, "airdrop_balanceOf", json!([signer_address(&bob()).to_string()])),
            json!("0")
        );

        let mut params = claim_params(&tree, 0, &alice());
        params[0]["signature"] = json!("0x1234");
        assert_eq!(
            call(&state, "airdrop_claim", params)["error"],
            "NotAuthorized"
        );

        let mut params = claim_params(&tree, 0, &alice());
        params[0]["signature"] = json!(format!("0x{}", "00".repeat(65)));
        assert_eq!(
            call(&state, "airdrop_claim", params)["error"],
            "NotAuthorized"
        );

        let mut params = claim_params(&tree, 0, &alice());
        params[0].as_object_mut().unwrap().remove("signature");
        assert_eq!(
            call(&state, "airdrop_claim", params)["error"],
            "MalformedRecord"
        );
    }

    #[test]
    fn test_claim_failure_kinds() {
        let (tree, _clock, state) = setup();

        let mut params = claim_params(&tree, 0, &alice());
        params[0]["proof"] = json!(["0x1234"]);
        assert_eq!(
            call(&state, "airdrop_claim", params)["error"],
            "InvalidProof"
        );

        let mut params = claim_params(&tree, 0, &alice());
        params[0]["amount"] = json!("11");
        assert_eq!(
            call(&state, "airdrop_claim", params)["error"],
            "InvalidProof"
        );

        let mut params = claim_params(&tree, 0, &alice());
        params[0]["address"] = json!("0x1234");
        assert_eq!(
            call(&state, "airdrop_claim", params)["error"],
            "MalformedRecord"
        );
    }

    #[test]
    fn test_withdraw_after_deadline() {
        let (_tree, clock, state) = setup();
        let params = json!([{ "from": Address::repeat_byte(0xcc).to_string() }]);

        assert_eq!(
            call(&state, "airdrop_withdraw", params.clone())["error"],
            "AirdropActive"
        );

        clock.advance(30 * SECONDS_PER_DAY);
        let result = call(&state, "airdrop_withdraw", params.clone());
        assert_eq!(result["success"], true);
        assert_eq!(result["amount"], "30");
        assert_eq!(call(&state, "airdrop_withdraw", params)["amount"], "0");
        assert_eq!(call(&state, "airdrop_status", json!([]))["status"], "Swept");
    }
}
