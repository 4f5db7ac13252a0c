//! HTTP transports against small axum fakes on ephemeral ports.
//!
//! The fake oracle holds one Ed25519 key and speaks the `{code, msg, data}`
//! envelope. The fake node answers the `xchain_*` JSON-RPC methods the
//! tests need and records what it is posted.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use xchain_sdk::codec::{amount_to_bytes, decode_base64, encode_base64};
use xchain_sdk::config::{LedgerConfig, OracleConfig};
use xchain_sdk::crypto::{verify_signature, KeyPair};
use xchain_sdk::ledger::rpc::{RpcError, RpcMethod, RpcRequest, RpcResponse, TX_NOT_FOUND};
use xchain_sdk::ledger::{
    BalanceDetail, JsonRpcLedger, LedgerRpc, TxStatus, TxStatusEnvelope, UtxoQuery,
    UtxoSelection,
};
use xchain_sdk::oracle::{HttpOracle, OracleResponse, SignPayload, SigningOracle};
use xchain_sdk::transaction::{SignedTx, TxBody, Utxo};
use xchain_sdk::{Acl, Client, ClientConfig, Error, Identity, RequestOptions, TxState};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn field(args: &Value, name: &str) -> Vec<u8> {
    args.get(name)
        .and_then(Value::as_str)
        .map(|s| decode_base64(s).unwrap())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Fake oracle
// ---------------------------------------------------------------------------

struct OracleFake {
    key: KeyPair,
}

fn flag(value: bool) -> Json<OracleResponse> {
    Json(OracleResponse::success(value.to_string()))
}

async fn oracle_ping() -> Json<OracleResponse> {
    Json(OracleResponse::success("pong"))
}

async fn oracle_create(State(fake): State<Arc<OracleFake>>) -> Json<OracleResponse> {
    Json(OracleResponse::success(fake.key.address()))
}

async fn oracle_exist(
    State(fake): State<Arc<OracleFake>>,
    Json(args): Json<Value>,
) -> Json<OracleResponse> {
    flag(args["address"] == fake.key.address())
}

async fn oracle_sign(
    State(fake): State<Arc<OracleFake>>,
    Json(args): Json<Value>,
) -> Json<OracleResponse> {
    if args["address"] != fake.key.address() {
        return Json(OracleResponse::failure(500, "unknown address"));
    }
    let payload = SignPayload {
        public_key: fake.key.public_key_hex(),
        sign: fake.key.sign(&field(&args, "msg")),
    };
    Json(OracleResponse::success(serde_json::to_vec(&payload).unwrap()))
}

async fn oracle_verify(
    State(fake): State<Arc<OracleFake>>,
    Json(args): Json<Value>,
) -> Json<OracleResponse> {
    let payload: SignPayload = serde_json::from_slice(&field(&args, "sign")).unwrap();
    let ok = args["address"] == fake.key.address()
        && verify_signature(&payload.public_key, &field(&args, "msg"), &payload.sign);
    flag(ok)
}

async fn oracle() -> (HttpOracle, String) {
    let fake = Arc::new(OracleFake {
        key: KeyPair::from_seed(&[9; 32]),
    });
    let address = fake.key.address();
    let app = Router::new()
        .route("/ping", get(oracle_ping))
        .route("/create", get(oracle_create))
        .route("/exist", post(oracle_exist))
        .route("/sign", post(oracle_sign))
        .route("/verify", post(oracle_verify))
        .with_state(fake);
    let url = serve(app).await;
    (HttpOracle::new(OracleConfig::with_url(url)).unwrap(), address)
}

// ---------------------------------------------------------------------------
// Fake ledger node
// ---------------------------------------------------------------------------

#[derive(Default)]
struct LedgerFake {
    posted: Mutex<Vec<TxStatusEnvelope>>,
    reject_posts: bool,
}

fn rpc_result(fake: &LedgerFake, request: RpcRequest) -> Result<Value, RpcError> {
    match request.method {
        RpcMethod::GetBalance => Ok(json!(encode_base64(&amount_to_bytes(1234)))),
        RpcMethod::SelectUtxo => {
            let query: UtxoQuery = serde_json::from_value(request.params)
                .map_err(|e| RpcError::invalid_params(e.to_string()))?;
            if query.address == "pauper" {
                return Err(RpcError::not_enough_utxo(query.total_amount, 120));
            }
            let amount = query.total_amount + 5;
            let selection = UtxoSelection {
                utxos: vec![Utxo {
                    ref_txid: vec![7; 32],
                    ref_offset: 0,
                    to_addr: query.address,
                    amount,
                }],
                total_selected: amount,
            };
            Ok(serde_json::to_value(selection).unwrap())
        }
        RpcMethod::PostTx => {
            if fake.reject_posts {
                return Err(RpcError::transaction_rejected("TX_SIGN_ERROR"));
            }
            let envelope: TxStatusEnvelope = serde_json::from_value(request.params)
                .map_err(|e| RpcError::invalid_params(e.to_string()))?;
            fake.posted.lock().push(envelope);
            Ok(Value::Null)
        }
        RpcMethod::QueryTx => Err(RpcError::transaction_not_found("unknown")),
        RpcMethod::QueryAccountAcl => Ok(serde_json::to_value(Acl::single_signer("alice")).unwrap()),
        RpcMethod::QueryMethodAcl => Ok(Value::Null),
        RpcMethod::QueryAccountContracts => {
            if request.params["account"] != "XC1111111111111111@xuper" {
                return Ok(json!([]));
            }
            Ok(json!([{ "contract_name": "counter", "txid": "ab01", "runtime": "c" }]))
        }
        RpcMethod::QueryAddressContracts => Ok(json!({
            "XC1111111111111111@xuper": [{ "contract_name": "counter" }],
        })),
        RpcMethod::GetBalanceDetail => Ok(json!([
            { "balance": encode_base64(&amount_to_bytes(1000)) },
            { "balance": encode_base64(&amount_to_bytes(234)), "is_frozen": true },
        ])),
        RpcMethod::GetSystemStatus => Ok(json!({
            "chains": [{ "bcname": "xuper", "height": 42 }],
            "peer_urls": ["/ip4/127.0.0.1/tcp/47101"],
        })),
        RpcMethod::GetBlockChains => Ok(json!(["xuper"])),
        other => Err(RpcError::method_not_found(other.as_str())),
    }
}

async fn ledger_rpc(
    State(fake): State<Arc<LedgerFake>>,
    Json(request): Json<RpcRequest>,
) -> Json<RpcResponse> {
    let id = request.id.clone();
    Json(match rpc_result(&fake, request) {
        Ok(result) => RpcResponse::success(id, result),
        Err(error) => RpcResponse::error(id, error),
    })
}

async fn ledger(reject_posts: bool) -> (JsonRpcLedger, Arc<LedgerFake>) {
    let fake = Arc::new(LedgerFake {
        reject_posts,
        ..LedgerFake::default()
    });
    let app = Router::new()
        .route("/", post(ledger_rpc))
        .with_state(fake.clone());
    let config = LedgerConfig {
        endpoint: serve(app).await,
        ..LedgerConfig::default()
    };
    (JsonRpcLedger::new(&config).unwrap(), fake)
}

// ---------------------------------------------------------------------------
// Oracle transport
// ---------------------------------------------------------------------------

#[tokio::test]
async fn oracle_capabilities_round_trip() {
    let (oracle, address) = oracle().await;

    oracle.ping().await.unwrap();
    assert_eq!(oracle.create().await.unwrap(), address);
    assert!(oracle.exists(&address).await.unwrap());
    assert!(!oracle.exists("stranger").await.unwrap());

    let signature = oracle.sign(&address, b"digest").await.unwrap();
    assert!(oracle.verify(&address, b"digest", &signature).await.unwrap());
    assert!(!oracle.verify(&address, b"other", &signature).await.unwrap());
}

#[tokio::test]
async fn oracle_refusal_keeps_code_and_message() {
    let (oracle, _) = oracle().await;

    let err = oracle.sign("stranger", b"digest").await.unwrap_err();
    assert!(matches!(
        err,
        Error::OracleRejected { code: 500, ref message } if message == "unknown address"
    ));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn identities_are_created_and_recovered_over_http() {
    let (oracle, address) = oracle().await;
    let oracle: Arc<dyn SigningOracle> = Arc::new(oracle);

    let created = Identity::create(oracle.clone()).await.unwrap();
    assert_eq!(created.address(), address);

    let recovered = Identity::recover(oracle.clone(), &address).await.unwrap();
    assert_eq!(recovered.address(), address);
    assert!(Identity::recover(oracle, "stranger").await.is_err());
}

#[tokio::test]
async fn unreachable_oracle_is_unavailable() {
    let mut config = OracleConfig::with_url("http://127.0.0.1:9");
    config.timeout_ms = 500;
    let oracle = HttpOracle::new(config).unwrap();

    let err = oracle.ping().await.unwrap_err();
    assert!(matches!(err, Error::OracleUnavailable(_)));
    assert!(err.is_retryable());
}

// ---------------------------------------------------------------------------
// Ledger transport
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ledger_queries_decode_node_answers() {
    let (ledger, _) = ledger(false).await;

    assert_eq!(ledger.get_balance("xuper", "alice").await.unwrap(), 1234);
    assert_eq!(
        ledger.query_account_acl("xuper", "XC1111111111111111@xuper").await.unwrap(),
        Some(Acl::single_signer("alice"))
    );
    assert_eq!(
        ledger.query_method_acl("xuper", "counter", "get").await.unwrap(),
        None
    );

    let err = ledger.query_tx("xuper", &[1, 2, 3]).await.unwrap_err();
    assert!(matches!(err, Error::Ledger { code: TX_NOT_FOUND, .. }));

    let err = ledger.get_block_by_height("xuper", 1).await.unwrap_err();
    assert!(matches!(err, Error::Ledger { .. }));
}

#[tokio::test]
async fn contract_and_node_queries_decode_node_answers() {
    let (ledger, _) = ledger(false).await;

    let contracts = ledger
        .query_account_contracts("xuper", "XC1111111111111111@xuper")
        .await
        .unwrap();
    assert_eq!(contracts.len(), 1);
    assert_eq!(contracts[0].contract_name, "counter");
    assert_eq!(contracts[0].runtime, "c");
    assert!(!contracts[0].is_banned);

    let by_account = ledger.query_address_contracts("xuper", "alice").await.unwrap();
    assert_eq!(by_account["XC1111111111111111@xuper"][0].contract_name, "counter");

    let detail = ledger.get_balance_detail("xuper", "alice").await.unwrap();
    assert_eq!(
        detail,
        vec![
            BalanceDetail {
                balance: 1000,
                is_frozen: false
            },
            BalanceDetail {
                balance: 234,
                is_frozen: true
            },
        ]
    );

    let status = ledger.get_system_status().await.unwrap();
    assert_eq!(status.chains[0].height, 42);
    assert!(status.chains[0].tip_blockid.is_empty());
    assert_eq!(status.peer_urls.len(), 1);
    assert_eq!(ledger.get_blockchains().await.unwrap(), vec!["xuper".to_string()]);
}

#[tokio::test]
async fn not_enough_utxo_maps_to_insufficient_funds() {
    let (ledger, _) = ledger(false).await;

    let err = ledger
        .select_utxo(UtxoQuery {
            bcname: "xuper".into(),
            address: "pauper".into(),
            total_amount: 500,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InsufficientFunds {
            required: 500,
            available: 120
        }
    ));
}

#[tokio::test]
async fn rejected_post_carries_ledger_reason() {
    let (ledger, _) = ledger(true).await;
    let tx = SignedTx {
        txid: vec![1; 32],
        body: TxBody::default(),
        initiator_signs: Vec::new(),
        auth_require_signs: Vec::new(),
    };

    let err = ledger.post_tx("xuper", &tx).await.unwrap_err();
    assert!(matches!(
        err,
        Error::SubmitRejected { code: -32003, ref reason } if reason == "TX_SIGN_ERROR"
    ));
}

// ---------------------------------------------------------------------------
// Full pipeline over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transfer_over_both_transports() {
    let (oracle, address) = oracle().await;
    let (ledger, fake) = ledger(false).await;
    let client = Client::new(ClientConfig::default(), Arc::new(ledger));
    let alice = Identity::from_address(address.clone(), Arc::new(oracle));

    let tx = client
        .transfer(&alice, "bob", 20, RequestOptions::new().fee(2))
        .await
        .unwrap();
    assert_eq!(tx.state(), TxState::Submitted);

    let posted = fake.posted.lock();
    assert_eq!(posted.len(), 1);
    let envelope = &posted[0];
    assert_eq!(envelope.status, TxStatus::Unconfirm);
    assert_eq!(envelope.bcname, "xuper");
    assert_eq!(envelope.txid, tx.txid());
    assert_eq!(envelope.tx, tx.to_signed());

    let outputs: Vec<(&str, u64)> = envelope
        .tx
        .body
        .outputs
        .iter()
        .map(|o| (o.to_addr.as_str(), o.amount))
        .collect();
    assert_eq!(outputs, vec![("bob", 20), ("$", 2), (address.as_str(), 5)]);

    let signature = &envelope.tx.auth_require_signs[0];
    let digest = tx.digest().unwrap();
    assert!(verify_signature(&signature.public_key, digest, &signature.sign));
}

#[tokio::test]
async fn rejected_submission_keeps_signed_transaction_for_retry() {
    let (oracle, address) = oracle().await;
    let alice = Identity::from_address(address, Arc::new(oracle));
    let (rejecting, _) = ledger(true).await;
    let (accepting, fake) = ledger(false).await;
    let first = Client::new(ClientConfig::default(), Arc::new(rejecting));
    let second = Client::new(ClientConfig::default(), Arc::new(accepting));

    let mut tx = first
        .transfer(&alice, "bob", 20, RequestOptions::new().fee(2).build_only())
        .await
        .unwrap();
    let err = first.sign_and_post(&mut tx, &alice).await.unwrap_err();
    assert!(matches!(err, Error::SubmitRejected { .. }));
    assert_eq!(tx.state(), TxState::FullySigned);
    let txid = tx.txid().to_vec();

    second.post_tx(&mut tx).await.unwrap();
    assert_eq!(tx.state(), TxState::Submitted);
    assert_eq!(tx.txid(), txid.as_slice());
    assert_eq!(fake.posted.lock()[0].txid, txid);
}
