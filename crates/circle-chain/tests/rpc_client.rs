//! JSON-RPC reader tests against a wiremock node.

use std::sync::Arc;
use std::time::Duration;

use circle_chain::{
    ChainConfig, ChainReadError, CircleReader, CircleUint, RpcCircleReader, WinnerService,
};
use circle_core::{Address, CircleStatus, ResolutionRequest, U256};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CIRCLE: &str = "0xc1c1c1c1c1c1c1c1c1c1c1c1c1c1c1c1c1c1c1c1";
const REGISTRY: &str = "0x7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e";
const DECOY_REGISTRY: &str = "0x9d9d9d9d9d9d9d9d9d9d9d9d9d9d9d9d9d9d9d9d";
const FACTORY: &str = "0xfacf00000000000000000000000000000000fac7";
const A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
const C: &str = "cccccccccccccccccccccccccccccccccccccccc";

fn word(hex_digits: &str) -> String {
    format!("{hex_digits:0>64}")
}

fn uint(value: u64) -> String {
    format!("0x{}", word(&format!("{value:x}")))
}

fn address_array(items: &[&str]) -> String {
    let mut out = format!("0x{}{}", word("20"), word(&format!("{:x}", items.len())));
    for item in items {
        out.push_str(&word(item));
    }
    out
}

fn rpc_result(result: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
}

fn rpc_error(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "error": {"code": code, "message": message}
    }))
}

async fn mount(server: &MockServer, needles: &[&str], response: ResponseTemplate) {
    let mut mock = Mock::given(method("POST"));
    for needle in needles {
        mock = mock.and(body_string_contains(*needle));
    }
    mock.respond_with(response).mount(server).await;
}

fn reader_for(server: &MockServer) -> RpcCircleReader {
    let config = ChainConfig::local_mock(&server.uri()).unwrap();
    RpcCircleReader::new(&config).unwrap()
}

fn retrying_reader_for(server: &MockServer, max_retries: u32) -> RpcCircleReader {
    let config = ChainConfig {
        max_retries,
        ..ChainConfig::local_mock(&server.uri()).unwrap()
    };
    RpcCircleReader::new(&config).unwrap()
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map_or(0, |requests| requests.len())
}

fn circle() -> Address {
    Address::parse(CIRCLE).unwrap()
}

#[tokio::test]
async fn decodes_candidate_list() {
    let server = MockServer::start().await;
    mount(&server, &["3e39a7a5"], rpc_result(&address_array(&[A, B]))).await;

    let candidates = reader_for(&server).candidates(&circle(), 0).await.unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].as_str(), format!("0x{A}"));
    assert_eq!(candidates[1].as_str(), format!("0x{B}"));
}

#[tokio::test]
async fn sends_month_and_candidate_in_calldata() {
    let server = MockServer::start().await;
    let calldata = format!("0x05ea879c{}{}", word("7"), word(A));
    mount(&server, &[calldata.as_str(), "latest"], rpc_result(&uint(42))).await;

    let votes = reader_for(&server)
        .candidate_votes(&circle(), 7, &Address::parse(&format!("0x{A}")).unwrap())
        .await
        .unwrap();
    assert_eq!(votes, U256::from(42u64));
}

#[tokio::test]
async fn decodes_full_width_scores() {
    let server = MockServer::start().await;
    mount(&server, &["d3dd2bdf"], rpc_result(&format!("0x{}", "f".repeat(64)))).await;

    let score = reader_for(&server)
        .credit_score(&Address::parse(REGISTRY).unwrap(), &circle())
        .await
        .unwrap();
    assert_eq!(score, U256::MAX);
}

#[tokio::test]
async fn empty_return_data_means_no_contract() {
    let server = MockServer::start().await;
    mount(&server, &["3e39a7a5"], rpc_result("0x")).await;

    let err = reader_for(&server).candidates(&circle(), 0).await.unwrap_err();
    assert!(matches!(err, ChainReadError::NoContract { .. }), "got {err:?}");
}

#[tokio::test]
async fn execution_revert_is_reverted() {
    let server = MockServer::start().await;
    mount(&server, &["4129b2c9"], rpc_error(3, "execution reverted: voting open")).await;

    let err = reader_for(&server).winner(&circle(), 0).await.unwrap_err();
    match err {
        ChainReadError::Reverted { call, reason } => {
            assert_eq!(call, "getWinner");
            assert!(reason.contains("voting open"));
        }
        other => panic!("expected Reverted, got {other:?}"),
    }
}

#[tokio::test]
async fn node_error_is_rpc_error() {
    let server = MockServer::start().await;
    mount(&server, &["b015a5e8"], rpc_error(-32000, "header not found")).await;

    let err = reader_for(&server).credit_registry(&circle()).await.unwrap_err();
    assert!(matches!(err, ChainReadError::Rpc { code: -32000, .. }), "got {err:?}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn http_error_status_is_reported() {
    let server = MockServer::start().await;
    mount(&server, &["eth_call"], ResponseTemplate::new(502).set_body_string("bad gateway")).await;

    let err = reader_for(&server)
        .circle_uint(&circle(), CircleUint::CurrentMonth)
        .await
        .unwrap_err();
    assert!(matches!(err, ChainReadError::HttpStatus { status: 502, .. }), "got {err:?}");
}

#[tokio::test]
async fn malformed_result_is_decode_error() {
    let server = MockServer::start().await;
    mount(&server, &["a26dbf26"], rpc_result("0x1234")).await;

    let err = reader_for(&server)
        .circle_uint(&circle(), CircleUint::TotalParticipants)
        .await
        .unwrap_err();
    assert!(matches!(err, ChainReadError::Decode { .. }), "got {err:?}");
}

#[tokio::test]
async fn slow_node_times_out() {
    let server = MockServer::start().await;
    mount(
        &server,
        &["34105238"],
        rpc_result(&uint(1)).set_delay(Duration::from_secs(3)),
    )
    .await;

    let config = ChainConfig {
        timeout_secs: 1,
        ..ChainConfig::local_mock(&server.uri()).unwrap()
    };
    let reader = RpcCircleReader::new(&config).unwrap();
    let err = reader.voting_period_ended(&circle(), 0).await.unwrap_err();
    assert!(matches!(err, ChainReadError::Timeout { .. }), "got {err:?}");
}

#[tokio::test]
async fn reads_chain_id() {
    let server = MockServer::start().await;
    mount(&server, &["eth_chainId"], rpc_result("0x18e8f")).await;

    assert_eq!(reader_for(&server).chain_id().await.unwrap(), 102_031);
}

#[tokio::test]
async fn resolves_scenario_over_json_rpc() {
    let server = MockServer::start().await;
    mount(&server, &["3e39a7a5"], rpc_result(&address_array(&[A, B, C]))).await;
    mount(&server, &["b015a5e8"], rpc_result(&format!("0x{}", word(&REGISTRY[2..])))).await;
    for (who, votes, score) in [(A, 5, 300), (B, 5, 700), (C, 10, 100)] {
        mount(&server, &["05ea879c", who], rpc_result(&uint(votes))).await;
        mount(&server, &["d3dd2bdf", &REGISTRY[2..], who], rpc_result(&uint(score))).await;
        // Same account on another registry would reverse the B/A order.
        mount(&server, &["d3dd2bdf", &DECOY_REGISTRY[2..], who], rpc_result(&uint(1000 - score))).await;
    }
    mount(&server, &["4129b2c9"], rpc_result(&format!("0x{}", word("0")))).await;

    let config = ChainConfig::local_mock(&server.uri()).unwrap();
    let reader = RpcCircleReader::new(&config).unwrap();
    let service = WinnerService::new(Arc::new(reader), config.fetch_policy());

    let result = service
        .resolve(&ResolutionRequest::new(circle(), 0))
        .await
        .unwrap();
    let order: Vec<&str> = result.candidates.iter().map(|c| c.address.as_str()).collect();
    assert_eq!(order, vec![format!("0x{C}"), format!("0x{B}"), format!("0x{A}")]);
    assert_eq!(result.winner.unwrap().as_str(), format!("0x{C}"));
}

#[tokio::test]
async fn unavailable_node_is_retried_until_it_answers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount(&server, &["862a4d47"], rpc_result(&uint(4))).await;

    let month = retrying_reader_for(&server, 3)
        .circle_uint(&circle(), CircleUint::CurrentMonth)
        .await
        .unwrap();
    assert_eq!(month, U256::from(4u64));
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn node_error_is_retried_until_it_answers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32000, "message": "header not found"}
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount(&server, &["b015a5e8"], rpc_result(&format!("0x{}", word(&REGISTRY[2..])))).await;

    let registry = retrying_reader_for(&server, 3)
        .credit_registry(&circle())
        .await
        .unwrap();
    assert_eq!(registry, Address::parse(REGISTRY).unwrap());
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn persistent_outage_exhausts_retries() {
    let server = MockServer::start().await;
    mount(&server, &["eth_call"], ResponseTemplate::new(503)).await;

    let err = retrying_reader_for(&server, 2)
        .winner(&circle(), 0)
        .await
        .unwrap_err();
    assert!(matches!(err, ChainReadError::HttpStatus { status: 503, .. }), "got {err:?}");
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn revert_is_not_retried() {
    let server = MockServer::start().await;
    mount(&server, &["3e39a7a5"], rpc_error(3, "execution reverted")).await;

    let err = retrying_reader_for(&server, 3)
        .candidates(&circle(), 9)
        .await
        .unwrap_err();
    assert!(matches!(err, ChainReadError::Reverted { .. }), "got {err:?}");
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn client_error_status_is_not_retried() {
    let server = MockServer::start().await;
    mount(&server, &["eth_call"], ResponseTemplate::new(401).set_body_string("unauthorized")).await;

    let err = retrying_reader_for(&server, 3)
        .circle_uint(&circle(), CircleUint::PoolBalance)
        .await
        .unwrap_err();
    assert!(matches!(err, ChainReadError::HttpStatus { status: 401, .. }), "got {err:?}");
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn reads_circle_status_and_creator() {
    let server = MockServer::start().await;
    mount(&server, &["200d2ed2", &CIRCLE[2..]], rpc_result(&uint(3))).await;
    mount(&server, &["02d05d3f", &CIRCLE[2..]], rpc_result(&format!("0x{}", word(A)))).await;

    let reader = reader_for(&server);
    assert_eq!(reader.status(&circle()).await.unwrap(), CircleStatus::Cancelled);
    assert_eq!(reader.creator(&circle()).await.unwrap().as_str(), format!("0x{A}"));
}

#[tokio::test]
async fn unknown_status_code_is_decode_error() {
    let server = MockServer::start().await;
    mount(&server, &["200d2ed2"], rpc_result(&uint(7))).await;

    let err = reader_for(&server).status(&circle()).await.unwrap_err();
    assert!(matches!(err, ChainReadError::Decode { .. }), "got {err:?}");
}

#[tokio::test]
async fn reads_credit_profile_from_registry() {
    let server = MockServer::start().await;
    let tuple = format!(
        "0x{}{}{}{}{}{}{}",
        word("226"),
        word("4"),
        word("3"),
        word("1e"),
        word("2"),
        word("1"),
        word("1"),
    );
    mount(&server, &["079bafe3", &REGISTRY[2..], A], rpc_result(&tuple)).await;

    let profile = reader_for(&server)
        .credit_profile(
            &Address::parse(REGISTRY).unwrap(),
            &Address::parse(&format!("0x{A}")).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(profile.credit_score, U256::from(550u64));
    assert_eq!(profile.on_time_payments, U256::from(30u64));
    assert_eq!(profile.defaults, U256::one());
    assert!(profile.has_defaulted);
}

#[tokio::test]
async fn pages_factory_listing() {
    let server = MockServer::start().await;
    mount(&server, &["e1f2dfce", &FACTORY[2..]], rpc_result(&uint(12))).await;
    let calldata = format!("a23b7dd5{}{}", word("a"), word("2"));
    mount(&server, &[calldata.as_str(), &FACTORY[2..]], rpc_result(&address_array(&[B, C]))).await;

    let config = ChainConfig {
        factory: Some(Address::parse(FACTORY).unwrap()),
        ..ChainConfig::local_mock(&server.uri()).unwrap()
    };
    let service = WinnerService::from_config(&config).unwrap();

    let page = service.list_circles(10, 50).await.unwrap();
    assert_eq!(page.total, U256::from(12u64));
    let listed: Vec<&str> = page.circles.iter().map(Address::as_str).collect();
    assert_eq!(listed, vec![format!("0x{B}"), format!("0x{C}")]);
}

#[tokio::test]
async fn reads_user_circles_from_factory() {
    let server = MockServer::start().await;
    mount(&server, &["88e81d8a", &FACTORY[2..], A], rpc_result(&address_array(&[C]))).await;

    let circles = reader_for(&server)
        .user_circles(
            &Address::parse(FACTORY).unwrap(),
            &Address::parse(&format!("0x{A}")).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(circles.len(), 1);
    assert_eq!(circles[0].as_str(), format!("0x{C}"));
}
