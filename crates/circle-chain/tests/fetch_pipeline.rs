//! Fetch, resolve and reconcile against in-memory contract state.

use std::sync::Arc;
use std::time::Duration;

use circle_chain::mock::{InjectedFailure, StaticCircleReader};
use circle_chain::{
    CandidateFetcher, ChainReadError, CircleUint, FetchError, FetchPolicy, WinnerService,
};
use circle_core::{Address, CircleStatus, CreditProfile, ResolutionRequest, WinnerSource, U256};

fn addr(fill: char) -> Address {
    Address::parse(&format!("0x{}", fill.to_string().repeat(40))).unwrap()
}

fn circle() -> Address {
    addr('c')
}

fn registry() -> Address {
    addr('e')
}

/// A: 5 votes / 300, B: 5 votes / 700, D: 10 votes / 100.
fn scenario() -> StaticCircleReader {
    let circle = circle();
    StaticCircleReader::new()
        .with_circle(circle.clone(), registry())
        .with_candidate(&circle, 0, addr('a'), 5u64)
        .with_candidate(&circle, 0, addr('b'), 5u64)
        .with_candidate(&circle, 0, addr('d'), 10u64)
        .with_credit_score(&registry(), addr('a'), 300u64)
        .with_credit_score(&registry(), addr('b'), 700u64)
        .with_credit_score(&registry(), addr('d'), 100u64)
}

fn service(reader: Arc<StaticCircleReader>) -> WinnerService {
    WinnerService::new(reader, FetchPolicy::default())
}

fn request(month: u64) -> ResolutionRequest {
    ResolutionRequest::new(circle(), month)
}

#[tokio::test]
async fn resolves_scenario_by_votes_then_score() {
    let result = service(Arc::new(scenario())).resolve(&request(0)).await.unwrap();

    let order: Vec<Address> = result.candidates.iter().map(|c| c.address.clone()).collect();
    assert_eq!(order, vec![addr('d'), addr('b'), addr('a')]);
    assert_eq!(result.winner, Some(addr('d')));
    assert_eq!(result.source, WinnerSource::Computed);
    assert_eq!(result.month, 0);
    assert_eq!(result.candidates[1].credit_score, U256::from(700u64));
}

#[tokio::test]
async fn scores_come_from_the_registry_the_circle_names() {
    // The decoy registry ranks A first; the circle's own registry ranks B first.
    let decoy = addr('9');
    let reader = StaticCircleReader::new()
        .with_circle(circle(), registry())
        .with_candidate(&circle(), 0, addr('a'), 5u64)
        .with_candidate(&circle(), 0, addr('b'), 5u64)
        .with_credit_score(&registry(), addr('a'), 300u64)
        .with_credit_score(&registry(), addr('b'), 700u64)
        .with_credit_score(&decoy, addr('a'), 900u64)
        .with_credit_score(&decoy, addr('b'), 100u64);

    let result = service(Arc::new(reader)).resolve(&request(0)).await.unwrap();

    assert_eq!(result.winner, Some(addr('b')));
    assert_eq!(result.candidates[0].credit_score, U256::from(700u64));
    assert_eq!(result.candidates[1].credit_score, U256::from(300u64));
}

#[tokio::test]
async fn undeployed_registry_fails_the_fetch() {
    let reader = StaticCircleReader::new()
        .with_candidate(&circle(), 0, addr('a'), 5u64)
        .with_credit_score(&registry(), addr('a'), 300u64);

    let err = service(Arc::new(reader)).resolve(&request(0)).await.unwrap_err();
    assert!(
        matches!(
            err,
            FetchError::InvalidResponse {
                read: "getCreditScore",
                source: ChainReadError::NoContract { .. }
            }
        ),
        "got {err:?}"
    );
}

#[tokio::test]
async fn empty_month_reads_nothing_else() {
    let reader = Arc::new(
        StaticCircleReader::new()
            .with_circle(circle(), registry())
            .with_empty_month(&circle(), 3),
    );
    let result = service(reader.clone()).resolve(&request(3)).await.unwrap();

    assert_eq!(result.winner, None);
    assert!(result.candidates.is_empty());
    assert_eq!(result.month, 3);
    assert_eq!(reader.calls("getCandidates"), 1);
    assert_eq!(reader.calls("creditRegistry"), 0);
    assert_eq!(reader.calls("getCandidateVotes"), 0);
    assert_eq!(reader.calls("getCreditScore"), 0);
    assert_eq!(reader.calls("getWinner"), 0);
}

#[tokio::test]
async fn fetch_keeps_candidate_list_order() {
    let reader = Arc::new(scenario());
    let fetcher = CandidateFetcher::new(reader.clone(), FetchPolicy::default());

    let candidates = fetcher.fetch(&circle(), 0).await.unwrap();
    let order: Vec<Address> = candidates.iter().map(|c| c.address.clone()).collect();
    assert_eq!(order, vec![addr('a'), addr('b'), addr('d')]);
    assert_eq!(reader.calls("creditRegistry"), 1);
    assert_eq!(reader.calls("getCandidateVotes"), 3);
    assert_eq!(reader.calls("getCreditScore"), 3);
}

#[tokio::test]
async fn undeployed_circle_is_not_found() {
    let err = service(Arc::new(StaticCircleReader::new()))
        .resolve(&request(0))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::NotFound { .. }), "got {err:?}");
}

#[tokio::test]
async fn reverted_candidate_list_is_not_found() {
    let reader = scenario().with_failure("getCandidates", InjectedFailure::Reverted);
    let err = service(Arc::new(reader)).resolve(&request(99)).await.unwrap_err();
    assert!(matches!(err, FetchError::NotFound { .. }), "got {err:?}");
}

#[tokio::test]
async fn failed_score_read_fails_the_request() {
    let reader = scenario().with_failure("getCreditScore", InjectedFailure::Rpc);
    let err = service(Arc::new(reader)).resolve(&request(0)).await.unwrap_err();
    match err {
        FetchError::TransientReadFailure { read, source } => {
            assert_eq!(read, "getCreditScore");
            assert!(matches!(source, ChainReadError::Rpc { .. }));
        }
        other => panic!("expected TransientReadFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_vote_read_is_invalid_response() {
    let reader = scenario().with_failure("getCandidateVotes", InjectedFailure::Decode);
    let err = service(Arc::new(reader)).resolve(&request(0)).await.unwrap_err();
    assert!(
        matches!(err, FetchError::InvalidResponse { read: "getCandidateVotes", .. }),
        "got {err:?}"
    );
    assert!(!err.is_transient());
}

#[tokio::test(start_paused = true)]
async fn stalled_read_times_out() {
    let reader = scenario().stall_on("getCandidateVotes");
    let policy = FetchPolicy {
        read_timeout: Duration::from_secs(1),
    };
    let fetcher = CandidateFetcher::new(Arc::new(reader), policy);

    let err = fetcher.fetch(&circle(), 0).await.unwrap_err();
    match err {
        FetchError::TransientReadFailure { read, source } => {
            assert_eq!(read, "getCandidateVotes");
            assert!(matches!(source, ChainReadError::Timeout { .. }));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn finalized_winner_overrides_computed() {
    let outsider = addr('f');
    let reader = scenario().with_winner(&circle(), 0, outsider.clone());
    let result = service(Arc::new(reader)).resolve(&request(0)).await.unwrap();

    assert_eq!(result.winner, Some(outsider));
    assert_eq!(result.source, WinnerSource::OnChain);
    // The ordered set is still the computed one.
    assert_eq!(result.candidates[0].address, addr('d'));
}

#[tokio::test]
async fn zero_winner_passes_computed_through() {
    let reader = scenario().with_winner(&circle(), 0, Address::zero());
    let result = service(Arc::new(reader)).resolve(&request(0)).await.unwrap();
    assert_eq!(result.winner, Some(addr('d')));
    assert_eq!(result.source, WinnerSource::Computed);
}

#[tokio::test]
async fn reverted_winner_read_means_unfinalized() {
    let reader = scenario().with_failure("getWinner", InjectedFailure::Reverted);
    let result = service(Arc::new(reader)).resolve(&request(0)).await.unwrap();
    assert_eq!(result.winner, Some(addr('d')));
}

#[tokio::test]
async fn unavailable_winner_read_propagates() {
    let reader = scenario().with_failure("getWinner", InjectedFailure::Unavailable);
    let err = service(Arc::new(reader)).resolve(&request(0)).await.unwrap_err();
    assert!(err.is_transient(), "got {err:?}");
}

#[tokio::test]
async fn voting_status_reports_contract_state() {
    let reader = scenario()
        .with_winner(&circle(), 0, addr('b'))
        .with_voting_ended(&circle(), 0, true);
    let status = service(Arc::new(reader))
        .voting_status(&circle(), 0)
        .await
        .unwrap();

    assert_eq!(status.month, 0);
    assert_eq!(status.candidates, vec![addr('a'), addr('b'), addr('d')]);
    assert_eq!(status.finalized_winner, Some(addr('b')));
    assert!(status.voting_ended);
}

#[tokio::test]
async fn voting_status_for_open_month() {
    let status = service(Arc::new(scenario()))
        .voting_status(&circle(), 0)
        .await
        .unwrap();
    assert_eq!(status.finalized_winner, None);
    assert!(!status.voting_ended);
}

#[tokio::test]
async fn circle_summary_reads_headline_state() {
    let reader = scenario()
        .with_current_month(&circle(), 2u64)
        .with_total_participants(&circle(), 6u64);
    let summary = service(Arc::new(reader))
        .circle_summary(&circle())
        .await
        .unwrap();

    assert_eq!(summary.address, circle());
    assert_eq!(summary.current_month, U256::from(2u64));
    assert_eq!(summary.total_participants, U256::from(6u64));
    assert_eq!(summary.credit_registry, registry());

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["currentMonth"], "2");
    assert_eq!(json["totalParticipants"], "6");
    assert_eq!(json["status"], "PENDING");
}

#[tokio::test]
async fn circle_summary_reads_configuration_and_balances() {
    let wei = U256::from(10u64).pow(U256::from(18u64));
    let reader = scenario()
        .with_creator(&circle(), addr('f'))
        .with_status(&circle(), CircleStatus::Active)
        .with_circle_uint(&circle(), CircleUint::MonthlyContribution, wei)
        .with_circle_uint(&circle(), CircleUint::DurationInMonths, 6u64)
        .with_circle_uint(&circle(), CircleUint::MinParticipants, 3u64)
        .with_circle_uint(&circle(), CircleUint::MaxParticipants, 6u64)
        .with_circle_uint(&circle(), CircleUint::ReservePercentage, 10u64)
        .with_circle_uint(&circle(), CircleUint::PoolBalance, wei * U256::from(4u64));
    let summary = service(Arc::new(reader))
        .circle_summary(&circle())
        .await
        .unwrap();

    assert_eq!(summary.creator, addr('f'));
    assert_eq!(summary.status, CircleStatus::Active);
    assert_eq!(summary.duration_in_months, U256::from(6u64));
    assert_eq!(summary.reserve_percentage, U256::from(10u64));

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["status"], "ACTIVE");
    assert_eq!(json["monthlyContribution"], "1000000000000000000");
    assert_eq!(json["poolBalance"], "4000000000000000000");
    assert_eq!(json["minParticipants"], "3");
}

#[tokio::test]
async fn circle_summary_fails_when_any_field_fails() {
    let reader = scenario().with_failure("poolBalance", InjectedFailure::Timeout);
    let err = service(Arc::new(reader))
        .circle_summary(&circle())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::TransientReadFailure { read: "poolBalance", .. }));
}

fn profile(score: u64) -> CreditProfile {
    CreditProfile {
        credit_score: U256::from(score),
        circles_joined: U256::from(2u64),
        on_time_payments: U256::from(11u64),
        ..CreditProfile::default()
    }
}

#[tokio::test]
async fn credit_report_through_circle_uses_its_registry() {
    let reader = scenario()
        .with_credit_profile(&registry(), addr('b'), profile(700))
        .with_credit_profile(&addr('9'), addr('b'), profile(100));
    let service = service(Arc::new(reader)).with_credit_registry(addr('9'));

    let report = service.credit_report(&addr('b'), Some(&circle())).await.unwrap();
    assert_eq!(report.registry, registry());
    assert_eq!(report.credit_score, U256::from(700u64));
    assert_eq!(report.profile, profile(700));
}

#[tokio::test]
async fn credit_report_without_circle_uses_configured_registry() {
    let reader = StaticCircleReader::new()
        .with_credit_score(&registry(), addr('a'), 450u64)
        .with_credit_profile(&registry(), addr('a'), profile(450));
    let service = service(Arc::new(reader)).with_credit_registry(registry());

    let report = service.credit_report(&addr('a'), None).await.unwrap();
    assert_eq!(report.credit_score, U256::from(450u64));
    assert_eq!(report.profile.on_time_payments, U256::from(11u64));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["creditScore"], "450");
    assert_eq!(json["profile"]["circlesJoined"], "2");
}

#[tokio::test]
async fn credit_report_without_registry_is_not_configured() {
    let err = service(Arc::new(scenario()))
        .credit_report(&addr('a'), None)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::NotConfigured("CREDIT_REGISTRY_ADDRESS")));
}

fn factory() -> Address {
    addr('8')
}

fn factory_reader() -> StaticCircleReader {
    (1..=5u8).fold(StaticCircleReader::new(), |reader, i| {
        reader.with_factory_circle(&factory(), addr(char::from(b'0' + i)))
    })
}

#[tokio::test]
async fn list_circles_pages_the_factory() {
    let reader = Arc::new(factory_reader());
    let service = service(reader.clone()).with_factory(factory());

    let page = service.list_circles(3, 50).await.unwrap();
    assert_eq!(page.total, U256::from(5u64));
    assert_eq!(page.offset, 3);
    assert_eq!(page.circles, vec![addr('4'), addr('5')]);
    assert_eq!(page.factory, factory());
}

#[tokio::test]
async fn list_circles_past_the_end_skips_the_listing_read() {
    let reader = Arc::new(factory_reader());
    let service = service(reader.clone()).with_factory(factory());

    let page = service.list_circles(5, 10).await.unwrap();
    assert!(page.circles.is_empty());
    assert_eq!(reader.calls("getCircleCount"), 1);
    assert_eq!(reader.calls("getCircles"), 0);
}

#[tokio::test]
async fn list_circles_without_factory_is_not_configured() {
    let err = service(Arc::new(factory_reader()))
        .list_circles(0, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::NotConfigured("FACTORY_ADDRESS")));
}

#[tokio::test]
async fn user_circles_reads_the_factory_index() {
    let reader = factory_reader()
        .with_user_circle(&factory(), addr('a'), addr('2'))
        .with_user_circle(&factory(), addr('a'), addr('5'));
    let service = service(Arc::new(reader)).with_factory(factory());

    assert_eq!(
        service.user_circles(&addr('a')).await.unwrap(),
        vec![addr('2'), addr('5')]
    );
    assert!(service.user_circles(&addr('b')).await.unwrap().is_empty());
}

#[tokio::test]
async fn circle_summary_of_missing_circle_is_not_found() {
    let err = service(Arc::new(StaticCircleReader::new()))
        .circle_summary(&circle())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::NotFound { .. }));
}
