/// Integration tests with a mocked scoring service
/// Exercises the scoring client against wiremock without hitting a real backend
use rust_eligibility_dashboard::models::{CustomerId, Fetched};
use rust_eligibility_dashboard::scoring_client::{ScoringApi, ScoringClient};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create a client pointing at the mock server
fn create_test_client(base_url: &str) -> ScoringClient {
    ScoringClient::with_settings(base_url, Duration::from_secs(2), 5).unwrap()
}

fn id(raw: &str) -> CustomerId {
    CustomerId::new(raw).unwrap()
}

#[tokio::test]
async fn test_enumeration_preserves_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([101, 102])))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let ids = client.fetch_enumeration().await;

    assert_eq!(ids, vec![id("101"), id("102")]);
}

#[tokio::test]
async fn test_enumeration_keeps_every_usable_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            101,
            18446744073709551615u64,
            100002.0,
            "A-17",
            null,
            ""
        ])))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let ids = client.fetch_enumeration().await;

    assert_eq!(
        ids,
        vec![
            id("101"),
            id("18446744073709551615"),
            id("100002"),
            id("A-17")
        ]
    );
}

#[tokio::test]
async fn test_enumeration_failure_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/clients"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());

    assert!(client.fetch_enumeration().await.is_empty());
}

#[tokio::test]
async fn test_profile_lookup_success() {
    let mock_server = MockServer::start().await;

    let mock_response = serde_json::json!([
        {
            "NAME_CONTRACT_TYPE": "Cash loans",
            "CODE_GENDER": "M",
            "AMT_CREDIT": 406597.5
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/client/101"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&mock_response))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let profile = client.fetch_profile(&id("101")).await.found().unwrap();

    assert_eq!(profile.display("NAME_CONTRACT_TYPE"), "Cash loans");
    assert_eq!(profile.display("AMT_CREDIT"), "406597.5");
    assert_eq!(profile.display("AMT_ANNUITY"), "N/A");
}

#[tokio::test]
async fn test_profile_lookup_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/client/999"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());

    assert_eq!(client.fetch_profile(&id("999")).await, Fetched::NotFound);
}

#[tokio::test]
async fn test_profile_empty_record_list_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/client/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());

    assert_eq!(client.fetch_profile(&id("5")).await, Fetched::NotFound);
}

#[tokio::test]
async fn test_prediction_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/predict/101"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(73)))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let result = client.fetch_prediction(&id("101")).await.found().unwrap();

    assert_eq!(result.probability(), 73.0);
}

#[tokio::test]
async fn test_prediction_server_error_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/predict/101"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());

    assert_eq!(client.fetch_prediction(&id("101")).await, Fetched::NotFound);
}

#[tokio::test]
async fn test_prediction_out_of_range_is_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/predict/101"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(140)))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());

    assert_eq!(client.fetch_prediction(&id("101")).await, Fetched::Unavailable);
}

#[tokio::test]
async fn test_global_interpretation_is_base64_encoded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/interpretation/global"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(b"png".to_vec()),
        )
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let image = client.fetch_global_interpretation().await.found().unwrap();

    assert_eq!(image.data_uri(), "data:image/png;base64,cG5n");
}

#[tokio::test]
async fn test_global_interpretation_error_is_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/interpretation/global"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());

    assert_eq!(client.fetch_global_interpretation().await, Fetched::Unavailable);
}

#[tokio::test]
async fn test_unreachable_service_never_errors() {
    // Bind then drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = create_test_client(&format!("http://{}", addr));

    assert!(client.fetch_enumeration().await.is_empty());
    assert_eq!(client.fetch_profile(&id("101")).await, Fetched::Unavailable);
    assert_eq!(client.fetch_prediction(&id("101")).await, Fetched::Unavailable);
    assert_eq!(client.fetch_global_interpretation().await, Fetched::Unavailable);
}

#[tokio::test]
async fn test_slow_service_times_out_as_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/predict/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!(73))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let client =
        ScoringClient::with_settings(&mock_server.uri(), Duration::from_millis(200), 5).unwrap();

    assert_eq!(client.fetch_prediction(&id("1")).await, Fetched::Unavailable);
}

#[tokio::test]
async fn test_circuit_opens_after_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/interpretation/global"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2) // Third call must be rejected by the open circuit
        .mount(&mock_server)
        .await;

    let client = ScoringClient::with_settings(&mock_server.uri(), Duration::from_secs(2), 2).unwrap();

    for _ in 0..3 {
        assert_eq!(client.fetch_global_interpretation().await, Fetched::Unavailable);
    }
}

#[tokio::test]
async fn test_not_found_answers_keep_circuit_closed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/client/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/client/101"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{"CODE_GENDER": "F"}])))
        .mount(&mock_server)
        .await;

    let client = ScoringClient::with_settings(&mock_server.uri(), Duration::from_secs(2), 2).unwrap();

    for _ in 0..3 {
        assert_eq!(client.fetch_profile(&id("404")).await, Fetched::NotFound);
    }
    assert!(matches!(client.fetch_profile(&id("101")).await, Fetched::Found(_)));
}

#[tokio::test]
async fn test_links_point_at_service() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server.uri());

    assert_eq!(
        client.local_interpretation_link(&id("101")).as_str(),
        format!("{}/interpretation/local/101", mock_server.uri())
    );
    assert_eq!(
        client.drift_link().as_str(),
        format!("{}/drift", mock_server.uri())
    );
}
