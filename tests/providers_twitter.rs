// tests/providers_twitter.rs
use chrono::{TimeZone, Utc};
use video_digest::ingest::providers::twitter::{decode_search, TwitterProvider};
use video_digest::ingest::types::{PostSource, ProfileSource};
use video_digest::{FetchError, MediaKind};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_JSON: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/espn_search.json"
));
const EMPTY_JSON: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/empty_search.json"
));
const USER_JSON: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/user_espn.json"
));

#[test]
fn fixture_decodes_into_typed_records() {
    let batch = decode_search(SEARCH_JSON).expect("fixture decodes");
    assert_eq!(batch.posts.len(), 5);
    assert_eq!(batch.media.len(), 4);

    let first = &batch.posts[0];
    assert_eq!(first.author_id, "2557521");
    assert_eq!(first.first_media_key(), Some("13_1763581001"));
    assert_eq!(
        first.created_at,
        Utc.with_ymd_and_hms(2024, 3, 1, 14, 2, 11).unwrap()
    );
    assert!(batch.posts[4].media_keys.is_empty());

    assert_eq!(batch.media[0].kind, MediaKind::Video);
    assert_eq!(batch.media[0].view_count, 250_000);
    assert_eq!(batch.media[2].kind, MediaKind::Photo);
    assert_eq!(batch.media[2].view_count, 0);
}

#[tokio::test]
async fn fixture_provider_serves_same_body_for_any_handle() {
    let p = TwitterProvider::from_fixture_str(SEARCH_JSON, USER_JSON);
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).unwrap();
    let batch = p.fetch_posts("anyone", start).await.unwrap();
    assert_eq!(batch.posts.len(), 5);
    let profile = p.fetch_profile("anyone").await.unwrap();
    assert_eq!(profile.followers, 51_250_000);
}

#[tokio::test]
async fn http_search_sends_window_and_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .and(query_param("query", "from:espn"))
        .and(query_param("start_time", "2024-03-01T07:00:00Z"))
        .and(query_param("max_results", "100"))
        .and(query_param("expansions", "attachments.media_keys"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_JSON))
        .expect(1)
        .mount(&server)
        .await;

    let p = TwitterProvider::from_bearer("test-token".into(), &server.uri(), 100).unwrap();
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).unwrap();
    let batch = p.fetch_posts("espn", start).await.expect("search ok");
    assert_eq!(batch.posts.len(), 5);
}

#[tokio::test]
async fn http_non_success_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
        .mount(&server)
        .await;

    let p = TwitterProvider::from_bearer("t".into(), &server.uri(), 100).unwrap();
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).unwrap();
    match p.fetch_posts("espn", start).await {
        Err(FetchError::Status { status, body }) => {
            assert_eq!(status, 429);
            assert_eq!(body, "Too Many Requests");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn http_zero_results_is_empty_batch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY_JSON))
        .mount(&server)
        .await;

    let p = TwitterProvider::from_bearer("t".into(), &server.uri(), 100).unwrap();
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).unwrap();
    let batch = p.fetch_posts("quiet", start).await.unwrap();
    assert!(batch.is_empty());
}

#[tokio::test]
async fn http_user_lookup_requests_public_metrics() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/by/username/espn"))
        .and(query_param("user.fields", "public_metrics"))
        .respond_with(ResponseTemplate::new(200).set_body_string(USER_JSON))
        .mount(&server)
        .await;

    let p = TwitterProvider::from_bearer("t".into(), &server.uri(), 100).unwrap();
    let profile = p.fetch_profile("espn").await.unwrap();
    assert_eq!(profile.id, "2557521");
    assert_eq!(profile.name.as_deref(), Some("ESPN"));
}
