use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::TvdbClient;
use crate::error::SourceError;
use crate::http::RetryPolicy;

async fn mount_login(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"apikey": "key"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"token": "tok"}})))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn client(server: &MockServer, language: &str) -> TvdbClient {
    TvdbClient::new("key", language)
        .with_base_url(&server.uri())
        .with_retry_policy(RetryPolicy::immediate(3))
}

#[tokio::test]
async fn test_search_sends_token_and_accept_language() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(header("authorization", "Bearer tok"))
        .and(header("accept-language", "fr"))
        .and(query_param("query", "Dark"))
        .and(query_param("type", "series"))
        .and(query_param("year", "2017"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"tvdb_id": "341", "name": "Dark", "year": "2017", "primary_language": "deu"}]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let tvdb = client(&server, "fr-CA");
    assert_eq!(tvdb.language(), "fra");

    let first = tvdb.search("Dark", "series", 5, 2017, "").await.unwrap();
    let second = tvdb.search("Dark", "series", 5, 2017, "").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first[0].tvdb_id(), 341);
    assert_eq!(first[0].primary_language, "deu");
}

#[tokio::test]
async fn test_unconfigured_client_makes_no_requests() {
    let server = MockServer::start().await;
    let tvdb = TvdbClient::new("  ", "en").with_base_url(&server.uri());
    assert!(!tvdb.is_configured());
    let err = tvdb.series(1).await.unwrap_err();
    assert!(matches!(err, SourceError::NotConfigured("tvdb")));
}

#[tokio::test]
async fn test_rejected_login_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, "en").series(1).await.unwrap_err();
    assert!(matches!(err, SourceError::Auth(_)));
}

#[tokio::test]
async fn test_episodes_follow_pagination() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/series/7/episodes/official/eng"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"episodes": [{"id": 1, "seasonNumber": 1, "number": 1, "name": "Pilot"}]},
            "links": {"next": "https://api4.thetvdb.com/v4/series/7/episodes/official/eng?page=1"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/series/7/episodes/official/eng"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"episodes": [{"id": 2, "seasonNumber": 1, "number": 2, "name": null}]},
            "links": {"next": null}
        })))
        .mount(&server)
        .await;

    let episodes = client(&server, "en").series_episodes(7, "", "en").await.unwrap();
    assert_eq!(episodes.len(), 2);
    assert_eq!(episodes[1].id, 2);
    assert_eq!(episodes[1].name, "");
}

#[tokio::test]
async fn test_episode_translation_memoised_including_misses() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/episodes/9/translations/eng"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"language": "eng", "name": "  ", "overview": ""}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tvdb = client(&server, "en");
    assert_eq!(tvdb.episode_translation(9, "eng").await.unwrap(), None);
    assert_eq!(tvdb.episode_translation(9, "eng").await.unwrap(), None);
}

#[tokio::test]
async fn test_movie_artworks_come_from_extended_record() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/movies/12/extended"))
        .and(query_param("meta", "artwork"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": 12, "name": "Metropolis", "year": "1927",
                     "artworks": [{"image": "/p.jpg", "type": 14}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let arts = client(&server, "en").movie_artworks(12).await.unwrap();
    assert_eq!(arts.len(), 1);
    assert_eq!(arts[0].artwork_type, "14");
}
