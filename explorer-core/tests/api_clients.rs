//! Integration tests for the upstream API clients using wiremock.

use explorer_core::{
    Coordinates, Error, Geocoder, VideoSearch, WeatherProvider,
    provider::{google::GoogleGeocoder, openweather::OpenWeatherProvider, youtube::YouTubeSearch},
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PARIS: Coordinates = Coordinates { latitude: 48.8566, longitude: 2.3522 };

fn geocoder(server: &MockServer) -> GoogleGeocoder {
    GoogleGeocoder::new("MAPS_KEY".to_string()).with_base_url(server.uri())
}

fn weather(server: &MockServer) -> OpenWeatherProvider {
    OpenWeatherProvider::new("OW_KEY".to_string()).with_base_url(server.uri())
}

fn videos(server: &MockServer) -> YouTubeSearch {
    YouTubeSearch::new("YT_KEY".to_string()).with_base_url(server.uri())
}

#[tokio::test]
async fn geocode_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/geocode/json"))
        .and(query_param("address", "Paris"))
        .and(query_param("key", "MAPS_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [
                { "geometry": { "location": { "lat": 48.8566, "lng": 2.3522 } } },
                { "geometry": { "location": { "lat": 33.66, "lng": -95.55 } } }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let coords = geocoder(&mock_server).resolve("Paris").await.unwrap();
    assert_eq!(coords, PARIS);
}

#[tokio::test]
async fn geocode_zero_results_is_invalid_location() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/geocode/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ZERO_RESULTS",
            "results": []
        })))
        .mount(&mock_server)
        .await;

    let err = geocoder(&mock_server).resolve("Nowhere").await.unwrap_err();
    assert!(matches!(err, Error::InvalidLocation(_)));
}

#[tokio::test]
async fn geocode_ok_without_results_is_invalid_location() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/geocode/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "OK", "results": [] })))
        .mount(&mock_server)
        .await;

    let err = geocoder(&mock_server).resolve("Nowhere").await.unwrap_err();
    assert!(matches!(err, Error::InvalidLocation(_)));
}

#[tokio::test]
async fn geocode_http_error_is_invalid_location() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/geocode/json"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let err = geocoder(&mock_server).resolve("Paris").await.unwrap_err();
    assert!(matches!(err, Error::InvalidLocation(_)));
}

#[tokio::test]
async fn current_weather_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("lat", "48.8566"))
        .and(query_param("lon", "2.3522"))
        .and(query_param("appid", "OW_KEY"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cod": 200,
            "main": { "temp": 17.4, "humidity": 60 },
            "weather": [{ "description": "broken clouds" }, { "description": "mist" }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let conditions = weather(&mock_server).current_conditions(PARIS).await.unwrap();
    assert_eq!(conditions.temperature_c, 17.4);
    assert_eq!(conditions.description, "broken clouds");
}

#[tokio::test]
async fn current_weather_bad_cod_is_fetch_failed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cod": "400",
            "message": "wrong latitude"
        })))
        .mount(&mock_server)
        .await;

    let err = weather(&mock_server).current_conditions(PARIS).await.unwrap_err();
    assert!(matches!(err, Error::FetchFailed(_)));
}

#[tokio::test]
async fn current_weather_unauthorized_is_fetch_failed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "cod": 401,
            "message": "Invalid API key"
        })))
        .mount(&mock_server)
        .await;

    let err = weather(&mock_server).current_conditions(PARIS).await.unwrap_err();
    match err {
        Error::FetchFailed(msg) => assert!(msg.contains("401")),
        other => panic!("expected FetchFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn current_weather_malformed_body_is_fetch_failed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&mock_server)
        .await;

    let err = weather(&mock_server).current_conditions(PARIS).await.unwrap_err();
    assert!(matches!(err, Error::FetchFailed(_)));

    mock_server.reset().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cod": 200,
            "main": { "temp": 17.4 },
            "weather": []
        })))
        .mount(&mock_server)
        .await;

    let err = weather(&mock_server).current_conditions(PARIS).await.unwrap_err();
    assert!(matches!(err, Error::FetchFailed(_)));
}

#[tokio::test]
async fn video_search_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .and(query_param("q", "London weather"))
        .and(query_param("maxResults", "3"))
        .and(query_param("part", "snippet"))
        .and(query_param("key", "YT_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": { "videoId": "abc" }, "snippet": { "title": "London rain" } },
                { "id": { "videoId": "def" }, "snippet": { "title": "London fog" } }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let found = videos(&mock_server).search("London").await.unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].title, "London rain");
    assert_eq!(found[0].url, "https://www.youtube.com/watch?v=abc");
}

#[tokio::test]
async fn video_search_without_items_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "kind": "youtube#searchListResponse" })))
        .mount(&mock_server)
        .await;

    let found = videos(&mock_server).search("Atlantis").await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn video_search_http_error_is_fetch_failed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .respond_with(ResponseTemplate::new(403).set_body_string("quotaExceeded"))
        .mount(&mock_server)
        .await;

    let err = videos(&mock_server).search("London").await.unwrap_err();
    assert!(matches!(err, Error::FetchFailed(_)));
}
