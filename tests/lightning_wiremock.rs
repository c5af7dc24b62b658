//! Lightning and reverse geocoding against a mocked FMI WFS and Nominatim
//!
//! These tests verify request construction and response handling without
//! touching the real services.

use fmi_weather::config::{HttpConfig, LightningConfig};
use fmi_weather::lightning::{ReverseGeocoder, http_client};
use fmi_weather::{FmiError, FmiLightningClient, LightningSource, Location, NominatimGeocoder, PersistentCache};
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

// =============================================================================
// Test Helpers
// =============================================================================

const COVERAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:FeatureCollection xmlns:wfs="http://www.opengis.net/wfs/2.0" xmlns:gml="http://www.opengis.net/gml/3.2" xmlns:gmlcov="http://www.opengis.net/gmlcov/1.0">
  <wfs:member>
    <gmlcov:MultiPointCoverage>
      <gml:domainSet>
        <gmlcov:SimpleMultiPoint srsDimension="3">
          <gmlcov:positions>
            60.40 25.10 1718445600
            60.25 24.90 1718452800
          </gmlcov:positions>
        </gmlcov:SimpleMultiPoint>
      </gml:domainSet>
      <gml:rangeSet>
        <gml:DataBlock>
          <gml:doubleOrNilReasonTupleList>
            1 -12.0 0 2.1
            2 31.5 1 0.9
          </gml:doubleOrNilReasonTupleList>
        </gml:DataBlock>
      </gml:rangeSet>
    </gmlcov:MultiPointCoverage>
  </wfs:member>
</wfs:FeatureCollection>"#;

fn home() -> Location {
    Location::new(60.2, 24.96, "Kumpula".to_string())
}

fn no_retries() -> HttpConfig {
    HttpConfig {
        timeout_seconds: 5,
        max_retries: 0,
    }
}

fn lightning_config(server: &MockServer) -> LightningConfig {
    LightningConfig {
        base_url: format!("{}/wfs?storedquery_id=lightning&", server.uri()),
        geocoder_url: server.uri(),
        ..LightningConfig::default()
    }
}

fn address_response(name: &str) -> serde_json::Value {
    serde_json::json!({
        "place_id": 1234,
        "display_name": name,
        "address": { "country": "Finland" }
    })
}

async fn mount_coverage(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/wfs"))
        .and(query_param("storedquery_id", "lightning"))
        .respond_with(ResponseTemplate::new(200).set_body_string(COVERAGE))
        .mount(server)
        .await;
}

fn client(server: &MockServer, cache: Option<PersistentCache>) -> FmiLightningClient {
    let http = http_client(&no_retries()).unwrap();
    let config = lightning_config(server);
    let geocoder = NominatimGeocoder::new(http.clone(), config.geocoder_url.clone(), cache);
    FmiLightningClient::new(http, config, Box::new(geocoder)).with_time_zone(Some(chrono_tz::UTC))
}

// =============================================================================
// Lightning Tests
// =============================================================================

#[tokio::test]
async fn test_strikes_are_named_and_ordered() {
    let server = MockServer::start().await;
    mount_coverage(&server).await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("format", "jsonv2"))
        .and(query_param("lat", "60.25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(address_response("Pasila, Helsinki")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("lat", "60.4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(address_response("Sipoo")))
        .mount(&server)
        .await;

    let strikes = client(&server, None).strikes_near(&home()).await.unwrap();

    assert_eq!(strikes.len(), 2);
    // newest first
    assert_eq!(strikes[0].location, "Pasila, Helsinki");
    assert_eq!(strikes[0].strikes, 2.0);
    assert_eq!(strikes[0].time.to_rfc3339(), "2024-06-15T12:00:00+00:00");
    assert!(strikes[0].distance < strikes[1].distance);
    assert_eq!(strikes[1].location, "Sipoo");
}

#[tokio::test]
async fn test_geocoder_failure_falls_back_to_coordinates() {
    let server = MockServer::start().await;
    mount_coverage(&server).await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let strikes = client(&server, None).strikes_near(&home()).await.unwrap();
    assert_eq!(strikes[0].location, "60.25, 24.9");
    assert_eq!(strikes[1].location, "60.4, 25.1");
}

#[tokio::test]
async fn test_wfs_error_status_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wfs"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad storedquery"))
        .mount(&server)
        .await;

    let result = client(&server, None).strikes_near(&home()).await;
    assert!(matches!(result, Err(FmiError::Api { .. })));
}

#[tokio::test]
async fn test_malformed_coverage_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wfs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<root><positions>north east noon</positions></root>"),
        )
        .mount(&server)
        .await;

    let result = client(&server, None).strikes_near(&home()).await;
    assert!(matches!(result, Err(FmiError::Parse { .. })));
}

// =============================================================================
// Geocoder Tests
// =============================================================================

#[tokio::test]
async fn test_geocoder_uses_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("accept-language", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(address_response("Espoo")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let cache = PersistentCache::open(dir.path()).unwrap();
    let http = http_client(&no_retries()).unwrap();
    let geocoder = NominatimGeocoder::new(http, server.uri(), Some(cache));

    assert_eq!(geocoder.reverse(60.205, 24.655).await.unwrap(), "Espoo");
    assert_eq!(geocoder.reverse(60.205, 24.655).await.unwrap(), "Espoo");
}

#[tokio::test]
async fn test_geocoder_without_address() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"error": "Unable to geocode"})))
        .mount(&server)
        .await;

    let http = http_client(&no_retries()).unwrap();
    let geocoder = NominatimGeocoder::new(http, server.uri(), None);
    assert!(matches!(geocoder.reverse(70.0, 30.0).await, Err(FmiError::Api { .. })));
}
