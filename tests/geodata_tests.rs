// Geodata client tests against mocked upstream APIs

use mockito::{Matcher, Server, ServerGuard};
use permis_engine::services::{GeodataClient, GeodataEndpoints, GeodataError};
use std::time::Duration;

const COMMUNE: &str = r#"[{"nom":"Nantes","code":"44109","codeDepartement":"44"}]"#;

const PARCEL: &str = r#"{
    "type": "FeatureCollection",
    "features": [{
        "type": "Feature",
        "geometry": {
            "type": "MultiPolygon",
            "coordinates": [[[
                [-1.5530, 47.2180], [-1.5527, 47.2180],
                [-1.5527, 47.2182], [-1.5530, 47.2182], [-1.5530, 47.2180]
            ]]]
        },
        "properties": {
            "idu": "44109000AB0042",
            "section": "AB",
            "numero": "0042",
            "code_insee": "44109",
            "contenance": 498
        }
    }]
}"#;

const ZONING: &str = r#"{
    "type": "FeatureCollection",
    "features": [{
        "type": "Feature",
        "properties": { "libelle": "UMd1", "libelong": "Zone urbaine mixte", "typezone": "U" }
    }]
}"#;

const HERITAGE: &str = r#"{
    "type": "FeatureCollection",
    "features": [{
        "type": "Feature",
        "properties": { "suptype": "ac1", "nomsuplitt": "Château des ducs de Bretagne" }
    }]
}"#;

fn client_for(server: &ServerGuard, timeout: Duration) -> GeodataClient {
    GeodataClient::new(
        GeodataEndpoints {
            address_url: server.url(),
            geo_api_url: server.url(),
            apicarto_url: format!("{}/api", server.url()),
        },
        timeout,
        "permis-engine-tests",
    )
    .unwrap()
}

#[tokio::test]
async fn test_search_address() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/search/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "2 place du commerce nantes".into()),
            Matcher::UrlEncoded("limit".into(), "3".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"features":[{"geometry":{"coordinates":[-1.5589,47.2132]},
                "properties":{"label":"2 Place du Commerce 44000 Nantes","citycode":"44109",
                "city":"Nantes","postcode":"44000","score":0.96}}]}"#,
        )
        .create_async()
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let results = client.search_address("2 place du commerce nantes", 3).await.unwrap();

    mock.assert_async().await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].city.as_deref(), Some("Nantes"));
    assert_eq!(results[0].lat, 47.2132);
}

#[tokio::test]
async fn test_parcel_lookup_computes_area() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/cadastre/parcelle")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(PARCEL)
        .create_async()
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let parcel = client.parcel_at(-1.5528, 47.2181).await.unwrap();

    assert_eq!(parcel.id, "44109000AB0042");
    assert_eq!(parcel.contenance_m2, Some(498.0));
    let computed = parcel.computed_area_m2.unwrap();
    assert!(computed > 400.0 && computed < 600.0, "computed area {}", computed);
    assert!(parcel.centroid.is_some());
}

#[tokio::test]
async fn test_empty_parcel_collection_is_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/cadastre/parcelle")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"type":"FeatureCollection","features":[]}"#)
        .create_async()
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let result = client.parcel_at(0.0, 0.0).await;
    assert!(matches!(result, Err(GeodataError::NotFound(_))));
}

#[tokio::test]
async fn test_upstream_error_is_reported() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/gpu/zone-urba")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("maintenance")
        .create_async()
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let result = client.zoning_at(-1.55, 47.21).await;
    assert!(matches!(result, Err(GeodataError::ApiError(_))));
}

#[tokio::test]
async fn test_site_context_all_sources() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/communes")
        .match_query(Matcher::Any)
        .with_body(COMMUNE)
        .create_async()
        .await;
    server
        .mock("GET", "/api/cadastre/parcelle")
        .match_query(Matcher::Any)
        .with_body(PARCEL)
        .create_async()
        .await;
    server
        .mock("GET", "/api/gpu/zone-urba")
        .match_query(Matcher::Any)
        .with_body(ZONING)
        .create_async()
        .await;
    server
        .mock("GET", "/api/gpu/assiette-sup-s")
        .match_query(Matcher::Any)
        .with_body(HERITAGE)
        .create_async()
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let site = client.site_context(-1.5528, 47.2181).await;

    assert!(site.sources.iter().all(|s| s.ok));
    assert_eq!(site.commune.unwrap().nom, "Nantes");
    assert!(site.regulatory.is_urban_zone);
    assert_eq!(site.regulatory.zone_label, "zone urbaine UMd1");
    assert!(site.heritage.unwrap().in_protected_perimeter);
}

#[tokio::test]
async fn test_site_context_survives_zoning_failure() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/communes")
        .match_query(Matcher::Any)
        .with_body(COMMUNE)
        .create_async()
        .await;
    server
        .mock("GET", "/api/cadastre/parcelle")
        .match_query(Matcher::Any)
        .with_body(PARCEL)
        .create_async()
        .await;
    server
        .mock("GET", "/api/gpu/zone-urba")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;
    server
        .mock("GET", "/api/gpu/assiette-sup-s")
        .match_query(Matcher::Any)
        .with_body(HERITAGE)
        .create_async()
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let site = client.site_context(-1.5528, 47.2181).await;

    let zoning = site.sources.iter().find(|s| s.source == "zoning").unwrap();
    assert!(!zoning.ok);
    assert!(zoning.error.is_some());

    assert!(site.parcel.is_some());
    assert!(site.heritage.is_some());
    assert!(site.regulatory.zoning.is_none());
    assert!(!site.regulatory.is_urban_zone);
    assert!(site.regulatory.zone_rules.estimated);
}

#[tokio::test]
async fn test_timeout_is_reported_per_source() {
    let server = Server::new_async().await;
    let client = client_for(&server, Duration::from_millis(200));

    let slow = async {
        tokio::time::sleep(Duration::from_secs(2)).await;
        Ok::<_, GeodataError>(())
    };
    let result = client.timed("zoning", slow).await;

    match result {
        Err(GeodataError::Timeout { lookup, .. }) => assert_eq!(lookup, "zoning"),
        other => panic!("expected a timeout, got {:?}", other),
    }
}
