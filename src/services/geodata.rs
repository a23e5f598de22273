use crate::core::geometry::{geodesic_area_m2, geojson_centroid};
use crate::core::zoning::regulatory_context;
use crate::models::{
    AddressCandidate, Commune, HeritageInfo, Parcel, Servitude, SiteContext, SourceStatus,
    ZoningInfo,
};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Heritage servitude types that require the ABF's opinion:
/// monuments historiques (AC1), classified/listed sites (AC2),
/// sites patrimoniaux remarquables (AC4)
const PROTECTED_SERVITUDES: &[&str] = &["ac1", "ac2", "ac4"];

/// Errors that can occur when querying the geodata APIs
#[derive(Debug, Error)]
pub enum GeodataError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("{lookup} lookup timed out after {timeout:?}")]
    Timeout { lookup: &'static str, timeout: Duration },
}

/// Base URLs of the public geodata APIs
#[derive(Debug, Clone)]
pub struct GeodataEndpoints {
    /// Base Adresse Nationale geocoder
    pub address_url: String,
    /// geo.api.gouv.fr
    pub geo_api_url: String,
    /// IGN API Carto (cadastre and Géoportail de l'Urbanisme modules)
    pub apicarto_url: String,
}

/// Client for the French public geodata APIs
///
/// Handles:
/// - Address geocoding
/// - Commune lookup
/// - Cadastral parcel lookup
/// - PLU zoning and heritage servitude lookups
pub struct GeodataClient {
    endpoints: GeodataEndpoints,
    client: Client,
    call_timeout: Duration,
}

impl GeodataClient {
    /// Create a new geodata client
    pub fn new(
        endpoints: GeodataEndpoints,
        call_timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, GeodataError> {
        let client = Client::builder()
            .timeout(call_timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            endpoints,
            client,
            call_timeout,
        })
    }

    async fn get_json(&self, url: &str) -> Result<Value, GeodataError> {
        tracing::debug!("Fetching geodata from: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(GeodataError::NotFound(url.to_string()));
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::warn!("Geodata request to {} failed: {} - {}", url, status, body);
            return Err(GeodataError::ApiError(format!("{} returned {}", url, status)));
        }

        Ok(response.json().await?)
    }

    fn point_query(lon: f64, lat: f64) -> String {
        let geom = format!(r#"{{"type":"Point","coordinates":[{},{}]}}"#, lon, lat);
        urlencoding::encode(&geom).into_owned()
    }

    /// Geocode a free-text address
    pub async fn search_address(
        &self,
        query: &str,
        limit: u8,
    ) -> Result<Vec<AddressCandidate>, GeodataError> {
        let url = format!(
            "{}/search/?q={}&limit={}",
            self.endpoints.address_url.trim_end_matches('/'),
            urlencoding::encode(query),
            limit
        );

        let json = self.get_json(&url).await?;
        parse_address_results(&json)
    }

    /// Commune containing a point
    pub async fn commune_at(&self, lon: f64, lat: f64) -> Result<Commune, GeodataError> {
        let url = format!(
            "{}/communes?lat={}&lon={}&fields=nom,code,codeDepartement&format=json",
            self.endpoints.geo_api_url.trim_end_matches('/'),
            lat,
            lon
        );

        let json = self.get_json(&url).await?;
        let first = json
            .as_array()
            .ok_or_else(|| GeodataError::InvalidResponse("Expected a commune array".into()))?
            .first()
            .ok_or_else(|| GeodataError::NotFound(format!("No commune at {}, {}", lon, lat)))?;

        serde_json::from_value(first.clone())
            .map_err(|e| GeodataError::InvalidResponse(format!("Failed to parse commune: {}", e)))
    }

    /// Cadastral parcel containing a point
    pub async fn parcel_at(&self, lon: f64, lat: f64) -> Result<Parcel, GeodataError> {
        let url = format!(
            "{}/cadastre/parcelle?geom={}",
            self.endpoints.apicarto_url.trim_end_matches('/'),
            Self::point_query(lon, lat)
        );

        let json = self.get_json(&url).await?;
        parse_parcel(&json)?
            .ok_or_else(|| GeodataError::NotFound(format!("No parcel at {}, {}", lon, lat)))
    }

    /// PLU zone covering a point, `None` where no digitised PLU exists
    pub async fn zoning_at(&self, lon: f64, lat: f64) -> Result<Option<ZoningInfo>, GeodataError> {
        let url = format!(
            "{}/gpu/zone-urba?geom={}",
            self.endpoints.apicarto_url.trim_end_matches('/'),
            Self::point_query(lon, lat)
        );

        let json = self.get_json(&url).await?;
        parse_zoning(&json)
    }

    /// Heritage servitudes touching a point
    pub async fn heritage_at(&self, lon: f64, lat: f64) -> Result<HeritageInfo, GeodataError> {
        let url = format!(
            "{}/gpu/assiette-sup-s?geom={}",
            self.endpoints.apicarto_url.trim_end_matches('/'),
            Self::point_query(lon, lat)
        );

        let json = self.get_json(&url).await?;
        parse_heritage(&json)
    }

    /// Run a lookup under the per-call timeout
    pub async fn timed<T, F>(&self, lookup: &'static str, fut: F) -> Result<T, GeodataError>
    where
        F: Future<Output = Result<T, GeodataError>>,
    {
        tokio::time::timeout(self.call_timeout, fut)
            .await
            .map_err(|_| GeodataError::Timeout {
                lookup,
                timeout: self.call_timeout,
            })?
    }

    /// Aggregate every lookup for a point
    ///
    /// Sources are queried concurrently and fail independently: a failed
    /// source is reported in `sources` and leaves its field empty. Without a
    /// zoning answer the zone rules fall back to estimates for a non-urban zone.
    pub async fn site_context(&self, lon: f64, lat: f64) -> SiteContext {
        let (commune, parcel, zoning, heritage) = tokio::join!(
            self.timed("commune", self.commune_at(lon, lat)),
            self.timed("parcel", self.parcel_at(lon, lat)),
            self.timed("zoning", self.zoning_at(lon, lat)),
            self.timed("heritage", self.heritage_at(lon, lat)),
        );

        let mut sources = Vec::with_capacity(4);
        let commune = settle("commune", commune, &mut sources);
        let parcel = settle("parcel", parcel, &mut sources);
        let zoning = settle("zoning", zoning, &mut sources).flatten();
        let heritage = settle("heritage", heritage, &mut sources);

        SiteContext {
            lon,
            lat,
            commune,
            parcel,
            regulatory: regulatory_context(zoning),
            heritage,
            sources,
        }
    }
}

fn settle<T>(
    source: &str,
    result: Result<T, GeodataError>,
    sources: &mut Vec<SourceStatus>,
) -> Option<T> {
    match result {
        Ok(value) => {
            sources.push(SourceStatus {
                source: source.to_string(),
                ok: true,
                error: None,
            });
            Some(value)
        }
        Err(e) => {
            tracing::warn!("Site lookup source {} failed: {}", source, e);
            sources.push(SourceStatus {
                source: source.to_string(),
                ok: false,
                error: Some(e.to_string()),
            });
            None
        }
    }
}

fn features(json: &Value) -> Result<&Vec<Value>, GeodataError> {
    json.get("features")
        .and_then(|f| f.as_array())
        .ok_or_else(|| GeodataError::InvalidResponse("Missing features array".into()))
}

fn string_prop(props: &Value, key: &str) -> Option<String> {
    match props.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers sometimes arrive as strings in the cadastre payloads
fn number_prop(props: &Value, key: &str) -> Option<f64> {
    match props.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse a geocoder FeatureCollection
pub fn parse_address_results(json: &Value) -> Result<Vec<AddressCandidate>, GeodataError> {
    let results = features(json)?
        .iter()
        .filter_map(|feature| {
            let props = feature.get("properties")?;
            let coords = feature.get("geometry")?.get("coordinates")?.as_array()?;
            Some(AddressCandidate {
                label: string_prop(props, "label")?,
                lon: coords.first()?.as_f64()?,
                lat: coords.get(1)?.as_f64()?,
                citycode: string_prop(props, "citycode"),
                city: string_prop(props, "city"),
                postcode: string_prop(props, "postcode"),
                score: number_prop(props, "score"),
            })
        })
        .collect();

    Ok(results)
}

/// Parse the first parcel of a cadastre FeatureCollection
pub fn parse_parcel(json: &Value) -> Result<Option<Parcel>, GeodataError> {
    let Some(feature) = features(json)?.first() else {
        return Ok(None);
    };

    let props = feature
        .get("properties")
        .ok_or_else(|| GeodataError::InvalidResponse("Parcel without properties".into()))?;

    let id = string_prop(props, "idu")
        .or_else(|| string_prop(props, "id"))
        .or_else(|| string_prop(feature, "id"))
        .ok_or_else(|| GeodataError::InvalidResponse("Parcel without identifier".into()))?;

    let geometry = feature.get("geometry").filter(|g| !g.is_null()).cloned();

    Ok(Some(Parcel {
        id,
        section: string_prop(props, "section"),
        numero: string_prop(props, "numero"),
        code_insee: string_prop(props, "code_insee"),
        contenance_m2: number_prop(props, "contenance"),
        computed_area_m2: geometry.as_ref().and_then(geodesic_area_m2),
        centroid: geometry.as_ref().and_then(geojson_centroid),
        geometry,
    }))
}

/// Parse the first zone of a GPU zone-urba FeatureCollection
pub fn parse_zoning(json: &Value) -> Result<Option<ZoningInfo>, GeodataError> {
    let zoning = features(json)?.iter().find_map(|feature| {
        let props = feature.get("properties")?;
        Some(ZoningInfo {
            libelle: string_prop(props, "libelle")?,
            libelong: string_prop(props, "libelong"),
            typezone: string_prop(props, "typezone"),
            partition: string_prop(props, "partition"),
        })
    });

    Ok(zoning)
}

/// Parse a GPU servitude FeatureCollection
pub fn parse_heritage(json: &Value) -> Result<HeritageInfo, GeodataError> {
    let mut servitudes: Vec<Servitude> = Vec::new();

    for feature in features(json)? {
        let Some(props) = feature.get("properties") else {
            continue;
        };
        let Some(suptype) = string_prop(props, "suptype") else {
            continue;
        };
        let servitude = Servitude {
            suptype: suptype.to_lowercase(),
            label: string_prop(props, "nomsuplitt").or_else(|| string_prop(props, "nomass")),
        };
        if !servitudes.contains(&servitude) {
            servitudes.push(servitude);
        }
    }

    let in_protected_perimeter = servitudes
        .iter()
        .any(|s| PROTECTED_SERVITUDES.contains(&s.suptype.as_str()));

    Ok(HeritageInfo {
        servitudes,
        in_protected_perimeter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_geodata_client_creation() {
        let client = GeodataClient::new(
            GeodataEndpoints {
                address_url: "https://api-adresse.test".to_string(),
                geo_api_url: "https://geo.test".to_string(),
                apicarto_url: "https://apicarto.test/api".to_string(),
            },
            Duration::from_secs(5),
            "permis-engine-test",
        )
        .unwrap();

        assert_eq!(client.endpoints.apicarto_url, "https://apicarto.test/api");
        assert_eq!(client.call_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_point_query_is_encoded() {
        let q = GeodataClient::point_query(2.35, 48.85);
        assert!(q.starts_with("%7B%22type%22"));
        assert!(!q.contains('"'));
    }

    #[test]
    fn test_parse_address_results() {
        let json = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [2.3488, 48.8534] },
                "properties": {
                    "label": "8 Boulevard du Palais 75001 Paris",
                    "score": 0.93,
                    "postcode": "75001",
                    "citycode": "75101",
                    "city": "Paris"
                }
            }, {
                "type": "Feature",
                "geometry": null,
                "properties": { "label": "broken" }
            }]
        });

        let results = parse_address_results(&json).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].citycode.as_deref(), Some("75101"));
        assert_eq!(results[0].lon, 2.3488);
    }

    #[test]
    fn test_parse_parcel_with_string_contenance() {
        let json = json!({
            "features": [{
                "id": "fallback-id",
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[
                        [2.3500, 48.8500], [2.3502, 48.8500],
                        [2.3502, 48.8502], [2.3500, 48.8502], [2.3500, 48.8500]
                    ]]]
                },
                "properties": {
                    "section": "AB",
                    "numero": "0042",
                    "code_insee": "75056",
                    "contenance": "321"
                }
            }]
        });

        let parcel = parse_parcel(&json).unwrap().unwrap();
        assert_eq!(parcel.id, "fallback-id");
        assert_eq!(parcel.contenance_m2, Some(321.0));
        assert_eq!(parcel.area_m2(), Some(321.0));
        assert!(parcel.computed_area_m2.unwrap() > 300.0);
        assert!(parcel.centroid.is_some());
    }

    #[test]
    fn test_parse_parcel_empty_collection() {
        let json = json!({ "features": [] });
        assert!(parse_parcel(&json).unwrap().is_none());
        assert!(parse_parcel(&json!({})).is_err());
    }

    #[test]
    fn test_parse_zoning() {
        let json = json!({
            "features": [{
                "properties": {
                    "libelle": "UB",
                    "libelong": "Zone urbaine mixte",
                    "typezone": "U",
                    "partition": "DU_75056"
                }
            }]
        });

        let zoning = parse_zoning(&json).unwrap().unwrap();
        assert_eq!(zoning.libelle, "UB");
        assert_eq!(zoning.typezone.as_deref(), Some("U"));

        assert_eq!(parse_zoning(&json!({ "features": [] })).unwrap(), None);
    }

    #[test]
    fn test_parse_heritage() {
        let json = json!({
            "features": [
                { "properties": { "suptype": "AC1", "nomsuplitt": "Cathédrale Notre-Dame" } },
                { "properties": { "suptype": "AC1", "nomsuplitt": "Cathédrale Notre-Dame" } },
                { "properties": { "suptype": "pm1", "nomsuplitt": "PPRI" } }
            ]
        });

        let heritage = parse_heritage(&json).unwrap();
        assert_eq!(heritage.servitudes.len(), 2);
        assert!(heritage.in_protected_perimeter);

        let json = json!({ "features": [{ "properties": { "suptype": "pm1" } }] });
        assert!(!parse_heritage(&json).unwrap().in_protected_perimeter);
    }
}
