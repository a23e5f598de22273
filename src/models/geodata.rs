use serde::{Deserialize, Serialize};

use crate::models::domain::ZoneRules;

/// Geocoded address candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressCandidate {
    pub label: String,
    pub lon: f64,
    pub lat: f64,
    pub citycode: Option<String>,
    pub city: Option<String>,
    pub postcode: Option<String>,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commune {
    pub code: String,
    pub nom: String,
    pub code_departement: Option<String>,
}

/// Cadastral parcel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parcel {
    pub id: String,
    pub section: Option<String>,
    pub numero: Option<String>,
    pub code_insee: Option<String>,
    /// Legal area from the cadastre
    pub contenance_m2: Option<f64>,
    /// Geodesic area of the parcel geometry
    pub computed_area_m2: Option<f64>,
    /// `[lon, lat]`
    pub centroid: Option<[f64; 2]>,
    /// Raw GeoJSON geometry as returned by the cadastre API
    #[serde(default)]
    pub geometry: Option<serde_json::Value>,
}

impl Parcel {
    /// Best known area: the cadastre's legal area, else the computed one
    pub fn area_m2(&self) -> Option<f64> {
        self.contenance_m2.or(self.computed_area_m2)
    }
}

/// PLU zone covering a point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoningInfo {
    pub libelle: String,
    pub libelong: Option<String>,
    pub typezone: Option<String>,
    pub partition: Option<String>,
}

/// Heritage servitude touching a point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Servitude {
    pub suptype: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeritageInfo {
    pub servitudes: Vec<Servitude>,
    pub in_protected_perimeter: bool,
}

/// Regulatory context derived from the zoning lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulatoryContext {
    pub zoning: Option<ZoningInfo>,
    pub is_urban_zone: bool,
    pub zone_label: String,
    pub zone_rules: ZoneRules,
}

/// Outcome of one source in a site lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStatus {
    pub source: String,
    pub ok: bool,
    pub error: Option<String>,
}

/// Aggregated geodata for a point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteContext {
    pub lon: f64,
    pub lat: f64,
    pub commune: Option<Commune>,
    pub parcel: Option<Parcel>,
    pub regulatory: RegulatoryContext,
    pub heritage: Option<HeritageInfo>,
    pub sources: Vec<SourceStatus>,
}
