use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{BuildingElement, ProjectDescription, SitePlan, ZoneRules};
use crate::models::geodata::{AddressCandidate, Parcel};

/// Request to check a site plan against zone rules
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceCheckRequest {
    #[validate(nested)]
    #[serde(default)]
    pub elements: Vec<BuildingElement>,
    #[validate(nested)]
    #[serde(default)]
    pub zone_rules: ZoneRules,
    #[validate(nested)]
    #[serde(default)]
    pub parcel: SitePlan,
}

/// Request to check a site plan against the rules stored on a dossier
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DossierComplianceRequest {
    #[validate(nested)]
    #[serde(default)]
    pub elements: Vec<BuildingElement>,
    #[validate(nested)]
    #[serde(default)]
    pub parcel: SitePlan,
}

/// Query for a point lookup
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct CoordinatesQuery {
    #[validate(range(min = -180.0, max = 180.0))]
    pub lon: f64,
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
}

/// Query for an address search
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddressQuery {
    #[validate(length(min = 3, max = 200))]
    pub q: String,
    #[validate(range(min = 1, max = 20))]
    #[serde(default = "default_limit")]
    pub limit: u8,
}

fn default_limit() -> u8 {
    5
}

/// Request to open a new dossier
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDossierRequest {
    #[serde(default)]
    pub address: Option<AddressCandidate>,
    #[serde(default)]
    pub parcel: Option<Parcel>,
    #[validate(nested)]
    #[serde(default)]
    pub project: Option<ProjectDescription>,
}

/// Partial update of a dossier's user-entered fields
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDossierRequest {
    /// Revision the client last saw; the update is rejected if the dossier moved on
    #[serde(default)]
    pub revision: Option<u64>,
    #[serde(default)]
    pub address: Option<AddressCandidate>,
    #[serde(default)]
    pub parcel: Option<Parcel>,
    #[validate(nested)]
    #[serde(default)]
    pub project: Option<ProjectDescription>,
}
