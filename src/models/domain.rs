use serde::{Deserialize, Serialize};
use validator::Validate;

/// Kind of works described by the applicant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectCategory {
    NewStandaloneConstruction,
    Extension,
    Pool,
    FacadeOrUseChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitterType {
    #[default]
    Individual,
    Company,
}

/// Description of a construction project, as entered by the applicant
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDescription {
    #[serde(default)]
    pub project_category: Option<ProjectCategory>,
    #[serde(default)]
    pub is_urban_zone: Option<bool>,
    #[serde(default)]
    pub zone_code: Option<String>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub length_m: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub width_m: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub height_m: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub existing_floor_area_m2: f64,
    #[serde(default)]
    pub existing_building_present: Option<bool>,
    #[serde(default)]
    pub creates_enclosed_floor_area: bool,
    #[serde(default)]
    pub submitter_type: SubmitterType,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub pool_shelter_height_m: Option<f64>,
}

impl ProjectDescription {
    /// Whether the existing floor area counts toward the total after works
    pub fn existing_building(&self) -> bool {
        self.existing_building_present
            .unwrap_or(self.existing_floor_area_m2 > 0.0)
    }
}

/// Authorization tier required by French planning law
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationKind {
    Dp,
    Pc,
    ArchitectRequired,
}

impl AuthorizationKind {
    pub fn label(&self) -> &'static str {
        match self {
            AuthorizationKind::Dp => "Déclaration préalable",
            AuthorizationKind::Pc => "Permis de construire",
            AuthorizationKind::ArchitectRequired => {
                "Permis de construire avec architecte obligatoire"
            }
        }
    }

    /// Wire code, as serialized
    pub fn as_code(&self) -> &'static str {
        match self {
            AuthorizationKind::Dp => "DP",
            AuthorizationKind::Pc => "PC",
            AuthorizationKind::ArchitectRequired => "ARCHITECT_REQUIRED",
        }
    }
}

/// The determination rule that produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    ArchitectMandatory,
    SmallStandalone,
    UnenclosedExtension,
    UrbanExtension,
    NonUrbanExtension,
    LargeStandalone,
    UnenclosedStructure,
    Fallback,
}

/// Quantities derived from a project description
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetrics {
    pub created_footprint_m2: f64,
    pub floors: u32,
    pub created_floor_area_m2: f64,
    pub existing_floor_area_m2: f64,
    pub total_floor_area_after_m2: f64,
}

/// Result of the DP/PC determination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Determination {
    pub kind: AuthorizationKind,
    pub message: String,
    pub detail: String,
    pub rule: DecisionRule,
    pub caveats: Vec<String>,
    pub insufficient_data: bool,
    pub zone_label: String,
    pub metrics: ProjectMetrics,
}

/// Thresholds driving the determination rules
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub architect_floor_area_m2: f64,
    pub standalone_dp_max_m2: f64,
    pub extension_dp_max_m2: f64,
    pub story_height_m: f64,
    pub max_counted_stories: u32,
    pub pool_shelter_caveat_height_m: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            architect_floor_area_m2: 150.0,
            standalone_dp_max_m2: 20.0,
            extension_dp_max_m2: 40.0,
            story_height_m: 2.5,
            max_counted_stories: 2,
            pool_shelter_caveat_height_m: 1.8,
        }
    }
}

/// Construction type of a drawn building element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionType {
    MainHouse,
    Extension,
    Garage,
    Annex,
    Shed,
    Carport,
    Pool,
    Terrace,
    Pergola,
    #[serde(other)]
    Other,
}

/// Distances from an element to each kind of parcel boundary, when measured by the client
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryDistances {
    #[serde(default)]
    pub road_m: Option<f64>,
    #[serde(default)]
    pub side_m: Option<f64>,
    #[serde(default)]
    pub rear_m: Option<f64>,
}

/// A building element drawn on the site plan, in local metres
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BuildingElement {
    #[validate(length(min = 1))]
    pub id: String,
    pub construction_type: ConstructionType,
    #[serde(default)]
    pub label: Option<String>,
    pub x: f64,
    pub y: f64,
    #[validate(range(min = 0.0))]
    pub width_m: f64,
    #[validate(range(min = 0.0))]
    pub length_m: f64,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub height_m: f64,
    #[serde(default)]
    pub rotation_deg: Option<f64>,
    #[serde(default)]
    pub distances: Option<BoundaryDistances>,
}

impl BuildingElement {
    pub fn footprint_m2(&self) -> f64 {
        self.width_m * self.length_m
    }

    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    Road,
    Side,
    Rear,
}

/// One boundary segment of the parcel, in local metres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundarySegment {
    pub kind: BoundaryKind,
    pub start: [f64; 2],
    pub end: [f64; 2],
}

/// Parcel description used by the compliance checker
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SitePlan {
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub area_m2: Option<f64>,
    #[serde(default)]
    pub boundaries: Vec<BoundarySegment>,
}

/// Regulatory parameters of the parcel's zone
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRules {
    #[serde(default)]
    pub zone_code: Option<String>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub max_height_m: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(default)]
    pub max_coverage_pct: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub setback_road_m: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub setback_side_m: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub setback_rear_m: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(default)]
    pub min_green_space_pct: Option<f64>,
    #[serde(default)]
    pub parking_requirement: Option<String>,
    /// True when the values come from a generic estimate rather than the local PLU
    #[serde(default)]
    pub estimated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    Warning,
    Violation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceRule {
    Height,
    SetbackRoad,
    SetbackSide,
    SetbackRear,
    Coverage,
    GreenSpace,
    Parking,
    Formality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceFinding {
    pub rule: ComplianceRule,
    pub element_id: Option<String>,
    pub status: ComplianceStatus,
    pub message: String,
    pub detail: String,
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceSummary {
    pub compliant: usize,
    pub warnings: usize,
    pub violations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub findings: Vec<ComplianceFinding>,
    pub summary: ComplianceSummary,
    pub overall_status: ComplianceStatus,
    pub parcel_area_m2: Option<f64>,
    pub built_area_m2: f64,
    pub coverage_pct: Option<f64>,
}
