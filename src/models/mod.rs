// Model exports
pub mod domain;
pub mod geodata;
pub mod requests;
pub mod responses;

pub use domain::{
    AuthorizationKind, BoundaryDistances, BoundaryKind, BoundarySegment, BuildingElement,
    ComplianceFinding, ComplianceReport, ComplianceRule, ComplianceStatus, ComplianceSummary,
    ConstructionType, DecisionRule, Determination, ProjectCategory, ProjectDescription,
    ProjectMetrics, SitePlan, SubmitterType, Thresholds, ZoneRules,
};
pub use geodata::{
    AddressCandidate, Commune, HeritageInfo, Parcel, RegulatoryContext, Servitude, SiteContext,
    SourceStatus, ZoningInfo,
};
pub use requests::{
    AddressQuery, ComplianceCheckRequest, CoordinatesQuery, CreateDossierRequest,
    DossierComplianceRequest, UpdateDossierRequest,
};
pub use responses::{AddressSearchResponse, ErrorResponse, HealthResponse};
