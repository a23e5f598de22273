// Core rule engines
pub mod compliance;
pub mod construction;
pub mod determination;
pub mod dossier;
pub mod geometry;
pub mod zoning;

pub use compliance::{required_setback, ComplianceChecker};
pub use construction::{type_label, type_rules, TypeRules};
pub use determination::{compute_metrics, format_number, DeterminationEngine};
pub use dossier::{decide, Dossier, DossierDecision, DossierField, DossierUpdate, UpdateOutcome};
pub use geometry::{distance_to_boundary, element_polygon, geodesic_area_m2, outline_area};
pub use zoning::{estimated_zone_rules, is_urban_zone, regulatory_context, zone_label};
