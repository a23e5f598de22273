//! Permis Engine - permit determination and zoning compliance for French planning
//!
//! This library decides whether a construction project needs a déclaration
//! préalable (DP), a permis de construire (PC) or a PC with a mandatory
//! architect, checks drawn site plans against PLU zone rules, and tracks
//! permit dossiers whose derived data is invalidated whenever their inputs change.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{ComplianceChecker, DeterminationEngine, Dossier, DossierUpdate};
pub use models::{
    AuthorizationKind, ComplianceReport, ComplianceStatus, Determination, ProjectDescription,
    ZoneRules,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let engine = DeterminationEngine::default();
        let determination = engine.determine(&ProjectDescription::default());
        assert!(determination.insufficient_data);
    }
}
