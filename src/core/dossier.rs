use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::determination::DeterminationEngine;
use crate::models::{
    AddressCandidate, ComplianceReport, Determination, HeritageInfo, Parcel, ProjectDescription,
    RegulatoryContext, ZoningInfo,
};

/// Authoritative, server-side decision stored on a dossier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DossierDecision {
    pub determination: Determination,
    pub zoning: Option<ZoningInfo>,
    pub heritage: Option<HeritageInfo>,
    pub abf_consultation_required: bool,
}

/// A permit application file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dossier {
    pub id: Uuid,
    pub revision: u64,
    pub address: Option<AddressCandidate>,
    pub parcel: Option<Parcel>,
    pub regulatory: Option<RegulatoryContext>,
    pub heritage: Option<HeritageInfo>,
    pub project: Option<ProjectDescription>,
    pub decision: Option<DossierDecision>,
    pub compliance: Option<ComplianceReport>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DossierField {
    Address,
    Parcel,
    Regulatory,
    Heritage,
    Project,
    Decision,
    Compliance,
}

impl DossierField {
    /// Fields derived from this one, cleared whenever it changes
    pub fn dependents(self) -> &'static [DossierField] {
        match self {
            DossierField::Address => &[
                DossierField::Parcel,
                DossierField::Regulatory,
                DossierField::Heritage,
                DossierField::Decision,
                DossierField::Compliance,
            ],
            DossierField::Parcel => &[
                DossierField::Regulatory,
                DossierField::Heritage,
                DossierField::Decision,
                DossierField::Compliance,
            ],
            DossierField::Regulatory => &[DossierField::Decision, DossierField::Compliance],
            DossierField::Heritage => &[DossierField::Decision],
            DossierField::Project => &[DossierField::Decision, DossierField::Compliance],
            DossierField::Decision | DossierField::Compliance => &[],
        }
    }
}

/// A single mutation of a dossier
#[derive(Debug, Clone)]
pub enum DossierUpdate {
    Address(Option<AddressCandidate>),
    Parcel(Option<Parcel>),
    Regulatory(RegulatoryContext),
    Heritage(HeritageInfo),
    Project(ProjectDescription),
    Decision(DossierDecision),
    Compliance(ComplianceReport),
}

impl DossierUpdate {
    pub fn field(&self) -> DossierField {
        match self {
            DossierUpdate::Address(_) => DossierField::Address,
            DossierUpdate::Parcel(_) => DossierField::Parcel,
            DossierUpdate::Regulatory(_) => DossierField::Regulatory,
            DossierUpdate::Heritage(_) => DossierField::Heritage,
            DossierUpdate::Project(_) => DossierField::Project,
            DossierUpdate::Decision(_) => DossierField::Decision,
            DossierUpdate::Compliance(_) => DossierField::Compliance,
        }
    }
}

/// What an update did to the dossier
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    pub changed: bool,
    pub cleared: Vec<DossierField>,
}

impl Dossier {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            revision: 0,
            address: None,
            parcel: None,
            regulatory: None,
            heritage: None,
            project: None,
            decision: None,
            compliance: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply one update, clearing every field derived from the updated one
    ///
    /// Writing a value equal to the current one is not a mutation; for parcels
    /// equality is by cadastral id. Each effective update bumps the revision.
    pub fn apply(&mut self, update: DossierUpdate) -> UpdateOutcome {
        let field = update.field();

        let changed = match update {
            DossierUpdate::Address(address) => replace_if_changed(&mut self.address, address),
            DossierUpdate::Parcel(parcel) => {
                let same_parcel = match (&self.parcel, &parcel) {
                    (Some(current), Some(new)) => current.id == new.id,
                    (None, None) => true,
                    _ => false,
                };
                if !same_parcel {
                    self.parcel = parcel;
                }
                !same_parcel
            }
            DossierUpdate::Regulatory(ctx) => replace_if_changed(&mut self.regulatory, Some(ctx)),
            DossierUpdate::Heritage(heritage) => {
                replace_if_changed(&mut self.heritage, Some(heritage))
            }
            DossierUpdate::Project(project) => replace_if_changed(&mut self.project, Some(project)),
            DossierUpdate::Decision(decision) => {
                replace_if_changed(&mut self.decision, Some(decision))
            }
            DossierUpdate::Compliance(report) => {
                replace_if_changed(&mut self.compliance, Some(report))
            }
        };

        if !changed {
            return UpdateOutcome::default();
        }

        let mut cleared = Vec::new();
        for dependent in field.dependents() {
            if self.clear(*dependent) {
                cleared.push(*dependent);
            }
        }

        self.revision += 1;
        self.updated_at = Utc::now();

        UpdateOutcome { changed, cleared }
    }

    /// Clear one field, returning whether it held a value
    fn clear(&mut self, field: DossierField) -> bool {
        match field {
            DossierField::Address => self.address.take().is_some(),
            DossierField::Parcel => self.parcel.take().is_some(),
            DossierField::Regulatory => self.regulatory.take().is_some(),
            DossierField::Heritage => self.heritage.take().is_some(),
            DossierField::Project => self.project.take().is_some(),
            DossierField::Decision => self.decision.take().is_some(),
            DossierField::Compliance => self.compliance.take().is_some(),
        }
    }

    /// Point used for geodata lookups: parcel centroid, else the geocoded address
    pub fn location(&self) -> Option<[f64; 2]> {
        self.parcel
            .as_ref()
            .and_then(|p| p.centroid)
            .or_else(|| self.address.as_ref().map(|a| [a.lon, a.lat]))
    }
}

impl Default for Dossier {
    fn default() -> Self {
        Self::new()
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut Option<T>, value: Option<T>) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

/// Run the determination with the zoning and heritage derived server-side
///
/// The derived urban flag and zone code override whatever the client stored
/// on the project.
pub fn decide(
    engine: &DeterminationEngine,
    project: &ProjectDescription,
    regulatory: &RegulatoryContext,
    heritage: Option<&HeritageInfo>,
) -> DossierDecision {
    let mut project = project.clone();
    project.is_urban_zone = Some(regulatory.is_urban_zone);
    project.zone_code = regulatory.zoning.as_ref().map(|z| z.libelle.clone());

    DossierDecision {
        determination: engine.determine(&project),
        zoning: regulatory.zoning.clone(),
        heritage: heritage.cloned(),
        abf_consultation_required: heritage.map(|h| h.in_protected_perimeter).unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::zoning::regulatory_context;
    use crate::models::{AuthorizationKind, ProjectCategory, Servitude};

    fn parcel(id: &str) -> Parcel {
        Parcel {
            id: id.to_string(),
            section: Some("AB".to_string()),
            numero: Some("0042".to_string()),
            code_insee: Some("75056".to_string()),
            contenance_m2: Some(450.0),
            computed_area_m2: None,
            centroid: Some([2.35, 48.85]),
            geometry: None,
        }
    }

    fn zoning(code: &str) -> ZoningInfo {
        ZoningInfo {
            libelle: code.to_string(),
            libelong: None,
            typezone: None,
            partition: None,
        }
    }

    fn extension() -> ProjectDescription {
        ProjectDescription {
            project_category: Some(ProjectCategory::Extension),
            length_m: Some(6.0),
            width_m: Some(5.0),
            height_m: Some(2.5),
            creates_enclosed_floor_area: true,
            ..Default::default()
        }
    }

    fn decided_dossier() -> Dossier {
        let engine = DeterminationEngine::default();
        let mut dossier = Dossier::new();
        dossier.apply(DossierUpdate::Parcel(Some(parcel("75056000AB0042"))));
        dossier.apply(DossierUpdate::Project(extension()));
        let ctx = regulatory_context(Some(zoning("UB")));
        dossier.apply(DossierUpdate::Regulatory(ctx.clone()));
        dossier.apply(DossierUpdate::Heritage(HeritageInfo::default()));
        let decision = decide(&engine, &extension(), &ctx, dossier.heritage.as_ref());
        dossier.apply(DossierUpdate::Decision(decision));
        dossier
    }

    #[test]
    fn test_parcel_change_clears_derived_fields() {
        let mut dossier = decided_dossier();
        assert!(dossier.decision.is_some());
        let revision = dossier.revision;

        let outcome = dossier.apply(DossierUpdate::Parcel(Some(parcel("75056000AB0043"))));

        assert!(outcome.changed);
        assert_eq!(
            outcome.cleared,
            vec![DossierField::Regulatory, DossierField::Heritage, DossierField::Decision]
        );
        assert!(dossier.regulatory.is_none());
        assert!(dossier.heritage.is_none());
        assert!(dossier.decision.is_none());
        assert!(dossier.project.is_some());
        assert_eq!(dossier.revision, revision + 1);
    }

    #[test]
    fn test_same_parcel_is_not_a_mutation() {
        let mut dossier = decided_dossier();
        let revision = dossier.revision;

        let mut same = parcel("75056000AB0042");
        same.contenance_m2 = Some(451.0);
        let outcome = dossier.apply(DossierUpdate::Parcel(Some(same)));

        assert_eq!(outcome, UpdateOutcome::default());
        assert!(dossier.decision.is_some());
        assert_eq!(dossier.revision, revision);
    }

    #[test]
    fn test_address_change_clears_parcel() {
        let mut dossier = decided_dossier();
        let outcome = dossier.apply(DossierUpdate::Address(Some(AddressCandidate {
            label: "1 rue de Rivoli 75001 Paris".to_string(),
            lon: 2.34,
            lat: 48.86,
            citycode: Some("75101".to_string()),
            city: Some("Paris".to_string()),
            postcode: Some("75001".to_string()),
            score: Some(0.97),
        })));

        assert!(outcome.cleared.contains(&DossierField::Parcel));
        assert!(dossier.parcel.is_none());
        assert!(dossier.decision.is_none());
        assert_eq!(dossier.location(), Some([2.34, 48.86]));
    }

    #[test]
    fn test_project_change_clears_decision_only() {
        let mut dossier = decided_dossier();
        let mut project = extension();
        project.length_m = Some(12.0);

        let outcome = dossier.apply(DossierUpdate::Project(project));

        assert_eq!(outcome.cleared, vec![DossierField::Decision]);
        assert!(dossier.regulatory.is_some());
        assert!(dossier.heritage.is_some());
    }

    #[test]
    fn test_decide_overrides_client_zone() {
        let engine = DeterminationEngine::default();
        let mut project = extension();
        project.is_urban_zone = Some(true);

        // Server-derived zone is natural: non-urban rules apply
        let ctx = regulatory_context(Some(zoning("N")));
        let decision = decide(&engine, &project, &ctx, None);
        assert_eq!(decision.determination.zone_label, "zone N (hors zone urbaine)");
        assert!(!decision.abf_consultation_required);

        let heritage = HeritageInfo {
            servitudes: vec![Servitude {
                suptype: "ac1".to_string(),
                label: Some("Périmètre des abords".to_string()),
            }],
            in_protected_perimeter: true,
        };
        let ctx = regulatory_context(Some(zoning("UA")));
        let decision = decide(&engine, &project, &ctx, Some(&heritage));
        assert_eq!(decision.determination.kind, AuthorizationKind::Dp);
        assert!(decision.abf_consultation_required);
    }

    #[test]
    fn test_location_prefers_parcel_centroid() {
        let mut dossier = Dossier::new();
        assert_eq!(dossier.location(), None);
        dossier.parcel = Some(parcel("p"));
        assert_eq!(dossier.location(), Some([2.35, 48.85]));
    }
}
