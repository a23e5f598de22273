use crate::core::zoning::{is_urban_zone, zone_label};
use crate::models::{
    AuthorizationKind, DecisionRule, Determination, ProjectCategory, ProjectDescription,
    ProjectMetrics, Thresholds,
};

const VERIFY_LOCALLY: &str =
    "Hors zone urbaine : vérifier le seuil applicable auprès du service urbanisme de la mairie.";
const MISSING_DIMENSIONS: &str =
    "Dimensions non renseignées : le résultat est indicatif tant que la longueur et la largeur ne sont pas saisies.";

/// Format a metric for display: at most two decimals, no trailing zeros
pub fn format_number(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Compute the derived quantities of a project
///
/// `floors` is a coarse estimate (one story per `story_height_m`), and at most
/// `max_counted_stories` of them count toward the created floor area.
pub fn compute_metrics(project: &ProjectDescription, thresholds: &Thresholds) -> ProjectMetrics {
    let created_footprint_m2 = match (project.length_m, project.width_m) {
        (Some(length), Some(width)) => length * width,
        _ => 0.0,
    };

    let floors = match project.height_m {
        Some(height) if height > 0.0 => ((height / thresholds.story_height_m).ceil() as u32).max(1),
        _ => 1,
    };

    let created_floor_area_m2 = if project.creates_enclosed_floor_area {
        created_footprint_m2 * floors.min(thresholds.max_counted_stories) as f64
    } else {
        0.0
    };

    let existing_floor_area_m2 = if project.existing_building() {
        project.existing_floor_area_m2
    } else {
        0.0
    };

    ProjectMetrics {
        created_footprint_m2,
        floors,
        created_floor_area_m2,
        existing_floor_area_m2,
        total_floor_area_after_m2: existing_floor_area_m2 + created_floor_area_m2,
    }
}

/// DP / PC / architect determination engine
///
/// Rules are evaluated in a fixed order and the first match wins:
/// 1. Architect mandatory above the floor-area ceiling
/// 2. Small standalone construction
/// 3. Extension without enclosed floor area (footprint-based)
/// 4. Enclosed extension in an urban zone
/// 5. Enclosed extension outside urban zones
/// 6. Large standalone construction
/// 7. Unenclosed structure (pool, open shelter)
/// 8. Fallback on the extension thresholds
///
/// Ties at a threshold always resolve toward the lighter formality.
#[derive(Debug, Clone)]
pub struct DeterminationEngine {
    thresholds: Thresholds,
}

impl DeterminationEngine {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn with_default_thresholds() -> Self {
        Self {
            thresholds: Thresholds::default(),
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Determine the authorization required for a project
    pub fn determine(&self, project: &ProjectDescription) -> Determination {
        let t = &self.thresholds;
        let metrics = compute_metrics(project, t);

        // An unknown zone is treated as non-urban
        let urban = project
            .is_urban_zone
            .or_else(|| project.zone_code.as_deref().map(is_urban_zone))
            .unwrap_or(false);
        let zone = zone_label(project.zone_code.as_deref(), urban);

        let footprint = metrics.created_footprint_m2;
        let floor_area = metrics.created_floor_area_m2;
        let total = metrics.total_floor_area_after_m2;
        let enclosed = project.creates_enclosed_floor_area;
        let category = project.project_category;

        let architect = t.architect_floor_area_m2;
        let standalone = t.standalone_dp_max_m2;
        let extension = t.extension_dp_max_m2;

        let mut caveats = Vec::new();

        let (kind, rule, reason) = if enclosed && (floor_area > architect || total > architect) {
            (
                AuthorizationKind::ArchitectRequired,
                DecisionRule::ArchitectMandatory,
                format!(
                    "La surface de plancher dépasse {} m² : le recours à un architecte est obligatoire.",
                    format_number(architect)
                ),
            )
        } else if category == Some(ProjectCategory::NewStandaloneConstruction)
            && floor_area > 0.0
            && floor_area < standalone
        {
            (
                AuthorizationKind::Dp,
                DecisionRule::SmallStandalone,
                format!(
                    "Construction nouvelle créant moins de {} m² de surface de plancher.",
                    format_number(standalone)
                ),
            )
        } else if category == Some(ProjectCategory::Extension) && !enclosed {
            if urban && footprint <= extension && total <= architect {
                (
                    AuthorizationKind::Dp,
                    DecisionRule::UnenclosedExtension,
                    format!(
                        "Extension sans surface close d'au plus {} m² d'emprise en zone urbaine.",
                        format_number(extension)
                    ),
                )
            } else if footprint > extension || total > architect {
                (
                    AuthorizationKind::Pc,
                    DecisionRule::UnenclosedExtension,
                    format!(
                        "Extension sans surface close dont l'emprise dépasse {} m² ou portant le total au-delà de {} m².",
                        format_number(extension),
                        format_number(architect)
                    ),
                )
            } else {
                caveats.push(VERIFY_LOCALLY.to_string());
                (
                    AuthorizationKind::Dp,
                    DecisionRule::UnenclosedExtension,
                    "Extension sans surface close de faible emprise hors zone urbaine.".to_string(),
                )
            }
        } else if category == Some(ProjectCategory::Extension) && urban {
            if floor_area <= extension && total <= architect {
                (
                    AuthorizationKind::Dp,
                    DecisionRule::UrbanExtension,
                    format!(
                        "Extension en zone urbaine créant au plus {} m² de surface de plancher.",
                        format_number(extension)
                    ),
                )
            } else {
                (
                    AuthorizationKind::Pc,
                    DecisionRule::UrbanExtension,
                    format!(
                        "Extension en zone urbaine créant plus de {} m² de surface de plancher.",
                        format_number(extension)
                    ),
                )
            }
        } else if category == Some(ProjectCategory::Extension) {
            if floor_area > extension || total > architect {
                (
                    AuthorizationKind::Pc,
                    DecisionRule::NonUrbanExtension,
                    format!(
                        "Extension hors zone urbaine créant plus de {} m² de surface de plancher.",
                        format_number(extension)
                    ),
                )
            } else {
                caveats.push(VERIFY_LOCALLY.to_string());
                (
                    AuthorizationKind::Dp,
                    DecisionRule::NonUrbanExtension,
                    format!(
                        "Extension hors zone urbaine créant au plus {} m² de surface de plancher.",
                        format_number(extension)
                    ),
                )
            }
        } else if category == Some(ProjectCategory::NewStandaloneConstruction)
            && (floor_area >= standalone || footprint >= standalone)
        {
            (
                AuthorizationKind::Pc,
                DecisionRule::LargeStandalone,
                format!(
                    "Construction nouvelle d'au moins {} m² d'emprise ou de surface de plancher.",
                    format_number(standalone)
                ),
            )
        } else if category.is_some() && floor_area == 0.0 {
            if footprint < standalone {
                (
                    AuthorizationKind::Dp,
                    DecisionRule::UnenclosedStructure,
                    format!(
                        "Ouvrage sans surface close de moins de {} m² d'emprise.",
                        format_number(standalone)
                    ),
                )
            } else {
                (
                    AuthorizationKind::Pc,
                    DecisionRule::UnenclosedStructure,
                    format!(
                        "Ouvrage sans surface close d'au moins {} m² d'emprise.",
                        format_number(standalone)
                    ),
                )
            }
        } else if floor_area <= extension && total <= architect {
            (
                AuthorizationKind::Dp,
                DecisionRule::Fallback,
                format!(
                    "Projet créant au plus {} m² de surface de plancher.",
                    format_number(extension)
                ),
            )
        } else {
            (
                AuthorizationKind::Pc,
                DecisionRule::Fallback,
                format!(
                    "Projet créant plus de {} m² de surface de plancher ou portant le total au-delà de {} m².",
                    format_number(extension),
                    format_number(architect)
                ),
            )
        };

        if category == Some(ProjectCategory::Pool) {
            if let Some(shelter) = project.pool_shelter_height_m {
                if shelter >= t.pool_shelter_caveat_height_m {
                    caveats.push(format!(
                        "Abri de piscine de {} m de hauteur (au moins {} m) : vérifier la formalité applicable à l'abri.",
                        format_number(shelter),
                        format_number(t.pool_shelter_caveat_height_m)
                    ));
                }
            }
        }

        let insufficient_data =
            footprint == 0.0 && category != Some(ProjectCategory::FacadeOrUseChange);
        if insufficient_data {
            caveats.push(MISSING_DIMENSIONS.to_string());
        }

        let to_confirm = caveats.iter().any(|c| c == VERIFY_LOCALLY);
        let message = if kind == AuthorizationKind::Dp && to_confirm {
            format!("{} (à confirmer en mairie)", kind.label())
        } else {
            kind.label().to_string()
        };

        let detail = format!(
            "{} Emprise au sol créée : {} m² ; surface de plancher créée : {} m² ; surface de plancher totale après travaux : {} m² ({}).",
            reason,
            format_number(footprint),
            format_number(floor_area),
            format_number(total),
            zone
        );

        Determination {
            kind,
            message,
            detail,
            rule,
            caveats,
            insufficient_data,
            zone_label: zone,
            metrics,
        }
    }
}

impl Default for DeterminationEngine {
    fn default() -> Self {
        Self::with_default_thresholds()
    }
}
