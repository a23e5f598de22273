use crate::core::construction::{type_label, type_rules, TypeRules};
use crate::core::determination::format_number;
use crate::core::geometry::{distance_to_boundary, element_polygon, outline_area};
use crate::models::{
    BoundaryKind, BuildingElement, ComplianceFinding, ComplianceReport, ComplianceRule,
    ComplianceStatus, ComplianceSummary, SitePlan, ZoneRules,
};

/// Evaluates drawn building elements against a zone's rules
///
/// Pure and stateless: the same inputs always give the same report.
/// Findings are ordered per element (formality, height, road/side/rear
/// setbacks), followed by the parcel-wide checks (coverage, green space,
/// parking).
#[derive(Debug, Clone, Copy)]
pub struct ComplianceChecker {
    /// Share of the maximum coverage from which a warning is raised
    coverage_warning_ratio: f64,
    /// Multiple of the minimum green space under which a warning is raised
    green_space_warning_ratio: f64,
}

impl ComplianceChecker {
    pub fn new(coverage_warning_ratio: f64, green_space_warning_ratio: f64) -> Self {
        Self {
            coverage_warning_ratio,
            green_space_warning_ratio,
        }
    }

    pub fn check(
        &self,
        elements: &[BuildingElement],
        zone: &ZoneRules,
        parcel: &SitePlan,
    ) -> ComplianceReport {
        let parcel_area = parcel
            .area_m2
            .filter(|a| *a > 0.0)
            .or_else(|| outline_area(&parcel.boundaries));

        let mut findings = Vec::new();

        for element in elements {
            let rules = type_rules(element.construction_type);
            findings.push(check_formality(element, &rules));
            if let Some(finding) = check_height(element, &rules, zone) {
                findings.push(finding);
            }
            findings.extend(check_setbacks(element, &rules, zone, parcel));
        }

        let coverage_area: f64 = elements
            .iter()
            .filter(|e| type_rules(e.construction_type).counts_toward_coverage)
            .map(BuildingElement::footprint_m2)
            .sum();
        let built_area: f64 = elements.iter().map(BuildingElement::footprint_m2).sum();

        if let Some(finding) = self.check_coverage(coverage_area, parcel_area, zone) {
            findings.push(finding);
        }
        if let Some(finding) = self.check_green_space(built_area, parcel_area, zone) {
            findings.push(finding);
        }
        if let Some(finding) = check_parking(elements, zone) {
            findings.push(finding);
        }

        let mut summary = ComplianceSummary::default();
        for finding in &findings {
            match finding.status {
                ComplianceStatus::Compliant => summary.compliant += 1,
                ComplianceStatus::Warning => summary.warnings += 1,
                ComplianceStatus::Violation => summary.violations += 1,
            }
        }

        let overall_status = findings
            .iter()
            .map(|f| f.status)
            .max()
            .unwrap_or(ComplianceStatus::Compliant);

        ComplianceReport {
            coverage_pct: parcel_area.map(|area| coverage_area / area * 100.0),
            findings,
            summary,
            overall_status,
            parcel_area_m2: parcel_area,
            built_area_m2: built_area,
        }
    }

    fn check_coverage(
        &self,
        coverage_area: f64,
        parcel_area: Option<f64>,
        zone: &ZoneRules,
    ) -> Option<ComplianceFinding> {
        let max = zone.max_coverage_pct?;

        let Some(area) = parcel_area else {
            return Some(finding(
                ComplianceRule::Coverage,
                None,
                ComplianceStatus::Warning,
                "Emprise au sol non évaluable",
                format!(
                    "Surface de parcelle inconnue : impossible de comparer {} m² d'emprise au CES maximal de {} %.",
                    format_number(coverage_area),
                    format_number(max)
                ),
                None,
            ));
        };

        let pct = coverage_area / area * 100.0;
        let detail = format!(
            "Emprise au sol : {} m² sur {} m² de parcelle, soit {} % (maximum {} %).",
            format_number(coverage_area),
            format_number(area),
            format_number(pct),
            format_number(max)
        );

        // Compare areas so an exact tie stays within the limit
        let allowed = max * area / 100.0;
        Some(if coverage_area > allowed {
            let excess = coverage_area - allowed;
            finding(
                ComplianceRule::Coverage,
                None,
                ComplianceStatus::Violation,
                "Coefficient d'emprise au sol dépassé",
                detail,
                Some(format!("Réduire l'emprise au sol de {} m².", format_number(excess))),
            )
        } else if coverage_area >= allowed * self.coverage_warning_ratio {
            finding(
                ComplianceRule::Coverage,
                None,
                ComplianceStatus::Warning,
                "Coefficient d'emprise au sol proche du maximum",
                detail,
                None,
            )
        } else {
            finding(
                ComplianceRule::Coverage,
                None,
                ComplianceStatus::Compliant,
                "Coefficient d'emprise au sol respecté",
                detail,
                None,
            )
        })
    }

    fn check_green_space(
        &self,
        built_area: f64,
        parcel_area: Option<f64>,
        zone: &ZoneRules,
    ) -> Option<ComplianceFinding> {
        let min = zone.min_green_space_pct?;

        let Some(area) = parcel_area else {
            return Some(finding(
                ComplianceRule::GreenSpace,
                None,
                ComplianceStatus::Warning,
                "Espaces verts non évaluables",
                format!(
                    "Surface de parcelle inconnue : impossible de vérifier le minimum de {} % d'espaces verts.",
                    format_number(min)
                ),
                None,
            ));
        };

        let green_area = (area - built_area).max(0.0);
        let pct = green_area / area * 100.0;
        let detail = format!(
            "Espaces libres : {} m² sur {} m² de parcelle, soit {} % (minimum {} %).",
            format_number(green_area),
            format_number(area),
            format_number(pct),
            format_number(min)
        );

        let required = min * area / 100.0;
        Some(if green_area < required {
            let missing = required - green_area;
            finding(
                ComplianceRule::GreenSpace,
                None,
                ComplianceStatus::Violation,
                "Espaces verts insuffisants",
                detail,
                Some(format!(
                    "Libérer {} m² de surface construite ou imperméabilisée.",
                    format_number(missing)
                )),
            )
        } else if green_area < required * self.green_space_warning_ratio {
            finding(
                ComplianceRule::GreenSpace,
                None,
                ComplianceStatus::Warning,
                "Espaces verts proches du minimum",
                detail,
                None,
            )
        } else {
            finding(
                ComplianceRule::GreenSpace,
                None,
                ComplianceStatus::Compliant,
                "Espaces verts suffisants",
                detail,
                None,
            )
        })
    }
}

impl Default for ComplianceChecker {
    fn default() -> Self {
        Self::new(0.9, 1.1)
    }
}

fn finding(
    rule: ComplianceRule,
    element_id: Option<&str>,
    status: ComplianceStatus,
    message: &str,
    detail: String,
    suggestion: Option<String>,
) -> ComplianceFinding {
    ComplianceFinding {
        rule,
        element_id: element_id.map(str::to_string),
        status,
        message: message.to_string(),
        detail,
        suggestion,
    }
}

fn check_formality(element: &BuildingElement, rules: &TypeRules) -> ComplianceFinding {
    let footprint = element.footprint_m2();
    let label = type_label(element.construction_type);

    match rules.exemption_area_m2 {
        Some(threshold) if footprint <= threshold => finding(
            ComplianceRule::Formality,
            Some(&element.id),
            ComplianceStatus::Compliant,
            "Aucune formalité requise",
            format!(
                "{} ({}) : {} m², sous le seuil de dispense de {} m².",
                element.display_name(),
                label,
                format_number(footprint),
                format_number(threshold)
            ),
            None,
        ),
        Some(threshold) => finding(
            ComplianceRule::Formality,
            Some(&element.id),
            ComplianceStatus::Warning,
            "Formalité d'urbanisme requise",
            format!(
                "{} ({}) : {} m², au-delà du seuil de dispense de {} m².",
                element.display_name(),
                label,
                format_number(footprint),
                format_number(threshold)
            ),
            None,
        ),
        None => finding(
            ComplianceRule::Formality,
            Some(&element.id),
            ComplianceStatus::Warning,
            "Formalité d'urbanisme requise",
            format!(
                "{} ({}) : {} m², toujours soumis à autorisation.",
                element.display_name(),
                label,
                format_number(footprint)
            ),
            None,
        ),
    }
}

fn check_height(
    element: &BuildingElement,
    rules: &TypeRules,
    zone: &ZoneRules,
) -> Option<ComplianceFinding> {
    let max = rules.max_height_m.or(zone.max_height_m)?;
    let detail = format!(
        "{} : hauteur {} m pour un maximum de {} m.",
        element.display_name(),
        format_number(element.height_m),
        format_number(max)
    );

    Some(if element.height_m > max {
        finding(
            ComplianceRule::Height,
            Some(&element.id),
            ComplianceStatus::Violation,
            "Hauteur maximale dépassée",
            detail,
            Some(format!(
                "Réduire la hauteur de {} m.",
                format_number(element.height_m - max)
            )),
        )
    } else {
        finding(
            ComplianceRule::Height,
            Some(&element.id),
            ComplianceStatus::Compliant,
            "Hauteur conforme",
            detail,
            None,
        )
    })
}

/// Required setback for one boundary kind
///
/// Side and rear setbacks that defer to the zone grow with the element's
/// height (`height / 2` and `height * 0.25`) but never drop below the zone's
/// flat minimum.
pub fn required_setback(
    kind: BoundaryKind,
    height_m: f64,
    rules: &TypeRules,
    zone: &ZoneRules,
) -> Option<f64> {
    let required = match kind {
        BoundaryKind::Road => rules.setback_road_m.or(zone.setback_road_m)?,
        BoundaryKind::Side => rules
            .setback_side_m
            .unwrap_or_else(|| zone.setback_side_m.unwrap_or(0.0).max(height_m / 2.0)),
        BoundaryKind::Rear => rules
            .setback_rear_m
            .unwrap_or_else(|| zone.setback_rear_m.unwrap_or(0.0).max(height_m * 0.25)),
    };

    (required > 0.0).then_some(required)
}

fn check_setbacks(
    element: &BuildingElement,
    rules: &TypeRules,
    zone: &ZoneRules,
    parcel: &SitePlan,
) -> Vec<ComplianceFinding> {
    let mut findings = Vec::new();
    let mut footprint = None;

    for (kind, rule, name) in [
        (BoundaryKind::Road, ComplianceRule::SetbackRoad, "la voie"),
        (BoundaryKind::Side, ComplianceRule::SetbackSide, "la limite séparative latérale"),
        (BoundaryKind::Rear, ComplianceRule::SetbackRear, "la limite de fond de parcelle"),
    ] {
        let Some(required) = required_setback(kind, element.height_m, rules, zone) else {
            continue;
        };

        let explicit = element.distances.and_then(|d| match kind {
            BoundaryKind::Road => d.road_m,
            BoundaryKind::Side => d.side_m,
            BoundaryKind::Rear => d.rear_m,
        });
        let distance = explicit.or_else(|| {
            let polygon = footprint.get_or_insert_with(|| element_polygon(element));
            distance_to_boundary(polygon, &parcel.boundaries, kind)
        });
        let Some(distance) = distance else {
            continue;
        };

        let detail = format!(
            "{} : {} m de {} pour un recul minimal de {} m.",
            element.display_name(),
            format_number(distance),
            name,
            format_number(required)
        );

        findings.push(if distance < required {
            finding(
                rule,
                Some(&element.id),
                ComplianceStatus::Violation,
                "Recul insuffisant",
                detail,
                Some(format!(
                    "Reculer de {} m par rapport à {}.",
                    format_number(required - distance),
                    name
                )),
            )
        } else {
            finding(
                rule,
                Some(&element.id),
                ComplianceStatus::Compliant,
                "Recul respecté",
                detail,
                None,
            )
        });
    }

    findings
}

fn check_parking(elements: &[BuildingElement], zone: &ZoneRules) -> Option<ComplianceFinding> {
    let requirement = zone
        .parking_requirement
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())?;

    if !elements
        .iter()
        .any(|e| type_rules(e.construction_type).is_housing)
    {
        return None;
    }

    Some(finding(
        ComplianceRule::Parking,
        None,
        ComplianceStatus::Warning,
        "Stationnement à prévoir",
        format!("Règle de stationnement de la zone : {}", requirement),
        Some("Faire figurer les places de stationnement sur le plan de masse.".to_string()),
    ))
}
