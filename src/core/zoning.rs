use crate::models::{RegulatoryContext, ZoneRules, ZoningInfo};

/// Broad family of a PLU zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneFamily {
    /// U* zones and the AU/AUD zones opened to urbanisation
    Urban,
    /// Other AU* zones (closed to urbanisation until the PLU is amended)
    FutureUrban,
    Agricultural,
    Natural,
    /// No digitised PLU zone: national rules (RNU) apply
    National,
}

/// Whether a zoning code is classified urban
///
/// Codes starting with `U`, and exactly `AU` / `AUD`, are urban.
#[inline]
pub fn is_urban_zone(code: &str) -> bool {
    let code = code.trim().to_uppercase();
    code.starts_with('U') || code == "AU" || code == "AUD"
}

pub fn zone_family(code: Option<&str>) -> ZoneFamily {
    let Some(code) = code.map(|c| c.trim().to_uppercase()).filter(|c| !c.is_empty()) else {
        return ZoneFamily::National;
    };

    // "1AU" / "2AU" number the opening phases of future urban zones
    let stem = code.trim_start_matches(|c: char| c.is_ascii_digit());

    if is_urban_zone(&code) {
        ZoneFamily::Urban
    } else if stem.starts_with("AU") {
        ZoneFamily::FutureUrban
    } else if stem.starts_with('A') {
        ZoneFamily::Agricultural
    } else if stem.starts_with('N') {
        ZoneFamily::Natural
    } else {
        ZoneFamily::National
    }
}

/// Human-readable zone label used in determination details
pub fn zone_label(code: Option<&str>, is_urban: bool) -> String {
    match code.map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) if is_urban => format!("zone urbaine {}", code),
        Some(code) => format!("zone {} (hors zone urbaine)", code),
        None if is_urban => "zone urbaine".to_string(),
        None => "zone non urbaine ou non renseignée".to_string(),
    }
}

/// Generic zone rules used when the local PLU regulation is not available
///
/// Every value returned here carries `estimated = true`.
pub fn estimated_zone_rules(code: Option<&str>) -> ZoneRules {
    let family = zone_family(code);
    let zone_code = code.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());

    let (max_height_m, max_coverage_pct, road, side, rear, green) = match family {
        ZoneFamily::Urban => (9.0, 60.0, 5.0, 3.0, 4.0, 20.0),
        ZoneFamily::FutureUrban => (9.0, 40.0, 5.0, 4.0, 4.0, 30.0),
        ZoneFamily::Agricultural => (7.0, 10.0, 10.0, 5.0, 5.0, 70.0),
        ZoneFamily::Natural => (7.0, 5.0, 10.0, 5.0, 5.0, 80.0),
        ZoneFamily::National => (7.0, 30.0, 5.0, 3.0, 3.0, 40.0),
    };

    ZoneRules {
        zone_code,
        max_height_m: Some(max_height_m),
        max_coverage_pct: Some(max_coverage_pct),
        setback_road_m: Some(road),
        setback_side_m: Some(side),
        setback_rear_m: Some(rear),
        min_green_space_pct: Some(green),
        parking_requirement: match family {
            ZoneFamily::Urban | ZoneFamily::FutureUrban => {
                Some("1 place de stationnement par logement (estimation)".to_string())
            }
            _ => None,
        },
        estimated: true,
    }
}

/// Build the regulatory context for a zoning lookup result
///
/// A missing zone is treated as non-urban.
pub fn regulatory_context(zoning: Option<ZoningInfo>) -> RegulatoryContext {
    let code = zoning.as_ref().map(|z| z.libelle.as_str());
    let is_urban = code.map(is_urban_zone).unwrap_or(false);

    RegulatoryContext {
        zone_label: zone_label(code, is_urban),
        zone_rules: estimated_zone_rules(code),
        is_urban_zone: is_urban,
        zoning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urban_codes() {
        assert!(is_urban_zone("UA"));
        assert!(is_urban_zone("ub1"));
        assert!(is_urban_zone(" U "));
        assert!(is_urban_zone("AU"));
        assert!(is_urban_zone("AUD"));
        assert!(is_urban_zone("aud"));
    }

    #[test]
    fn test_non_urban_codes() {
        assert!(!is_urban_zone("AUC"));
        assert!(!is_urban_zone("A"));
        assert!(!is_urban_zone("N"));
        assert!(!is_urban_zone("NH"));
        assert!(!is_urban_zone(""));
    }

    #[test]
    fn test_zone_family() {
        assert_eq!(zone_family(Some("UB")), ZoneFamily::Urban);
        assert_eq!(zone_family(Some("2AU")), ZoneFamily::FutureUrban);
        assert_eq!(zone_family(Some("AUs")), ZoneFamily::FutureUrban);
        assert_eq!(zone_family(Some("Ap")), ZoneFamily::Agricultural);
        assert_eq!(zone_family(Some("Nl")), ZoneFamily::Natural);
        assert_eq!(zone_family(None), ZoneFamily::National);
        assert_eq!(zone_family(Some("  ")), ZoneFamily::National);
    }

    #[test]
    fn test_zone_label() {
        assert_eq!(zone_label(Some("UB"), true), "zone urbaine UB");
        assert_eq!(zone_label(Some("N"), false), "zone N (hors zone urbaine)");
        assert_eq!(zone_label(None, false), "zone non urbaine ou non renseignée");
    }

    #[test]
    fn test_missing_zoning_is_non_urban() {
        let ctx = regulatory_context(None);
        assert!(!ctx.is_urban_zone);
        assert!(ctx.zone_rules.estimated);
        assert_eq!(ctx.zone_rules.max_coverage_pct, Some(30.0));
    }

    #[test]
    fn test_regulatory_context_from_zoning() {
        let ctx = regulatory_context(Some(ZoningInfo {
            libelle: "UC".to_string(),
            libelong: Some("Zone urbaine pavillonnaire".to_string()),
            typezone: Some("U".to_string()),
            partition: None,
        }));
        assert!(ctx.is_urban_zone);
        assert_eq!(ctx.zone_label, "zone urbaine UC");
        assert_eq!(ctx.zone_rules.zone_code.as_deref(), Some("UC"));
    }
}
