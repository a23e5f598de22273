use crate::models::ConstructionType;

/// Per-type overrides applied by the compliance checker
///
/// `None` means "defer to the zone rules".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeRules {
    /// Whether the footprint counts toward the coverage ratio (CES)
    pub counts_toward_coverage: bool,
    /// Whether the element creates housing (drives the parking check)
    pub is_housing: bool,
    pub max_height_m: Option<f64>,
    pub setback_road_m: Option<f64>,
    pub setback_side_m: Option<f64>,
    pub setback_rear_m: Option<f64>,
    /// Footprint at or below which no formality is required
    pub exemption_area_m2: Option<f64>,
}

const HOUSING: TypeRules = TypeRules {
    counts_toward_coverage: true,
    is_housing: true,
    max_height_m: None,
    setback_road_m: None,
    setback_side_m: None,
    setback_rear_m: None,
    exemption_area_m2: None,
};

pub fn type_rules(construction_type: ConstructionType) -> TypeRules {
    match construction_type {
        ConstructionType::MainHouse | ConstructionType::Extension => HOUSING,
        ConstructionType::Annex => TypeRules {
            exemption_area_m2: Some(5.0),
            ..HOUSING
        },
        ConstructionType::Garage => TypeRules {
            is_housing: false,
            exemption_area_m2: Some(5.0),
            ..HOUSING
        },
        ConstructionType::Shed => TypeRules {
            counts_toward_coverage: true,
            is_housing: false,
            max_height_m: Some(3.5),
            setback_road_m: None,
            setback_side_m: Some(1.0),
            setback_rear_m: Some(1.0),
            exemption_area_m2: Some(5.0),
        },
        ConstructionType::Carport => TypeRules {
            counts_toward_coverage: true,
            is_housing: false,
            max_height_m: Some(3.0),
            setback_road_m: None,
            setback_side_m: Some(1.0),
            setback_rear_m: Some(1.0),
            exemption_area_m2: Some(5.0),
        },
        ConstructionType::Pool => TypeRules {
            counts_toward_coverage: false,
            is_housing: false,
            max_height_m: Some(1.8),
            setback_road_m: None,
            setback_side_m: Some(2.0),
            setback_rear_m: Some(2.0),
            exemption_area_m2: Some(10.0),
        },
        ConstructionType::Terrace => TypeRules {
            counts_toward_coverage: false,
            is_housing: false,
            max_height_m: Some(0.6),
            setback_road_m: Some(0.0),
            setback_side_m: Some(0.0),
            setback_rear_m: Some(0.0),
            exemption_area_m2: Some(20.0),
        },
        ConstructionType::Pergola => TypeRules {
            counts_toward_coverage: false,
            is_housing: false,
            max_height_m: Some(3.0),
            setback_road_m: None,
            setback_side_m: Some(1.0),
            setback_rear_m: Some(1.0),
            exemption_area_m2: Some(5.0),
        },
        ConstructionType::Other => TypeRules {
            is_housing: false,
            ..HOUSING
        },
    }
}

/// French label used in findings
pub fn type_label(construction_type: ConstructionType) -> &'static str {
    match construction_type {
        ConstructionType::MainHouse => "maison principale",
        ConstructionType::Extension => "extension",
        ConstructionType::Garage => "garage",
        ConstructionType::Annex => "annexe",
        ConstructionType::Shed => "abri de jardin",
        ConstructionType::Carport => "carport",
        ConstructionType::Pool => "piscine",
        ConstructionType::Terrace => "terrasse",
        ConstructionType::Pergola => "pergola",
        ConstructionType::Other => "construction",
    }
}
