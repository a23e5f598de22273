use geo::{
    coord, Area, Centroid, Coord, EuclideanDistance, GeodesicArea, Line, LineString, MultiPolygon,
    Polygon, Rect, Rotate,
};
use serde_json::Value;

use crate::models::{BoundaryKind, BoundarySegment, BuildingElement};

/// Footprint polygon of an element in local metres
///
/// `x`/`y` is the centre, `width_m` runs along x and `length_m` along y before
/// rotation; `rotation_deg` turns the footprint counter-clockwise about its centre.
pub fn element_polygon(element: &BuildingElement) -> Polygon<f64> {
    let half_w = element.width_m / 2.0;
    let half_l = element.length_m / 2.0;

    let polygon = Rect::new(
        coord! { x: element.x - half_w, y: element.y - half_l },
        coord! { x: element.x + half_w, y: element.y + half_l },
    )
    .to_polygon();

    match element.rotation_deg {
        Some(deg) if deg != 0.0 => polygon.rotate_around_centroid(deg),
        _ => polygon,
    }
}

/// Shortest distance from a footprint to the boundaries of the given kind
///
/// Returns `None` when the parcel has no boundary of that kind.
pub fn distance_to_boundary(
    footprint: &Polygon<f64>,
    boundaries: &[BoundarySegment],
    kind: BoundaryKind,
) -> Option<f64> {
    boundaries
        .iter()
        .filter(|b| b.kind == kind)
        .map(|b| {
            let line = Line::new(
                coord! { x: b.start[0], y: b.start[1] },
                coord! { x: b.end[0], y: b.end[1] },
            );
            footprint.euclidean_distance(&line)
        })
        .fold(None, |min, d| Some(min.map_or(d, |m: f64| m.min(d))))
}

/// Area enclosed by the boundary segments, taken in order
///
/// Needs at least three segments; the ring is closed implicitly.
pub fn outline_area(boundaries: &[BoundarySegment]) -> Option<f64> {
    if boundaries.len() < 3 {
        return None;
    }

    let ring: Vec<Coord<f64>> = boundaries
        .iter()
        .map(|b| coord! { x: b.start[0], y: b.start[1] })
        .collect();

    let area = Polygon::new(LineString::from(ring), vec![]).unsigned_area();
    (area > 0.0).then_some(area)
}

fn parse_ring(value: &Value) -> Option<LineString<f64>> {
    let coords = value
        .as_array()?
        .iter()
        .map(|pt| {
            let pt = pt.as_array()?;
            Some(coord! { x: pt.first()?.as_f64()?, y: pt.get(1)?.as_f64()? })
        })
        .collect::<Option<Vec<_>>>()?;

    (coords.len() >= 3).then(|| LineString::from(coords))
}

fn parse_polygon(value: &Value) -> Option<Polygon<f64>> {
    let rings = value.as_array()?;
    let mut rings = rings.iter().map(parse_ring);
    let exterior = rings.next()??;
    let interiors = rings.collect::<Option<Vec<_>>>()?;
    Some(Polygon::new(exterior, interiors))
}

/// Parse a GeoJSON `Polygon` or `MultiPolygon` geometry in lon/lat
pub fn parse_geojson_polygons(geometry: &Value) -> Option<MultiPolygon<f64>> {
    let coordinates = geometry.get("coordinates")?;

    match geometry.get("type")?.as_str()? {
        "Polygon" => Some(MultiPolygon::new(vec![parse_polygon(coordinates)?])),
        "MultiPolygon" => {
            let polygons = coordinates
                .as_array()?
                .iter()
                .map(parse_polygon)
                .collect::<Option<Vec<_>>>()?;
            Some(MultiPolygon::new(polygons))
        }
        _ => None,
    }
}

/// Geodesic area in square metres of a GeoJSON (multi)polygon in lon/lat
pub fn geodesic_area_m2(geometry: &Value) -> Option<f64> {
    let area = parse_geojson_polygons(geometry)?.geodesic_area_unsigned();
    (area > 0.0).then_some(area)
}

/// Centroid `[lon, lat]` of a GeoJSON (multi)polygon
pub fn geojson_centroid(geometry: &Value) -> Option<[f64; 2]> {
    let centroid = parse_geojson_polygons(geometry)?.centroid()?;
    Some([centroid.x(), centroid.y()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConstructionType;
    use serde_json::json;

    fn element(x: f64, y: f64, width: f64, length: f64) -> BuildingElement {
        BuildingElement {
            id: "e1".to_string(),
            construction_type: ConstructionType::MainHouse,
            label: None,
            x,
            y,
            width_m: width,
            length_m: length,
            height_m: 6.0,
            rotation_deg: None,
            distances: None,
        }
    }

    fn square_parcel() -> Vec<BoundarySegment> {
        vec![
            BoundarySegment { kind: BoundaryKind::Road, start: [0.0, 0.0], end: [20.0, 0.0] },
            BoundarySegment { kind: BoundaryKind::Side, start: [20.0, 0.0], end: [20.0, 30.0] },
            BoundarySegment { kind: BoundaryKind::Rear, start: [20.0, 30.0], end: [0.0, 30.0] },
            BoundarySegment { kind: BoundaryKind::Side, start: [0.0, 30.0], end: [0.0, 0.0] },
        ]
    }

    #[test]
    fn test_element_polygon_area() {
        let poly = element_polygon(&element(10.0, 10.0, 8.0, 6.0));
        assert!((poly.unsigned_area() - 48.0).abs() < 1e-9);

        let mut rotated = element(10.0, 10.0, 8.0, 6.0);
        rotated.rotation_deg = Some(30.0);
        assert!((element_polygon(&rotated).unsigned_area() - 48.0).abs() < 1e-6);
    }

    #[test]
    fn test_distance_to_boundaries() {
        let boundaries = square_parcel();
        // Footprint spans x 6..14, y 7..13
        let poly = element_polygon(&element(10.0, 10.0, 8.0, 6.0));

        let road = distance_to_boundary(&poly, &boundaries, BoundaryKind::Road).unwrap();
        let side = distance_to_boundary(&poly, &boundaries, BoundaryKind::Side).unwrap();
        let rear = distance_to_boundary(&poly, &boundaries, BoundaryKind::Rear).unwrap();

        assert!((road - 7.0).abs() < 1e-9);
        assert!((side - 6.0).abs() < 1e-9);
        assert!((rear - 17.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_boundary_kind() {
        let boundaries = vec![square_parcel()[0]];
        let poly = element_polygon(&element(10.0, 10.0, 2.0, 2.0));
        assert_eq!(distance_to_boundary(&poly, &boundaries, BoundaryKind::Rear), None);
    }

    #[test]
    fn test_outline_area() {
        assert_eq!(outline_area(&square_parcel()), Some(600.0));
        assert_eq!(outline_area(&square_parcel()[..2]), None);
    }

    #[test]
    fn test_geodesic_area_of_small_square() {
        // Roughly 11m x 7.3m near Paris
        let geometry = json!({
            "type": "MultiPolygon",
            "coordinates": [[[
                [2.3500, 48.8500],
                [2.3501, 48.8500],
                [2.3501, 48.8501],
                [2.3500, 48.8501],
                [2.3500, 48.8500]
            ]]]
        });

        let area = geodesic_area_m2(&geometry).unwrap();
        assert!(area > 70.0 && area < 90.0, "unexpected area {}", area);

        let centroid = geojson_centroid(&geometry).unwrap();
        assert!((centroid[0] - 2.35005).abs() < 1e-6);
        assert!((centroid[1] - 48.85005).abs() < 1e-6);
    }

    #[test]
    fn test_unsupported_geometry() {
        let point = json!({ "type": "Point", "coordinates": [2.35, 48.85] });
        assert_eq!(geodesic_area_m2(&point), None);
    }
}
