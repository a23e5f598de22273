// Criterion benchmarks for Permis Engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use permis_engine::core::{estimated_zone_rules, ComplianceChecker, DeterminationEngine};
use permis_engine::models::{
    BoundaryKind, BoundarySegment, BuildingElement, ConstructionType, ProjectCategory,
    ProjectDescription, SitePlan,
};

fn create_element(id: usize) -> BuildingElement {
    let types = [
        ConstructionType::MainHouse,
        ConstructionType::Garage,
        ConstructionType::Shed,
        ConstructionType::Pool,
        ConstructionType::Terrace,
    ];

    BuildingElement {
        id: id.to_string(),
        construction_type: types[id % types.len()],
        label: None,
        x: 5.0 + (id % 4) as f64 * 3.0,
        y: 6.0 + (id % 5) as f64 * 4.0,
        width_m: 3.0 + (id % 3) as f64,
        length_m: 4.0 + (id % 2) as f64,
        height_m: 2.5 + (id % 4) as f64,
        rotation_deg: Some((id * 7 % 45) as f64),
        distances: None,
    }
}

fn create_parcel() -> SitePlan {
    SitePlan {
        area_m2: None,
        boundaries: vec![
            BoundarySegment { kind: BoundaryKind::Road, start: [0.0, 0.0], end: [25.0, 0.0] },
            BoundarySegment { kind: BoundaryKind::Side, start: [25.0, 0.0], end: [25.0, 40.0] },
            BoundarySegment { kind: BoundaryKind::Rear, start: [25.0, 40.0], end: [0.0, 40.0] },
            BoundarySegment { kind: BoundaryKind::Side, start: [0.0, 40.0], end: [0.0, 0.0] },
        ],
    }
}

fn bench_determination(c: &mut Criterion) {
    let engine = DeterminationEngine::default();
    let project = ProjectDescription {
        project_category: Some(ProjectCategory::Extension),
        is_urban_zone: Some(true),
        length_m: Some(7.5),
        width_m: Some(4.2),
        height_m: Some(3.1),
        existing_floor_area_m2: 95.0,
        creates_enclosed_floor_area: true,
        ..Default::default()
    };

    c.bench_function("determination", |b| {
        b.iter(|| engine.determine(black_box(&project)));
    });
}

fn bench_compliance_check(c: &mut Criterion) {
    let checker = ComplianceChecker::default();
    let zone = estimated_zone_rules(Some("UB"));
    let parcel = create_parcel();
    let mut group = c.benchmark_group("compliance_check");

    for size in [1, 5, 20].iter() {
        let elements: Vec<BuildingElement> = (0..*size).map(create_element).collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| checker.check(black_box(&elements), black_box(&zone), black_box(&parcel)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_determination, bench_compliance_check);
criterion_main!(benches);
