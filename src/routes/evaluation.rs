use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use super::{validation_error, AppState};
use crate::models::{ComplianceCheckRequest, HealthResponse, ProjectDescription};

/// Configure the stateless evaluation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/determination", web::post().to(determine))
        .route("/compliance/check", web::post().to(check_compliance));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Determine the authorization a project needs
///
/// POST /api/v1/determination
///
/// Request body:
/// ```json
/// {
///   "projectCategory": "extension",
///   "isUrbanZone": true,
///   "lengthM": 6,
///   "widthM": 5,
///   "heightM": 2.5,
///   "existingFloorAreaM2": 90,
///   "createsEnclosedFloorArea": true
/// }
/// ```
async fn determine(
    state: web::Data<AppState>,
    req: web::Json<ProjectDescription>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let determination = state.engine.determine(&req);

    tracing::info!(
        "Determination: {} via {:?} (footprint {} m², total floor area {} m²)",
        determination.kind.as_code(),
        determination.rule,
        determination.metrics.created_footprint_m2,
        determination.metrics.total_floor_area_after_m2
    );

    HttpResponse::Ok().json(determination)
}

/// Check drawn elements against zone rules
///
/// POST /api/v1/compliance/check
async fn check_compliance(
    state: web::Data<AppState>,
    req: web::Json<ComplianceCheckRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let report = state.checker.check(&req.elements, &req.zone_rules, &req.parcel);

    tracing::info!(
        "Compliance check: {} elements, {:?} ({} violations, {} warnings)",
        req.elements.len(),
        report.overall_status,
        report.summary.violations,
        report.summary.warnings
    );

    HttpResponse::Ok().json(report)
}
