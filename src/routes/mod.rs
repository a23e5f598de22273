// Route exports
pub mod dossiers;
pub mod evaluation;
pub mod geodata;

use actix_web::{web, HttpResponse};
use std::sync::Arc;
use validator::ValidationErrors;

use crate::core::{ComplianceChecker, DeterminationEngine};
use crate::models::ErrorResponse;
use crate::services::{CacheManager, GeodataClient, GeodataError, PostgresClient, StoreError};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub geodata: Arc<GeodataClient>,
    pub cache: Arc<CacheManager>,
    pub postgres: Arc<PostgresClient>,
    pub engine: DeterminationEngine,
    pub checker: ComplianceChecker,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(evaluation::configure)
            .configure(geodata::configure)
            .configure(dossiers::configure),
    );
}

fn validation_error(errors: ValidationErrors) -> HttpResponse {
    tracing::info!("Validation failed: {:?}", errors);
    HttpResponse::BadRequest().json(ErrorResponse::new(
        "Validation failed",
        errors.to_string(),
        400,
    ))
}

fn bad_request(error: &str, message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse::new(error, message, 400))
}

fn geodata_error(e: GeodataError) -> HttpResponse {
    match e {
        GeodataError::NotFound(message) => {
            HttpResponse::NotFound().json(ErrorResponse::new("Not found", message, 404))
        }
        e => upstream_error(e),
    }
}

/// Any lookup failure as a 502, including upstream 404s
fn upstream_error(e: GeodataError) -> HttpResponse {
    tracing::error!("Geodata lookup failed: {}", e);
    HttpResponse::BadGateway().json(ErrorResponse::new(
        "Geodata lookup failed",
        e.to_string(),
        502,
    ))
}

fn store_error(e: StoreError) -> HttpResponse {
    match e {
        StoreError::NotFound(message) => {
            HttpResponse::NotFound().json(ErrorResponse::new("Not found", message, 404))
        }
        e @ StoreError::Conflict { .. } => {
            HttpResponse::Conflict().json(ErrorResponse::new(
                "Revision conflict",
                e.to_string(),
                409,
            ))
        }
        e => {
            tracing::error!("Dossier store failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new(
                "Storage failure",
                e.to_string(),
                500,
            ))
        }
    }
}
