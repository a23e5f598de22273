use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use super::{geodata_error, validation_error, AppState};
use crate::core::regulatory_context;
use crate::models::{
    AddressQuery, AddressSearchResponse, CoordinatesQuery, HeritageInfo, Parcel, SiteContext,
    ZoningInfo,
};
use crate::services::{CacheKey, GeodataError};

/// Configure the geodata lookup routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/geodata")
            .route("/address", web::get().to(search_address))
            .route("/parcel", web::get().to(parcel))
            .route("/zoning", web::get().to(zoning))
            .route("/heritage", web::get().to(heritage))
            .route("/site", web::get().to(site)),
    );
}

pub(super) async fn cached_zoning(
    state: &AppState,
    lon: f64,
    lat: f64,
) -> Result<Option<ZoningInfo>, GeodataError> {
    state
        .cache
        .get_or_fetch(&CacheKey::zoning(lon, lat), || state.geodata.zoning_at(lon, lat))
        .await
}

pub(super) async fn cached_heritage(
    state: &AppState,
    lon: f64,
    lat: f64,
) -> Result<HeritageInfo, GeodataError> {
    state
        .cache
        .get_or_fetch(&CacheKey::heritage(lon, lat), || state.geodata.heritage_at(lon, lat))
        .await
}

/// GET /api/v1/geodata/address?q=...&limit=5
async fn search_address(
    state: web::Data<AppState>,
    query: web::Query<AddressQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_error(errors);
    }

    let key = CacheKey::address(&query.q, query.limit);
    let results = state
        .cache
        .get_or_fetch(&key, || state.geodata.search_address(&query.q, query.limit))
        .await;

    match results {
        Ok(results) => HttpResponse::Ok().json(AddressSearchResponse { results }),
        Err(e) => geodata_error(e),
    }
}

/// GET /api/v1/geodata/parcel?lon=..&lat=..
async fn parcel(state: web::Data<AppState>, query: web::Query<CoordinatesQuery>) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_error(errors);
    }
    let CoordinatesQuery { lon, lat } = *query;

    let parcel: Result<Parcel, _> = state
        .cache
        .get_or_fetch(&CacheKey::parcel(lon, lat), || state.geodata.parcel_at(lon, lat))
        .await;

    match parcel {
        Ok(parcel) => HttpResponse::Ok().json(parcel),
        Err(e) => geodata_error(e),
    }
}

/// GET /api/v1/geodata/zoning?lon=..&lat=..
///
/// A point outside any digitised PLU is not an error: the response then
/// carries no zoning and estimated non-urban rules.
async fn zoning(state: web::Data<AppState>, query: web::Query<CoordinatesQuery>) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_error(errors);
    }

    match cached_zoning(&state, query.lon, query.lat).await {
        Ok(zoning) => HttpResponse::Ok().json(regulatory_context(zoning)),
        Err(e) => geodata_error(e),
    }
}

/// GET /api/v1/geodata/heritage?lon=..&lat=..
async fn heritage(
    state: web::Data<AppState>,
    query: web::Query<CoordinatesQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_error(errors);
    }

    match cached_heritage(&state, query.lon, query.lat).await {
        Ok(heritage) => HttpResponse::Ok().json(heritage),
        Err(e) => geodata_error(e),
    }
}

/// GET /api/v1/geodata/site?lon=..&lat=..
///
/// Never fails on upstream errors; failed sources are listed in `sources`.
/// Only complete answers are cached.
async fn site(state: web::Data<AppState>, query: web::Query<CoordinatesQuery>) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_error(errors);
    }
    let CoordinatesQuery { lon, lat } = *query;
    let key = CacheKey::site(lon, lat);

    if let Ok(cached) = state.cache.get::<SiteContext>(&key).await {
        return HttpResponse::Ok().json(cached);
    }

    let context = state.geodata.site_context(lon, lat).await;

    if context.sources.iter().all(|s| s.ok) {
        if let Err(e) = state.cache.set(&key, &context).await {
            tracing::warn!("Cache write failed for {}: {}", key, e);
        }
    } else {
        tracing::info!(
            "Partial site context at {}, {}: {} of {} sources failed",
            lon,
            lat,
            context.sources.iter().filter(|s| !s.ok).count(),
            context.sources.len()
        );
    }

    HttpResponse::Ok().json(context)
}
