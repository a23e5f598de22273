use actix_web::{web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

use super::geodata::{cached_heritage, cached_zoning};
use super::{bad_request, store_error, upstream_error, validation_error, AppState};
use crate::core::{decide, regulatory_context, ComplianceChecker, Dossier, DossierUpdate};
use crate::models::{
    AddressCandidate, ComplianceReport, CreateDossierRequest, DossierComplianceRequest,
    ErrorResponse, HeritageInfo, Parcel, ProjectDescription, RegulatoryContext, SitePlan,
    UpdateDossierRequest,
};

/// Configure the dossier routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/dossiers")
            .route("", web::post().to(create_dossier))
            .route("/{id}", web::get().to(get_dossier))
            .route("/{id}", web::patch().to(update_dossier))
            .route("/{id}/decision", web::post().to(decide_dossier))
            .route("/{id}/compliance", web::post().to(check_dossier_compliance)),
    );
}

/// User-entered fields, applied in dependency order
fn user_updates(
    address: Option<AddressCandidate>,
    parcel: Option<Parcel>,
    project: Option<ProjectDescription>,
) -> Vec<DossierUpdate> {
    let mut updates = Vec::with_capacity(3);
    if let Some(address) = address {
        updates.push(DossierUpdate::Address(Some(address)));
    }
    if let Some(parcel) = parcel {
        updates.push(DossierUpdate::Parcel(Some(parcel)));
    }
    if let Some(project) = project {
        updates.push(DossierUpdate::Project(project));
    }
    updates
}

/// Apply a PATCH body; `Ok(true)` when the dossier changed
fn apply_user_update(
    dossier: &mut Dossier,
    req: UpdateDossierRequest,
) -> Result<bool, HttpResponse> {
    if let Some(revision) = req.revision {
        if revision != dossier.revision {
            return Err(HttpResponse::Conflict().json(ErrorResponse::new(
                "Revision conflict",
                format!(
                    "Dossier {} is at revision {}, update was based on {}",
                    dossier.id, dossier.revision, revision
                ),
                409,
            )));
        }
    }

    let mut changed = false;
    for update in user_updates(req.address, req.parcel, req.project) {
        let outcome = dossier.apply(update);
        if !outcome.cleared.is_empty() {
            tracing::debug!("Dossier {} cleared {:?}", dossier.id, outcome.cleared);
        }
        changed |= outcome.changed;
    }

    Ok(changed)
}

/// Zoning and heritage at a dossier's location
///
/// Every lookup failure is an upstream failure here, so an upstream 404
/// never reads as an unknown dossier.
async fn site_rules(
    state: &AppState,
    lon: f64,
    lat: f64,
) -> Result<(RegulatoryContext, HeritageInfo), HttpResponse> {
    let (zoning, heritage) = tokio::join!(
        cached_zoning(state, lon, lat),
        cached_heritage(state, lon, lat)
    );

    let zoning = zoning.map_err(upstream_error)?;
    let heritage = heritage.map_err(upstream_error)?;
    Ok((regulatory_context(zoning), heritage))
}

/// Check a site plan against the zone rules stored on the dossier
fn plan_compliance(
    checker: &ComplianceChecker,
    dossier: &Dossier,
    req: DossierComplianceRequest,
) -> Result<ComplianceReport, HttpResponse> {
    let Some(regulatory) = dossier.regulatory.as_ref() else {
        return Err(bad_request(
            "missing_regulatory_context",
            "Dossier has no zoning yet; request a decision first",
        ));
    };

    let plan = SitePlan {
        area_m2: req
            .parcel
            .area_m2
            .or_else(|| dossier.parcel.as_ref().and_then(|p| p.area_m2())),
        boundaries: req.parcel.boundaries,
    };

    Ok(checker.check(&req.elements, &regulatory.zone_rules, &plan))
}

/// POST /api/v1/dossiers
async fn create_dossier(
    state: web::Data<AppState>,
    req: web::Json<CreateDossierRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let req = req.into_inner();
    let mut dossier = Dossier::new();
    for update in user_updates(req.address, req.parcel, req.project) {
        dossier.apply(update);
    }

    match state.postgres.create_dossier(&dossier).await {
        Ok(()) => {
            tracing::info!("Created dossier {}", dossier.id);
            HttpResponse::Created().json(dossier)
        }
        Err(e) => store_error(e),
    }
}

/// GET /api/v1/dossiers/{id}
async fn get_dossier(state: web::Data<AppState>, id: web::Path<Uuid>) -> impl Responder {
    match state.postgres.get_dossier(*id).await {
        Ok(dossier) => HttpResponse::Ok().json(dossier),
        Err(e) => store_error(e),
    }
}

/// PATCH /api/v1/dossiers/{id}
///
/// Changing the address or parcel drops every field derived from them, so
/// a stale decision never survives a move to another plot.
async fn update_dossier(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    req: web::Json<UpdateDossierRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let mut dossier = match state.postgres.get_dossier(*id).await {
        Ok(dossier) => dossier,
        Err(e) => return store_error(e),
    };

    let expected = dossier.revision;
    let changed = match apply_user_update(&mut dossier, req.into_inner()) {
        Ok(changed) => changed,
        Err(response) => return response,
    };

    if changed {
        if let Err(e) = state.postgres.save_dossier(&dossier, expected).await {
            return store_error(e);
        }
    }

    HttpResponse::Ok().json(dossier)
}

/// POST /api/v1/dossiers/{id}/decision
///
/// Zoning and heritage are looked up again from the dossier's location and
/// stored on it; the determination then runs on the server-derived zone.
async fn decide_dossier(state: web::Data<AppState>, id: web::Path<Uuid>) -> impl Responder {
    let mut dossier = match state.postgres.get_dossier(*id).await {
        Ok(dossier) => dossier,
        Err(e) => return store_error(e),
    };

    let Some(project) = dossier.project.clone() else {
        return bad_request("missing_project", "Dossier has no project description");
    };
    let Some([lon, lat]) = dossier.location() else {
        return bad_request("missing_location", "Dossier has no address or parcel");
    };

    let (regulatory, heritage) = match site_rules(&state, lon, lat).await {
        Ok(found) => found,
        Err(response) => return response,
    };

    let expected = dossier.revision;
    let decision = decide(&state.engine, &project, &regulatory, Some(&heritage));

    dossier.apply(DossierUpdate::Regulatory(regulatory));
    dossier.apply(DossierUpdate::Heritage(heritage));
    dossier.apply(DossierUpdate::Decision(decision.clone()));

    if let Err(e) = state.postgres.save_dossier(&dossier, expected).await {
        return store_error(e);
    }

    if let Err(e) = state
        .postgres
        .record_determination(dossier.id, &project, &decision)
        .await
    {
        tracing::error!("Failed to audit determination for dossier {}: {}", dossier.id, e);
    }

    tracing::info!(
        "Dossier {} decided: {} (ABF consultation: {})",
        dossier.id,
        decision.determination.kind.as_code(),
        decision.abf_consultation_required
    );

    HttpResponse::Ok().json(decision)
}

/// POST /api/v1/dossiers/{id}/compliance
///
/// Uses the zone rules stored by the last decision. The parcel area falls
/// back to the dossier's cadastral parcel when the plan gives none.
async fn check_dossier_compliance(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    req: web::Json<DossierComplianceRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let mut dossier = match state.postgres.get_dossier(*id).await {
        Ok(dossier) => dossier,
        Err(e) => return store_error(e),
    };

    let report = match plan_compliance(&state.checker, &dossier, req.into_inner()) {
        Ok(report) => report,
        Err(response) => return response,
    };

    let expected = dossier.revision;
    dossier.apply(DossierUpdate::Compliance(report.clone()));
    if let Err(e) = state.postgres.save_dossier(&dossier, expected).await {
        return store_error(e);
    }

    HttpResponse::Ok().json(report)
}
