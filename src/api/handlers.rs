// API request handlers
// Author: Gabriel Demetrios Lafis

use actix_web::http::header::ContentDisposition;
use actix_web::{web, HttpResponse, Responder};
use log::info;

use crate::processing::{View, ViewRequest};
use super::{models::*, ApiError, AppState};

fn build_view(state: &AppState, request: &ViewRequest) -> Result<View, ApiError> {
    let report = state.cache.get_or_load(&state.source, &state.loader)?;
    Ok(View::build(&report, request)?)
}

/// Filter and sort the source table
pub async fn view_table(
    state: web::Data<AppState>,
    payload: web::Json<ViewRequest>,
) -> Result<impl Responder, ApiError> {
    let view = build_view(&state, &payload)?;

    Ok(HttpResponse::Ok().json(ViewResponse::from_view(&view)))
}

/// Filter and sort the source table, then return it as a spreadsheet
pub async fn export_table(
    state: web::Data<AppState>,
    payload: web::Json<ViewRequest>,
) -> Result<impl Responder, ApiError> {
    let view = build_view(&state, &payload)?;
    let artifact = view.export(&state.encoder, &state.file_name)?;

    if !artifact.offer_download() {
        return Ok(HttpResponse::NoContent().finish());
    }

    info!("Exporting {} rows as '{}'", artifact.rows, artifact.file_name);

    Ok(HttpResponse::Ok()
        .content_type(artifact.mime_type)
        .insert_header(ContentDisposition::attachment(artifact.file_name))
        .body(artifact.bytes))
}

/// Drop the cached copy of the source so the next request reads it again
pub async fn reload_source(state: web::Data<AppState>) -> Result<impl Responder, ApiError> {
    let invalidated = state.cache.invalidate(&state.source)?;

    Ok(HttpResponse::Ok().json(ReloadResponse {
        source: state.source.display().to_string(),
        invalidated,
    }))
}
