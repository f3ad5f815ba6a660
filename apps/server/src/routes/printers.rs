use actix_web::{HttpResponse, delete, get, post, put, web};
use printwatch_monitor::{RegistryError, Target, TargetId};
use serde_json::json;
use tracing::{info, warn};

use super::models::{PrinterRequest, PrinterView};
use crate::error::ApiError;
use crate::state::AppState;

macros_utils::routes! {
    route list_printers,
    route create_printer,
    route update_printer,
    route delete_printer,
}

#[get("/printers")]
pub async fn list_printers(state: web::Data<AppState>) -> HttpResponse {
    let printers: Vec<PrinterView> =
        state.status.list_targets().await.into_iter().map(PrinterView::from).collect();
    HttpResponse::Ok().json(printers)
}

/// Persist a printer, start monitoring it and request a scan
#[post("/printers")]
pub async fn create_printer(
    state: web::Data<AppState>,
    body: web::Json<PrinterRequest>,
) -> Result<HttpResponse, ApiError> {
    let metadata = body.into_inner().validate()?;
    let _write = state.write_lock().await;
    let id = state.store.create_target(&metadata).await?;
    let target = Target::new(id, metadata);

    if let Err(e) = state.registry.add(target.clone()).await {
        warn!(target_id = id, "Stored printer could not be monitored: {}", e);
    }
    state.scans.scan_now();
    info!(target_id = id, address = %target.address(), "Printer added");

    Ok(HttpResponse::Created().json(PrinterView::from(target)))
}

#[put("/printers/{id}")]
pub async fn update_printer(
    state: web::Data<AppState>,
    path: web::Path<TargetId>,
    body: web::Json<PrinterRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let metadata = body.into_inner().validate()?;
    let _write = state.write_lock().await;

    if !state.store.update_target(id, &metadata).await? {
        return Err(ApiError::NotFound(id));
    }

    let previous = state.registry.get(id).await;
    let moved = previous.as_ref().is_none_or(|t| t.address() != metadata.address);

    match state.registry.update_metadata(id, metadata.clone()).await {
        Ok(()) => {}
        Err(RegistryError::NotFound(_)) => {
            if let Err(e) = state.registry.add(Target::new(id, metadata)).await {
                warn!(target_id = id, "Updated printer could not be monitored: {}", e);
            }
        }
        Err(e) => warn!(target_id = id, "Registry rejected update: {}", e),
    }

    // The cached status belongs to the old address
    if moved {
        state.scans.scan_now();
    }

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[delete("/printers/{id}")]
pub async fn delete_printer(
    state: web::Data<AppState>,
    path: web::Path<TargetId>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let _write = state.write_lock().await;

    if !state.store.delete_target(id).await? {
        return Err(ApiError::NotFound(id));
    }

    let removed = state.registry.remove(id).await.is_some();
    state.scans.scan_now();
    info!(target_id = id, in_registry = removed, "Printer deleted");

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
