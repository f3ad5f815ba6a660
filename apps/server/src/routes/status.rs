use actix_web::{HttpResponse, Responder, get, web};

use super::models::StatusView;
use crate::state::AppState;

macros_utils::routes! {
    route list_statuses,
}

/// Reachability of every printer, without metadata
#[get("/status")]
pub async fn list_statuses(state: web::Data<AppState>) -> impl Responder {
    let statuses: Vec<StatusView> =
        state.status.list_statuses().await.into_iter().map(StatusView::from).collect();
    HttpResponse::Ok().json(statuses)
}
