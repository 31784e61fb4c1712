use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use crate::models::{CompanyEntry, CompanyQueryParams};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search_companies))
        .route("/sectors", get(list_sectors))
}

#[derive(Debug, Serialize)]
struct CompanySearchResponse {
    count: usize,
    companies: Vec<CompanyEntry>,
}

async fn search_companies(
    Query(params): Query<CompanyQueryParams>,
    State(state): State<AppState>,
) -> Json<CompanySearchResponse> {
    info!("GET /api/companies - sector: {:?}, q: {:?}", params.sector, params.q);
    let companies = state.dashboard.directory().search(&params);
    Json(CompanySearchResponse {
        count: companies.len(),
        companies,
    })
}

async fn list_sectors(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.dashboard.directory().sectors())
}
