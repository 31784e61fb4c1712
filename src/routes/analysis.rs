use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use crate::errors::AppError;
use crate::models::{Analysis, NewsItem, Report};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analysis/:ticker", get(get_analysis))
        .route("/news/:ticker", get(get_news))
        .route("/report/:ticker", get(get_report))
}

async fn get_analysis(
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Analysis>, AppError> {
    info!("GET /api/analysis/{}", ticker);
    let analysis = state.dashboard.analyze(&ticker).await?;
    Ok(Json(analysis))
}

async fn get_news(
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<NewsItem>>, AppError> {
    info!("GET /api/news/{}", ticker);
    let news = state.dashboard.news(&ticker).await?;
    Ok(Json(news))
}

async fn get_report(
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Report>, AppError> {
    info!("GET /api/report/{}", ticker);
    let report = state.dashboard.report(&ticker).await?;
    Ok(Json(report))
}
