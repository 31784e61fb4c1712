use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::dashboard_service::DashboardService;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<DashboardService>,
    pub config: Arc<AppConfig>,
}
