//! HTTP API 请求处理器

use actix_web::HttpResponse;
use std::sync::Arc;

use crate::user::UserManager;

/// 应用状态
pub struct AppState {
    pub user_mgr: Arc<UserManager>,
}

impl AppState {
    pub fn new(user_mgr: Arc<UserManager>) -> Arc<Self> {
        Arc::new(Self { user_mgr })
    }
}

/// 健康检查
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "salesdesk"
    }))
}
