//! HTTP API 路由配置

use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::web;

use super::auth;
use super::handlers;
use super::models::{
    ApiFailure, MSG_BODY_TOO_LARGE, MSG_FIELDS_REQUIRED, MSG_LOGIN_FIELDS_REQUIRED,
};

/// 请求体解析失败的响应
///
/// 超过大小上限 → 413；非 JSON / 字段类型不符 → 400，按缺少字段处理。
fn body_failure(err: &JsonPayloadError, message: &'static str) -> ApiFailure {
    match err {
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            ApiFailure::new(StatusCode::PAYLOAD_TOO_LARGE, MSG_BODY_TOO_LARGE)
        }
        _ => ApiFailure::new(StatusCode::BAD_REQUEST, message),
    }
}

fn json_config(message: &'static str) -> web::JsonConfig {
    web::JsonConfig::default().error_handler(move |err, _req| {
        log::warn!("Rejected request body: {}", err);
        body_failure(&err, message).into()
    })
}

/// 配置所有路由
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // 健康检查
        .route("/health", web::get().to(handlers::health_check))

        // 用户认证
        .service(
            web::scope("/api/auth")
                .service(
                    web::resource("/register")
                        .app_data(json_config(MSG_FIELDS_REQUIRED))
                        .route(web::post().to(auth::register)),
                )
                .service(
                    web::resource("/login")
                        .app_data(json_config(MSG_LOGIN_FIELDS_REQUIRED))
                        .route(web::post().to(auth::login)),
                )
                .route("/me", web::get().to(auth::current_user)),
        );
}
