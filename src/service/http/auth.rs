//! 用户认证 HTTP API
//!
//! 提供用户注册、登录、当前用户查询

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use std::sync::Arc;

use super::handlers::AppState;
use super::models::{ApiFailure, LoginResponse, MessageResponse, MSG_LOGIN_OK, MSG_REGISTERED};
use crate::user::{LoginRequest, RegisterRequest};
use crate::DeskError;

/// 用户注册
pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<Arc<AppState>>,
) -> Result<HttpResponse, ApiFailure> {
    let account = state
        .user_mgr
        .register(req.into_inner())
        .await
        .map_err(ApiFailure::registration)?;

    log::debug!("Registration response for {}", account.id);

    // 不返回账户记录，避免泄露哈希
    Ok(HttpResponse::Created().json(MessageResponse::new(MSG_REGISTERED)))
}

/// 用户登录
pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<Arc<AppState>>,
) -> Result<HttpResponse, ApiFailure> {
    let session = state
        .user_mgr
        .login(req.into_inner())
        .await
        .map_err(ApiFailure::login)?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        message: MSG_LOGIN_OK.to_string(),
        token: session.token,
        user: session.user,
    }))
}

/// 获取当前用户信息 (Authorization: Bearer <token>)
pub async fn current_user(
    req: HttpRequest,
    state: web::Data<Arc<AppState>>,
) -> Result<HttpResponse, ApiFailure> {
    let token = bearer_token(&req).ok_or_else(|| {
        ApiFailure::session(DeskError::Unauthorized(
            "missing bearer token".to_string(),
        ))
    })?;

    let profile = state
        .user_mgr
        .current_account(token)
        .await
        .map_err(ApiFailure::session)?;

    Ok(HttpResponse::Ok().json(profile))
}

/// 从 Authorization 头取出 Bearer token
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_token() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc.def.ghi"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("abc.def.ghi"));

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "bearer  xyz "))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("xyz"));

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic dXNlcjpwdw=="))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);

        let req = TestRequest::default().to_http_request();
        assert_eq!(bearer_token(&req), None);
    }
}
