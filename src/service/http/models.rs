//! HTTP API 请求/响应模型

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::user::AccountProfile;
use crate::DeskError;

// ==================== 响应文案 ====================

pub const MSG_REGISTERED: &str = "User registered successfully";
pub const MSG_FIELDS_REQUIRED: &str = "All fields are required";
pub const MSG_EMAIL_EXISTS: &str = "User with this email already exists";
pub const MSG_DB_CONNECTION_FAILED: &str =
    "Server configuration error: Database connection failed. Please contact support.";
pub const MSG_REGISTRATION_DB_ERROR: &str = "A database error occurred during registration.";
pub const MSG_UNEXPECTED: &str = "An unexpected error occurred. Please try again later.";
pub const MSG_BODY_TOO_LARGE: &str = "Request body too large";

pub const MSG_LOGIN_OK: &str = "Login successful";
pub const MSG_LOGIN_FIELDS_REQUIRED: &str = "Email and password are required";
pub const MSG_INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const MSG_INVALID_SESSION: &str = "Invalid or expired session";
pub const MSG_USER_NOT_FOUND: &str = "User not found";
pub const MSG_DB_ERROR: &str = "A database error occurred. Please try again later.";

/// 通用消息响应 `{ "message": ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 登录响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: AccountProfile,
}

/// 各接口的差异化文案
struct FailureMessages {
    validation: &'static str,
    store: &'static str,
}

const REGISTRATION: FailureMessages = FailureMessages {
    validation: MSG_FIELDS_REQUIRED,
    store: MSG_REGISTRATION_DB_ERROR,
};

const LOGIN: FailureMessages = FailureMessages {
    validation: MSG_LOGIN_FIELDS_REQUIRED,
    store: MSG_DB_ERROR,
};

const SESSION: FailureMessages = FailureMessages {
    validation: MSG_INVALID_SESSION,
    store: MSG_DB_ERROR,
};

/// 返回给调用方的失败响应
///
/// 只携带状态码和固定文案，内部错误细节在构造时写入日志。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    status: StatusCode,
    message: &'static str,
}

impl ApiFailure {
    pub fn new(status: StatusCode, message: &'static str) -> Self {
        Self { status, message }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    /// 注册接口的错误映射
    pub fn registration(err: DeskError) -> Self {
        Self::map(err, &REGISTRATION, "registration")
    }

    /// 登录接口的错误映射
    pub fn login(err: DeskError) -> Self {
        Self::map(err, &LOGIN, "login")
    }

    /// 会话查询接口的错误映射
    pub fn session(err: DeskError) -> Self {
        Self::map(err, &SESSION, "session")
    }

    fn map(err: DeskError, messages: &FailureMessages, operation: &str) -> Self {
        let failure = match &err {
            DeskError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, messages.validation),
            DeskError::Conflict(_) => Self::new(StatusCode::CONFLICT, MSG_EMAIL_EXISTS),
            DeskError::InvalidCredentials => {
                Self::new(StatusCode::UNAUTHORIZED, MSG_INVALID_CREDENTIALS)
            }
            DeskError::Unauthorized(_) => Self::new(StatusCode::UNAUTHORIZED, MSG_INVALID_SESSION),
            DeskError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, MSG_USER_NOT_FOUND),
            DeskError::StoreUnavailable(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, MSG_DB_CONNECTION_FAILED)
            }
            DeskError::Store(_) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, messages.store),
            DeskError::Config(_) | DeskError::Internal(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, MSG_UNEXPECTED)
            }
        };

        if failure.status.is_server_error() {
            log::error!("{} failed: {}", operation, err);
        } else {
            log::warn!("{} rejected: {}", operation, err);
        }

        failure
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.message)
    }
}

impl ResponseError for ApiFailure {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(MessageResponse::new(self.message))
    }
}
