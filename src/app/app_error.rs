use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use diesel::result::DatabaseErrorKind;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::{
    api::auth::AuthError,
    app::aliases::DieselError,
    domain::{UnknownVariant, status::TransitionError, validation::FieldError},
};

/// Envelope of every JSON response.
#[derive(Serialize, ToSchema, Debug)]
pub struct StdResponse<T, M> {
    pub data: Option<T>,
    pub message: Option<M>,
}

impl<T: Serialize, M: Serialize> IntoResponse for StdResponse<T, M> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Resource not found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("Validation failed")]
    Validation(Vec<FieldError>),
    #[error("Authentication required")]
    Unauthorized,
    #[error("{0}")]
    ForbiddenResource(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0} is unreachable")]
    ServiceUnreachable(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::ForbiddenResource(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        }

        let (data, message) = match self {
            AppError::Validation(errors) => (Some(errors), "Validation failed".to_string()),
            AppError::Other(err) => (None, format!("{err:#}")),
            other => (None, other.to_string()),
        };

        (
            status,
            Json(StdResponse {
                data,
                message: Some(message),
            }),
        )
            .into_response()
    }
}

impl From<DieselError> for AppError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => AppError::NotFound,
            DieselError::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation | DatabaseErrorKind::UniqueViolation,
                ref info,
            ) => {
                tracing::warn!(constraint = ?info.constraint_name(), "{}", info.message());
                AppError::Conflict("The record is in use or conflicts with an existing one".into())
            }
            _ => AppError::Other(err.into()),
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::Conflict(err.to_string())
    }
}

impl From<UnknownVariant> for AppError {
    fn from(err: UnknownVariant) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<Vec<FieldError>> for AppError {
    fn from(errors: Vec<FieldError>) -> Self {
        AppError::Validation(errors)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unreachable(_) => AppError::ServiceUnreachable("AuthService".into()),
            AuthError::Rejected { status, message } if status == StatusCode::UNAUTHORIZED => {
                tracing::debug!("Auth service rejected credentials: {message}");
                AppError::Unauthorized
            }
            AuthError::Rejected { message, .. } => AppError::BadRequest(message),
            AuthError::InvalidResponse(err) => AppError::Other(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::status::OrderStatus;

    #[test]
    fn errors_map_to_status_codes() {
        assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Validation(vec![]).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::ServiceUnreachable("AuthService".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn diesel_not_found_becomes_404() {
        let err: AppError = DieselError::NotFound.into();
        assert!(matches!(err, AppError::NotFound));
    }

    #[test]
    fn illegal_transitions_are_conflicts() {
        let err: AppError = TransitionError::Illegal {
            from: OrderStatus::Delivered,
            to: OrderStatus::PendingPayment,
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            err.to_string(),
            "Order cannot move from DELIVERED to PENDING_PAYMENT"
        );
    }

    #[test]
    fn responses_carry_the_status_code() {
        let response = AppError::BadRequest("bad".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::Other(anyhow::anyhow!("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn auth_rejections_map_by_status() {
        let err: AppError = AuthError::Rejected {
            status: StatusCode::UNAUTHORIZED,
            message: "invalid JWT".into(),
        }
        .into();
        assert!(matches!(err, AppError::Unauthorized));

        let err: AppError = AuthError::Rejected {
            status: StatusCode::BAD_REQUEST,
            message: "Invalid login credentials".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Invalid login credentials");
    }
}
