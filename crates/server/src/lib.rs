use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use engine::{EngineError, FieldErrors, NON_FIELD_ERRORS};

use serde::Serialize;
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod accounts;
mod budgets;
mod categories;
mod server;

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Validation(_) | EngineError::InvalidCredentials => StatusCode::BAD_REQUEST,
        EngineError::Unauthenticated => StatusCode::UNAUTHORIZED,
        EngineError::Password(_) | EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn engine_error_response(err: EngineError) -> axum::response::Response {
    let status = status_for_engine_error(&err);
    match err {
        EngineError::Validation(errors) => (status, Json(errors)).into_response(),
        EngineError::InvalidCredentials => {
            let errors = FieldErrors::single(NON_FIELD_ERRORS, err.to_string());
            (status, Json(errors)).into_response()
        }
        EngineError::Unauthenticated => (
            status,
            [(header::WWW_AUTHENTICATE, HeaderValue::from_static("Token"))],
            Json(Error {
                error: err.to_string(),
            }),
        )
            .into_response(),
        EngineError::Password(_) | EngineError::Database(_) => {
            tracing::error!("internal error: {err}");
            let error = "internal server error".to_string();
            (status, Json(Error { error })).into_response()
        }
        EngineError::KeyNotFound(_) => (
            status,
            Json(Error {
                error: err.to_string(),
            }),
        )
            .into_response(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ServerError::Engine(err) => engine_error_response(err),
            ServerError::Generic(error) => {
                (StatusCode::BAD_REQUEST, Json(Error { error })).into_response()
            }
        }
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_validation_maps_to_400() {
        let errors = FieldErrors::single("name", "This field is required.");
        let res = ServerError::from(EngineError::Validation(errors)).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn bad_credentials_map_to_400() {
        let res = ServerError::from(EngineError::InvalidCredentials).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unauthenticated_maps_to_401_with_challenge() {
        let res = ServerError::from(EngineError::Unauthenticated).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            res.headers().get(header::WWW_AUTHENTICATE),
            Some(&HeaderValue::from_static("Token"))
        );
    }

    #[test]
    fn database_error_maps_to_500() {
        let err = EngineError::Database(sea_orm::DbErr::Custom("boom".to_string()));
        let res = ServerError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
