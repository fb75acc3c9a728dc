use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;

use serde_json::json;

/// SQLSTATE reported by PostgreSQL for a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

pub async fn handler404(path: Uri) -> Error {
    Error::NotFound {
        message: format!("Invalid path: {}", path),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Validation { message: String },
    NotFound { message: String },
    Conflict { message: String },
    Unauthorized { message: String },
    Storage { message: String },
}

impl Error {
    pub fn validation<S: Into<String>>(msg: S) -> Error {
        Error::Validation {
            message: msg.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "ValidationError",
            Error::NotFound { .. } => "NotFoundError",
            Error::Conflict { .. } => "ConflictError",
            Error::Unauthorized { .. } => "Unauthorized",
            Error::Storage { .. } => "StorageError",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Error::Validation { message }
            | Error::NotFound { message }
            | Error::Conflict { message }
            | Error::Unauthorized { message }
            | Error::Storage { message } => message,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Error::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind(), self.message())
    }
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message(),
            "kind": self.kind(),
        }));
        (self.status(), body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return Self::Conflict {
                    message: db.message().to_string(),
                };
            }
        }
        log::error!("storage operation failed: {}", err);
        Self::Storage {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_failures_become_storage_errors() {
        let err = Error::from(sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), "StorageError");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn taxonomy_maps_to_http_statuses() {
        assert_eq!(Error::validation("x").status(), StatusCode::BAD_REQUEST);
        let conflict = Error::Conflict {
            message: "dup".into(),
        };
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
        assert_eq!(conflict.to_string(), "ConflictError: dup");
    }

    #[tokio::test]
    async fn unknown_paths_are_not_found() {
        let err = handler404("/nowhere".parse().unwrap()).await;
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "Invalid path: /nowhere");
    }
}
