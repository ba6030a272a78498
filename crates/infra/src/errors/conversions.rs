//! Conversions from external infrastructure errors into domain errors.

use pdpsync_domain::PdpError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub PdpError);

impl From<InfraError> for PdpError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<PdpError> for InfraError {
    fn from(value: PdpError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoPdpError {
    fn into_pdp(self) -> PdpError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → PdpError */
/* -------------------------------------------------------------------------- */

impl IntoPdpError for SqlError {
    fn into_pdp(self) -> PdpError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => PdpError::Database("database is busy".into()),
                    (ErrorCode::DatabaseLocked, _) => {
                        PdpError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        PdpError::Database(format!("unique constraint violation: {message}"))
                    }
                    (ErrorCode::ConstraintViolation, 275) => {
                        PdpError::Validation(format!("check constraint violation: {message}"))
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        PdpError::Database("foreign key constraint violation".into())
                    }
                    _ => PdpError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => PdpError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                PdpError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                PdpError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => {
                PdpError::Config(format!("invalid database path: {}", path.to_string_lossy()))
            }
            other => PdpError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_pdp())
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(PdpError::Database(format!("connection pool: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → PdpError */
/* -------------------------------------------------------------------------- */

impl IntoPdpError for HttpError {
    fn into_pdp(self) -> PdpError {
        if self.is_timeout() {
            return PdpError::network("HTTP request timed out");
        }

        if self.is_connect() {
            return PdpError::network("HTTP connection failure");
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));
            return PdpError::Transport { status: code, message };
        }

        if self.is_decode() {
            return PdpError::Validation(format!("unexpected provider payload: {self}"));
        }

        PdpError::network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_pdp())
    }
}

/* -------------------------------------------------------------------------- */
/* serde / io → PdpError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(PdpError::Validation(format!("invalid JSON: {value}")))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(PdpError::Internal(format!("I/O failure: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
