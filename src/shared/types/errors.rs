use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failure as reported to callers.
///
/// Checkout records one of these per failed cart line; single-target
/// operations surface it through [`DomainError::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    MissingSchedule,
    ServiceUnavailable,
    Forbidden,
    InvalidTransition,
    PersistenceFailure,
    NotFound,
    Conflict,
    Unauthenticated,
    Validation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingSchedule => "MissingSchedule",
            Self::ServiceUnavailable => "ServiceUnavailable",
            Self::Forbidden => "Forbidden",
            Self::InvalidTransition => "InvalidTransition",
            Self::PersistenceFailure => "PersistenceFailure",
            Self::NotFound => "NotFound",
            Self::Conflict => "Conflict",
            Self::Unauthenticated => "Unauthenticated",
            Self::Validation => "Validation",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Date and time must both be selected: {0}")]
    MissingSchedule(String),

    #[error("Service not available: {0}")]
    ServiceUnavailable(String),

    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Cannot {action} a reservation that is {from}")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },

    #[error("Overlapping reservation: {0}")]
    Conflict(String),

    #[error("Not signed in")]
    Unauthenticated,

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::MissingSchedule(_) => ErrorKind::MissingSchedule,
            DomainError::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            DomainError::NotFound { .. } => ErrorKind::NotFound,
            DomainError::Forbidden(_) => ErrorKind::Forbidden,
            DomainError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            DomainError::Conflict(_) => ErrorKind::Conflict,
            DomainError::Unauthenticated => ErrorKind::Unauthenticated,
            DomainError::Validation(_) => ErrorKind::Validation,
            DomainError::Persistence(_) => ErrorKind::PersistenceFailure,
        }
    }

    pub fn reservation_not_found(id: impl ToString) -> Self {
        DomainError::NotFound {
            entity: "Reservation",
            field: "id",
            value: id.to_string(),
        }
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Persistence(format!("Database error: {}", e))
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Infra(#[from] InfraError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_error_maps_to_one_kind() {
        let cases = vec![
            (DomainError::MissingSchedule("date".into()), ErrorKind::MissingSchedule),
            (DomainError::ServiceUnavailable("Lawn Mowing".into()), ErrorKind::ServiceUnavailable),
            (DomainError::reservation_not_found("r-1"), ErrorKind::NotFound),
            (DomainError::Forbidden("not yours".into()), ErrorKind::Forbidden),
            (
                DomainError::InvalidTransition { from: "Completed", action: "cancel" },
                ErrorKind::InvalidTransition,
            ),
            (DomainError::Conflict("slot".into()), ErrorKind::Conflict),
            (DomainError::Unauthenticated, ErrorKind::Unauthenticated),
            (DomainError::Persistence("disk".into()), ErrorKind::PersistenceFailure),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "{}", err);
        }
    }

    #[test]
    fn db_errors_become_persistence_failures() {
        let err: DomainError = sea_orm::DbErr::Custom("boom".into()).into();
        assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn invalid_transition_message_names_state_and_action() {
        let err = DomainError::InvalidTransition { from: "Cancelled", action: "reschedule" };
        assert_eq!(err.to_string(), "Cannot reschedule a reservation that is Cancelled");
    }
}
