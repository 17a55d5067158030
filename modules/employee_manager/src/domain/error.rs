use thiserror::Error;

/// A single failed input rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// camelCase wire name of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation failed: {}", summarize(.errors))]
    Validation { errors: Vec<FieldViolation> },

    #[error("{message}")]
    InvalidArgument { message: String },

    #[error("{message}")]
    InvalidOperation { message: String },

    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

fn summarize(errors: &[FieldViolation]) -> String {
    errors
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl DomainError {
    pub fn validation(errors: Vec<FieldViolation>) -> Self {
        Self::Validation { errors }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    pub fn employee_not_found(id: i32) -> Self {
        Self::NotFound {
            entity: "Employee",
            key: format!("with ID {id}"),
        }
    }

    pub fn department_not_found(id: i32) -> Self {
        Self::NotFound {
            entity: "Department",
            key: format!("with ID {id}"),
        }
    }

    pub fn department_name_not_found(name: &str) -> Self {
        Self::NotFound {
            entity: "Department",
            key: format!("with name '{name}'"),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

/// Log a repository failure and hide its details from callers.
pub(crate) fn storage_error(err: anyhow::Error) -> DomainError {
    tracing::error!(error = ?err, "employee store failure");
    DomainError::database(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_caller_friendly() {
        assert_eq!(
            DomainError::employee_not_found(42).to_string(),
            "Employee with ID 42 not found"
        );
        assert_eq!(
            DomainError::department_name_not_found("Legal").to_string(),
            "Department with name 'Legal' not found"
        );
        let err = DomainError::validation(vec![
            FieldViolation::new("salary", "too low"),
            FieldViolation::new("fullName", "blank"),
        ]);
        assert_eq!(err.to_string(), "Validation failed: salary: too low; fullName: blank");
    }
}
