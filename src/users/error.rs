use thiserror::Error;

/// A label outside of a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a valid {kind}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Error)]
pub enum UserRepoError {
    #[error("duplicate value violates unique constraint {}", .constraint.as_deref().unwrap_or("<unknown>"))]
    Duplicate { constraint: Option<String> },
    #[error("invalid value rejected by storage: {0}")]
    InvalidValue(String),
    #[error("user not found")]
    NotFound,
    #[error("database error")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for UserRepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            match db.code().as_deref() {
                // unique_violation
                Some("23505") => {
                    return Self::Duplicate {
                        constraint: db.constraint().map(str::to_owned),
                    }
                }
                // invalid_text_representation (bad enum label), check_violation
                Some("22P02") | Some("23514") => {
                    return Self::InvalidValue(db.message().to_string())
                }
                _ => {}
            }
        }
        Self::Database(err)
    }
}
