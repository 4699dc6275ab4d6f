use argon2::Error as Argon2Error;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use mongodb::error::Error as DbError;
use rocket::{http::Status, response::Responder};
use thiserror::Error;

use crate::model::{common::Credential, mongodb::Id};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Voting is not open on topic {0}")]
    VotingClosed(Id),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Credential {credential} already voted on topic {topic_id}")]
    AlreadyVoted { topic_id: Id, credential: Credential },
    #[error("Invalid choice: {0}")]
    InvalidChoice(String),
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::NotFound(_) => Status::NotFound,
            Self::VotingClosed(_) => Status::Forbidden,
            Self::Unauthorized(_) => Status::Unauthorized,
            Self::AlreadyVoted { .. } => Status::Conflict,
            Self::InvalidChoice(_) | Self::InvalidStatus(_) => Status::UnprocessableEntity,
            Self::BadRequest(_) => Status::BadRequest,
            Self::Db(_) => Status::InternalServerError,
            Self::Jwt(err) => match err.kind() {
                JwtErrorKind::ExpiredSignature | JwtErrorKind::ImmatureSignature => {
                    Status::Unauthorized
                }
                _ => Status::BadRequest,
            },
            Self::Argon2(_) => Status::InternalServerError,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        if status.code >= 500 {
            error!("{self}");
        } else {
            warn!("{self}");
        }
        Err(status)
    }
}
