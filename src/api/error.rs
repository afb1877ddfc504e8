use crate::application_port::*;
use crate::domain_port::RepoError;
use crate::logger::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use warp::http::StatusCode;
use warp::{Rejection, reject};

/// Every failure reaches the caller as `{ "message": ... }` plus a status code.
pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (status, message) = if let Some(code) = err.find::<ApiErrorCode>() {
        (code.status(), code.to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if err
        .find::<warp::filters::body::BodyDeserializeError>()
        .is_some()
    {
        (StatusCode::BAD_REQUEST, "Invalid request body".to_string())
    } else if err.find::<reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "Invalid query string".to_string())
    } else if err.find::<reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            "Request body too large".to_string(),
        )
    } else if err.find::<reject::LengthRequired>().is_some() {
        (
            StatusCode::LENGTH_REQUIRED,
            "Content-Length required".to_string(),
        )
    } else if err.find::<reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Unsupported media type".to_string(),
        )
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed".to_string(),
        )
    } else {
        warn!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorCode::InternalError.to_string(),
        )
    };

    let json = warp::reply::json(&ErrorBody { message });
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Coarse error taxonomy shared by every endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Authentication,
    Internal,
}

#[derive(Debug, Clone, Error)]
pub enum ApiErrorCode {
    #[error("Username and password are required")]
    MissingCredentials,
    #[error("Username must not exceed 64 characters")]
    UsernameTooLong,
    #[error("Username already exists")]
    UsernameTaken,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("No refresh token provided")]
    MissingRefreshToken,
    #[error("Invalid or expired refresh token")]
    InvalidRefreshToken,
    #[error("No token provided, authorization denied")]
    MissingToken,
    #[error("Token is not valid, authorization denied")]
    InvalidToken,
    #[error("Content cannot be empty")]
    EmptyContent,
    #[error("Post content must not exceed 200 characters")]
    ContentTooLong,
    #[error("You cannot follow yourself")]
    SelfFollow,
    #[error("User to follow not found")]
    UserNotFound,
    #[error("You are already following this user")]
    AlreadyFollowing,
    #[error("You are not following this user")]
    NotFollowing,
    #[error("Internal server error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn kind(&self) -> ErrorKind {
        use ApiErrorCode::*;
        match self {
            MissingCredentials | UsernameTooLong | EmptyContent | ContentTooLong
            | SelfFollow => ErrorKind::Validation,
            UsernameTaken | AlreadyFollowing => ErrorKind::Conflict,
            UserNotFound | NotFollowing => ErrorKind::NotFound,
            InvalidCredentials | MissingRefreshToken | InvalidRefreshToken | MissingToken
            | InvalidToken => ErrorKind::Authentication,
            InternalError => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match (self, self.kind()) {
            (ApiErrorCode::ContentTooLong, _) => StatusCode::UNPROCESSABLE_ENTITY,
            (_, ErrorKind::Validation) => StatusCode::BAD_REQUEST,
            (_, ErrorKind::Conflict) => StatusCode::CONFLICT,
            (_, ErrorKind::NotFound) => StatusCode::NOT_FOUND,
            (_, ErrorKind::Authentication) => StatusCode::UNAUTHORIZED,
            (_, ErrorKind::Internal) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::MissingCredentials => ApiErrorCode::MissingCredentials,
            AuthError::UsernameTooLong { .. } => ApiErrorCode::UsernameTooLong,
            AuthError::UsernameTaken => ApiErrorCode::UsernameTaken,
            AuthError::InvalidCredentials => ApiErrorCode::InvalidCredentials,
            AuthError::TokenInvalid => ApiErrorCode::InvalidToken,
            AuthError::Store(e) => ApiErrorCode::internal(e),
            AuthError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}

impl From<PostError> for ApiErrorCode {
    fn from(error: PostError) -> Self {
        match error {
            PostError::EmptyContent => ApiErrorCode::EmptyContent,
            PostError::ContentTooLong { .. } => ApiErrorCode::ContentTooLong,
            PostError::Store(e) => ApiErrorCode::internal(e),
        }
    }
}

impl From<FollowError> for ApiErrorCode {
    fn from(error: FollowError) -> Self {
        match error {
            FollowError::SelfFollow => ApiErrorCode::SelfFollow,
            FollowError::UserNotFound => ApiErrorCode::UserNotFound,
            FollowError::AlreadyFollowing => ApiErrorCode::AlreadyFollowing,
            FollowError::NotFollowing => ApiErrorCode::NotFollowing,
            FollowError::Store(e) => ApiErrorCode::internal(e),
        }
    }
}

impl From<RepoError> for ApiErrorCode {
    fn from(error: RepoError) -> Self {
        ApiErrorCode::internal(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        assert_eq!(ApiErrorCode::MissingCredentials.status(), 400);
        assert_eq!(ApiErrorCode::ContentTooLong.status(), 422);
        assert_eq!(ApiErrorCode::ContentTooLong.kind(), ErrorKind::Validation);
        assert_eq!(ApiErrorCode::UsernameTooLong.status(), 400);
        assert_eq!(ApiErrorCode::UsernameTaken.status(), 409);
        assert_eq!(ApiErrorCode::NotFollowing.status(), 404);
        assert_eq!(ApiErrorCode::InvalidRefreshToken.status(), 401);
        assert_eq!(ApiErrorCode::InternalError.status(), 500);
    }

    #[test]
    fn storage_failures_never_leak_details() {
        let code = ApiErrorCode::from(AuthError::Store("connection refused".into()));
        assert!(matches!(code, ApiErrorCode::InternalError));
        assert_eq!(code.to_string(), "Internal server error");
    }
}
