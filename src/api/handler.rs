use super::cookie::RefreshCookiePolicy;
use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::{StatusCode, header};
use warp::{self, reject};

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: AccessToken,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn register(
    body: CredentialsRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let input = RegisterInput {
        username: body.username.unwrap_or_default(),
        password: body.password.unwrap_or_default(),
    };
    let user = auth_service
        .register(input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&user),
        StatusCode::CREATED,
    ))
}

pub async fn login(
    body: CredentialsRequest,
    auth_service: Arc<dyn AuthService>,
    cookie_policy: Arc<RefreshCookiePolicy>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let input = LoginInput {
        username: body.username.unwrap_or_default(),
        password: body.password.unwrap_or_default(),
    };
    let tokens = auth_service
        .login(input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let cookie = cookie_policy.header_value(&tokens.refresh_token);
    let response = TokenResponse {
        token: tokens.access_token,
    };
    Ok(warp::reply::with_header(
        warp::reply::json(&response),
        header::SET_COOKIE,
        cookie,
    ))
}

pub async fn refresh(
    refresh_cookie: Option<String>,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let refresh_token = refresh_cookie
        .filter(|c| !c.is_empty())
        .ok_or_else(|| reject::custom(ApiErrorCode::MissingRefreshToken))?;

    let token = auth_service
        .refresh_token(&refresh_token)
        .await
        .map_err(|e| match e {
            AuthError::TokenInvalid => ApiErrorCode::InvalidRefreshToken,
            other => ApiErrorCode::from(other),
        })
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&TokenResponse { token }))
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub content: Option<String>,
}

pub async fn create_post(
    body: CreatePostRequest,
    principal: Principal,
    post_service: Arc<dyn PostService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let content = body.content.unwrap_or_default();
    let post = post_service
        .create_post(principal.user_id, &content)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&post),
        StatusCode::CREATED,
    ))
}

/// Kept as raw strings so bad values fall back to defaults instead of rejecting.
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

pub async fn feed(
    query: FeedQuery,
    principal: Principal,
    post_service: Arc<dyn PostService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let page = PageRequest::from_raw(query.page.as_deref(), query.limit.as_deref());
    let feed = post_service
        .feed(principal.user_id, page)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&feed))
}

pub async fn follow(
    followee: UserId,
    principal: Principal,
    follow_service: Arc<dyn FollowService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let followee = follow_service
        .follow(principal.user_id, followee)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&MessageResponse {
        message: format!("You are now following user {}", followee.username),
    }))
}

pub async fn unfollow(
    followee: UserId,
    principal: Principal,
    follow_service: Arc<dyn FollowService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    follow_service
        .unfollow(principal.user_id, followee)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&MessageResponse {
        message: format!("You have unfollowed user {}", followee),
    }))
}

pub async fn following(
    principal: Principal,
    follow_service: Arc<dyn FollowService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let ids = follow_service
        .following(principal.user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ids))
}

pub async fn list_users(
    principal: Principal,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let users = user_service
        .list_users(principal.user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&users))
}
