use super::cookie::REFRESH_COOKIE;
use super::error::*;
use super::handler;
use crate::application_port::AuthService;
use crate::domain_model::{Principal, UserId};
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, reject};

const MAX_BODY_BYTES: u64 = 16 * 1024;

/// All endpoints under `/api`, with rejections rendered as `{ "message": ... }`.
pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    warp::path("api")
        .and(endpoints(server))
        .recover(recover_error)
}

fn endpoints(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let register = warp::path("register")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::register);

    let login = warp::path("login")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and(with(server.cookie_policy.clone()))
        .and_then(handler::login);

    let refresh = warp::path("refresh")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::cookie::optional::<String>(REFRESH_COOKIE))
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh);

    let create_post = warp::path("posts")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.post_service.clone()))
        .and_then(handler::create_post);

    let feed = warp::path("feed")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<handler::FeedQuery>())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.post_service.clone()))
        .and_then(handler::feed);

    let follow = warp::path!("follow" / UserId)
        .and(warp::post())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.follow_service.clone()))
        .and_then(handler::follow);

    let unfollow = warp::path!("follow" / UserId)
        .and(warp::delete())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.follow_service.clone()))
        .and_then(handler::unfollow);

    let following = warp::path("following")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.follow_service.clone()))
        .and_then(handler::following);

    let users = warp::path("users")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.user_service.clone()))
        .and_then(handler::list_users);

    register
        .or(login)
        .or(refresh)
        .or(create_post)
        .or(feed)
        .or(follow)
        .or(unfollow)
        .or(following)
        .or(users)
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_verification(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (Principal,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(
        move |header: Option<String>| {
            let auth_service = auth_service.clone();
            async move {
                let header = header.ok_or_else(|| reject::custom(ApiErrorCode::MissingToken))?;
                let token = header
                    .strip_prefix("Bearer ")
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| reject::custom(ApiErrorCode::InvalidToken))?;
                let principal = auth_service
                    .verify_token(token)
                    .await
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)?;
                Ok::<_, warp::Rejection>(principal)
            }
        },
    )
}
