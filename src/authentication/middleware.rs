use std::sync::Arc;

use warp::{
    reject::{self, Rejection},
    Filter,
};

use crate::constants::{SESSION_COOKIE, TOKEN_PREFIX};

use super::jwt::{verify_jwt_session, SessionData};

#[derive(Debug)]
struct Unauthorized;

impl reject::Reject for Unauthorized {}

/// `Authorization: Token <jwt>` wins over the `session` cookie.
fn pick_token(header: Option<String>, cookie: Option<String>) -> Option<String> {
    header
        .and_then(|value| value.strip_prefix(TOKEN_PREFIX).map(|t| t.trim().to_owned()))
        .or(cookie)
        .filter(|token| !token.is_empty())
}

fn resolve_session(token: Option<String>, secret: &str) -> Option<SessionData> {
    let token = token?;
    match verify_jwt_session(&token, secret) {
        Ok(data) => Some(data.into()),
        Err(_) => {
            log::trace!("> Rejected session token");
            None
        }
    }
}

fn with_token() -> impl Filter<Extract = (Option<String>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(warp::cookie::optional::<String>(SESSION_COOKIE))
        .map(pick_token)
}

pub fn with_session(
    secret: Arc<str>,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    with_token().and_then(move |token: Option<String>| {
        let secret = secret.clone();
        async move {
            match resolve_session(token, &secret) {
                Some(session) => Ok(session),
                None => Err(warp::reject::custom(Unauthorized)),
            }
        }
    })
}

/// Anonymous requests pass through as `None`.
pub fn with_possible_session(
    secret: Arc<str>,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    with_token().map(move |token: Option<String>| resolve_session(token, &secret))
}
