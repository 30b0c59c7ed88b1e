use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use potion::HtmlError;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::config::Config;
use crate::constants::MAX_JWT_LIFETIME_HOURS;
use crate::database::schema::User;
use crate::schema::UserRole;

use super::permissions::ActionType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: i32,
    pub username: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: i32, username: String, role: UserRole, lifetime_hours: i64) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let lifetime_hours =
            lifetime_hours.clamp(-MAX_JWT_LIFETIME_HOURS, MAX_JWT_LIFETIME_HOURS);
        let exp = (now + Duration::hours(lifetime_hours)).timestamp();

        Self {
            user_id: id,
            username,
            role,
            iat,
            exp,
        }
    }

    pub fn expires_at(&self) -> i64 {
        self.exp
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub user_id: i32,
    pub username: String,
    pub role: UserRole,
    pub is_admin: bool,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), potion::Error> {
        if !action.authenticate(&self) {
            return Err(
                HtmlError::Unauthorized.new("You don't have permission to perform this action")
            );
        }
        Ok(())
    }
}

impl Into<SessionData> for JwtSessionData {
    fn into(self) -> SessionData {
        SessionData {
            username: self.username,
            user_id: self.user_id,
            is_admin: self.role == UserRole::Admin,
            role: self.role,
        }
    }
}

fn signing_key(secret: &str) -> Result<Hmac<Sha256>, potion::Error> {
    Hmac::new_from_slice(secret.as_bytes())
        .map_err(|_| HtmlError::InternalServerError.new("Invalid session key"))
}

pub fn generate_jwt_session(user: &User, config: &Config) -> Result<String, potion::Error> {
    let key = signing_key(&config.jwt_secret)?;
    let claims = JwtSessionData::new(
        user.id,
        user.username.to_owned(),
        user.role.to_owned(),
        config.jwt_lifetime_hours,
    );

    claims.sign_with_key(&key).map_err(|e| {
        log::error!("Failed to sign session: {e}");
        HtmlError::InternalServerError.new("Failed to create session")
    })
}

pub fn verify_jwt_session(token: &str, secret: &str) -> Result<JwtSessionData, potion::Error> {
    let key = signing_key(secret)?;

    token
        .verify_with_key(&key)
        .map_err(|_| HtmlError::InvalidSession.new("Invalid Session; Invalid token"))
        .map(|session: JwtSessionData| {
            let now = Local::now().timestamp();

            if (session.exp - now).is_negative() {
                return Err(HtmlError::InvalidSession.new("Invalid session; Token expired"));
            }
            return Ok(session);
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(lifetime_hours: i64) -> Config {
        Config {
            database_url: "postgres://localhost/recipes".to_owned(),
            database_max_connections: 1,
            jwt_secret: "kitchen-secret".to_owned(),
            jwt_lifetime_hours: lifetime_hours,
            page_size: 6,
        }
    }

    fn user() -> User {
        User {
            id: 42,
            email: "chef@example.com".to_owned(),
            username: "chef".to_owned(),
            first_name: String::new(),
            last_name: String::new(),
            password: String::new(),
            role: UserRole::Admin,
        }
    }

    #[test]
    fn issued_token_verifies_with_the_same_secret() {
        let token = generate_jwt_session(&user(), &config(1)).ok().unwrap();
        let session: SessionData = verify_jwt_session(&token, "kitchen-secret")
            .ok()
            .unwrap()
            .into();

        assert_eq!(session.user_id, 42);
        assert_eq!(session.username, "chef");
        assert!(session.is_admin);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_jwt_session(&user(), &config(1)).ok().unwrap();

        assert!(verify_jwt_session(&token, "another-secret").is_err());
        assert!(verify_jwt_session("garbage", "kitchen-secret").is_err());
    }

    #[test]
    fn huge_lifetime_is_capped() {
        let claims = JwtSessionData::new(1, "chef".to_owned(), UserRole::User, i64::MAX);
        let capped =
            JwtSessionData::new(1, "chef".to_owned(), UserRole::User, MAX_JWT_LIFETIME_HOURS);

        assert!(claims.expires_at() - capped.expires_at() <= 1);
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = generate_jwt_session(&user(), &config(-1)).ok().unwrap();

        assert!(verify_jwt_session(&token, "kitchen-secret").is_err());
    }
}
