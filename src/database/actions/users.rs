use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        jwt::generate_jwt_session,
    },
    config::Config,
    error::{NotFoundError, QueryError, ValidationError},
    pagination::{Page, PageRequest},
    schema::{NewUser, User, UserProfile, UserProfileRow, Uuid},
    validation::validate_new_user,
};

use potion::HtmlError;
use sqlx::{Pool, Postgres};

pub(crate) const PROFILE_COLUMNS: &str = "
    u.email, u.id, u.username, u.first_name, u.last_name,
    EXISTS (SELECT 1 FROM follows f WHERE f.user_id = $1 AND f.author_id = u.id) AS is_subscribed
";

pub async fn get_user(
    pool: &Pool<Postgres>,
    username: &str,
) -> Result<Option<User>, potion::Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn get_user_by_email(
    pool: &Pool<Postgres>,
    email: &str,
) -> Result<Option<User>, potion::Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
        .bind(email.trim())
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn get_user_by_id(
    pool: &Pool<Postgres>,
    user_id: Uuid,
) -> Result<Option<User>, potion::Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn user_exists(user_id: Uuid, pool: &Pool<Postgres>) -> Result<bool, potion::Error> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row.is_some())
}

/// Validates and stores a new account. The password is stored argon2-hashed.
pub async fn register_user(user: NewUser, pool: &Pool<Postgres>) -> Result<User, potion::Error> {
    validate_new_user(&user).map_err(|e| e.into())?;

    let taken: Option<(i32,)> = sqlx::query_as(
        "SELECT id FROM users WHERE username = $1 OR LOWER(email) = LOWER($2) LIMIT 1",
    )
    .bind(&user.username)
    .bind(user.email.trim())
    .fetch_optional(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if taken.is_some() {
        return Err(ValidationError::UserExists.into());
    }

    let password = hash_password(&user.password).map_err(|e| {
        log::error!("Failed to hash password: {e}");
        HtmlError::InternalServerError.new("Failed to store password")
    })?;

    let row: User = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
    ",
    )
    .bind(user.email.trim())
    .bind(&user.username)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(password)
    .fetch_one(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    log::info!("Registered user {} ({})", row.username, row.id);

    Ok(row)
}

pub async fn login_user(
    email: &str,
    password: &str,
    config: &Config,
    pool: &Pool<Postgres>,
) -> Result<String, potion::Error> {
    let user = match get_user_by_email(pool, email).await? {
        Some(user) => user,
        None => return Err(ValidationError::InvalidCredentials.into()),
    };

    let authenticated = verify_password(password, &user.password).map_err(|e| {
        log::error!("Stored password hash for user {} is unreadable: {e}", user.id);
        HtmlError::InternalServerError.default()
    })?;
    if !authenticated {
        return Err(ValidationError::InvalidCredentials.into());
    }

    generate_jwt_session(&user, config)
}

pub async fn set_password(
    user_id: Uuid,
    current_password: &str,
    new_password: &str,
    pool: &Pool<Postgres>,
) -> Result<(), potion::Error> {
    let user = match get_user_by_id(pool, user_id).await? {
        Some(user) => user,
        None => return Err(NotFoundError::user(user_id).into()),
    };

    let authenticated = verify_password(current_password, &user.password)
        .map_err(|_| HtmlError::InternalServerError.default())?;
    if !authenticated {
        return Err(ValidationError::InvalidCredentials.into());
    }
    if new_password.is_empty() {
        return Err(ValidationError::EmptyPassword.into());
    }

    let password = hash_password(new_password)
        .map_err(|_| HtmlError::InternalServerError.new("Failed to store password"))?;

    sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(password)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

/// `viewer` decides `is_subscribed`; anonymous viewers see `false`.
pub async fn get_user_profile(
    user_id: Uuid,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<UserProfile, potion::Error> {
    let row: Option<UserProfile> = sqlx::query_as(&format!(
        "SELECT {PROFILE_COLUMNS} FROM users u WHERE u.id = $2"
    ))
    .bind(viewer)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    row.ok_or_else(|| NotFoundError::user(user_id).into())
}

pub async fn list_users(
    page: &PageRequest,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<Page<UserProfile>, potion::Error> {
    let rows: Vec<UserProfileRow> = sqlx::query_as(&format!(
        "SELECT {PROFILE_COLUMNS}, COUNT(*) OVER() AS count FROM users u ORDER BY u.id DESC LIMIT $2 OFFSET $3"
    ))
    .bind(viewer)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.get(0).map(|r| r.count).unwrap_or(0);
    let rows = rows.into_iter().map(UserProfile::from).collect();

    Page::from_rows(rows, total_count, page).map_err(|e| e.into())
}
