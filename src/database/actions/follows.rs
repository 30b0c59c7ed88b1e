use crate::{
    error::{NotFoundError, QueryError, ValidationError},
    jwt::SessionData,
    pagination::{Page, PageRequest},
    permissions::ActionType,
    schema::{RecipeSummary, Subscription, UserProfile, UserProfileRow, Uuid},
    validation::{validate_follow, validate_recipes_limit},
};

use super::users::{get_user_profile, user_exists, PROFILE_COLUMNS};

use sqlx::{Pool, Postgres};

/// Newest recipes of `author_id`, at most `recipes_limit` (all when `None`), plus the total.
pub async fn author_recipes(
    author_id: Uuid,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<(Vec<RecipeSummary>, i64), potion::Error> {
    validate_recipes_limit(recipes_limit).map_err(|e| e.into())?;

    let recipes: Vec<RecipeSummary> = sqlx::query_as(
        "
        SELECT id, name, image, cooking_time
        FROM recipes
        WHERE author_id = $1
        ORDER BY pub_date DESC, id DESC
        LIMIT $2
    ",
    )
    .bind(author_id)
    .bind(recipes_limit)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok((recipes, count.0))
}

async fn into_subscription(
    author: UserProfile,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Subscription, potion::Error> {
    let (recipes, recipes_count) = author_recipes(author.id, recipes_limit, pool).await?;

    Ok(Subscription {
        author,
        recipes,
        recipes_count,
    })
}

pub async fn subscribe(
    author_id: Uuid,
    recipes_limit: Option<i64>,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Subscription, potion::Error> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;
    validate_recipes_limit(recipes_limit).map_err(|e| e.into())?;
    if !user_exists(author_id, pool).await? {
        return Err(NotFoundError::user(author_id).into());
    }
    validate_follow(session.user_id, author_id).map_err(|e| e.into())?;

    let existing: Option<(i32,)> =
        sqlx::query_as("SELECT id FROM follows WHERE user_id = $1 AND author_id = $2")
            .bind(session.user_id)
            .bind(author_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;
    if existing.is_some() {
        return Err(ValidationError::AlreadySubscribed.into());
    }

    sqlx::query("INSERT INTO follows (user_id, author_id) VALUES ($1, $2)")
        .bind(session.user_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    log::debug!("User {} subscribed to {}", session.user_id, author_id);

    let author = get_user_profile(author_id, Some(session.user_id), pool).await?;
    into_subscription(author, recipes_limit, pool).await
}

pub async fn unsubscribe(
    author_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), potion::Error> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;
    if !user_exists(author_id, pool).await? {
        return Err(NotFoundError::user(author_id).into());
    }

    let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
        .bind(session.user_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() == 0 {
        return Err(NotFoundError::not_subscribed(author_id).into());
    }

    Ok(())
}

/// Authors the session follows, most recently followed first.
pub async fn list_subscriptions(
    session: &SessionData,
    page: &PageRequest,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Page<Subscription>, potion::Error> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;
    validate_recipes_limit(recipes_limit).map_err(|e| e.into())?;

    let rows: Vec<UserProfileRow> = sqlx::query_as(&format!(
        "
        SELECT {PROFILE_COLUMNS}, COUNT(*) OVER() AS count
        FROM follows fo
        INNER JOIN users u ON u.id = fo.author_id
        WHERE fo.user_id = $1
        ORDER BY fo.id DESC
        LIMIT $2 OFFSET $3
    "
    ))
    .bind(session.user_id)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.get(0).map(|r| r.count).unwrap_or(0);

    let mut subscriptions = Vec::with_capacity(rows.len());
    for row in rows {
        subscriptions.push(into_subscription(row.into(), recipes_limit, pool).await?);
    }

    Page::from_rows(subscriptions, total_count, page).map_err(|e| e.into())
}
