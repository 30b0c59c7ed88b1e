use crate::{
    error::{NotFoundError, QueryError, ValidationError},
    jwt::SessionData,
    pagination::{Page, PageRequest},
    permissions::ActionType,
    schema::{RecipeCollection, RecipeSummary, Uuid},
};

use sqlx::{Pool, Postgres};

#[derive(sqlx::FromRow)]
struct RecipeSummaryRow {
    #[sqlx(flatten)]
    summary: RecipeSummary,
    count: i64,
}

async fn get_recipe_summary(
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<RecipeSummary, potion::Error> {
    let row: Option<RecipeSummary> = sqlx::query_as(
        "SELECT id, name, image, cooking_time FROM recipes WHERE id = $1",
    )
    .bind(recipe_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    row.ok_or_else(|| NotFoundError::recipe(recipe_id).into())
}

pub async fn is_in_collection(
    collection: RecipeCollection,
    user_id: Uuid,
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, potion::Error> {
    let row: (bool,) = sqlx::query_as(&format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE user_id = $1 AND recipe_id = $2)",
        collection.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .fetch_one(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(row.0)
}

/// `(is_favorited, is_in_shopping_cart)` for `viewer`; both `false` when anonymous.
pub async fn recipe_flags(
    recipe_id: Uuid,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<(bool, bool), potion::Error> {
    let viewer = match viewer {
        Some(viewer) => viewer,
        None => return Ok((false, false)),
    };

    let flags: (bool, bool) = sqlx::query_as(
        "
        SELECT
            EXISTS (SELECT 1 FROM favorites WHERE user_id = $1 AND recipe_id = $2),
            EXISTS (SELECT 1 FROM shopping_cart WHERE user_id = $1 AND recipe_id = $2)
    ",
    )
    .bind(viewer)
    .bind(recipe_id)
    .fetch_one(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(flags)
}

/// Adding twice is rejected. A concurrent duplicate that slips past the
/// check hits the unique constraint and comes back as a conflict.
pub async fn add_to_collection(
    collection: RecipeCollection,
    recipe_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<RecipeSummary, potion::Error> {
    session.authenticate(ActionType::ManageOwnCollections)?;
    let recipe = get_recipe_summary(recipe_id, pool).await?;

    if is_in_collection(collection, session.user_id, recipe_id, pool).await? {
        return Err(ValidationError::AlreadyInCollection(collection.label()).into());
    }

    sqlx::query(&format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2)",
        collection.table()
    ))
    .bind(session.user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    log::debug!(
        "User {} added recipe {} to {}",
        session.user_id,
        recipe_id,
        collection.label()
    );

    Ok(recipe)
}

pub async fn remove_from_collection(
    collection: RecipeCollection,
    recipe_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), potion::Error> {
    session.authenticate(ActionType::ManageOwnCollections)?;
    get_recipe_summary(recipe_id, pool).await?;

    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
        collection.table()
    ))
    .bind(session.user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() == 0 {
        return Err(NotFoundError::already_removed(collection.label()).into());
    }

    Ok(())
}

/// Most recently added first.
pub async fn list_collection_recipes(
    collection: RecipeCollection,
    user_id: Uuid,
    page: &PageRequest,
    pool: &Pool<Postgres>,
) -> Result<Page<RecipeSummary>, potion::Error> {
    let rows: Vec<RecipeSummaryRow> = sqlx::query_as(&format!(
        "
        SELECT r.id, r.name, r.image, r.cooking_time, COUNT(*) OVER() AS count
        FROM {} c
        INNER JOIN recipes r ON r.id = c.recipe_id
        WHERE c.user_id = $1
        ORDER BY c.id DESC
        LIMIT $2 OFFSET $3
    ",
        collection.table()
    ))
    .bind(user_id)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.get(0).map(|r| r.count).unwrap_or(0);
    let rows = rows.into_iter().map(|r| r.summary).collect();

    Page::from_rows(rows, total_count, page).map_err(|e| e.into())
}
