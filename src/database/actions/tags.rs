use crate::{
    error::{NotFoundError, QueryError},
    jwt::SessionData,
    permissions::ActionType,
    schema::{NewTag, Tag, Uuid},
    validation::validate_tag,
};

use sqlx::{Pool, Postgres};

/// Admin only. Name, color and slug are each unique; a clash surfaces as a conflict.
pub async fn create_tag(
    tag: NewTag,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Tag, potion::Error> {
    session.authenticate(ActionType::ManageTags)?;
    validate_tag(&tag).map_err(|e| e.into())?;

    let row: Tag = sqlx::query_as(
        "INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(tag.name.trim())
    .bind(tag.color.to_uppercase())
    .bind(&tag.slug)
    .fetch_one(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn get_tag(id: Uuid, pool: &Pool<Postgres>) -> Result<Tag, potion::Error> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    tag.ok_or_else(|| NotFoundError::tag(id).into())
}

pub async fn find_tag(slug: &str, pool: &Pool<Postgres>) -> Result<Option<Tag>, potion::Error> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(tag)
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, potion::Error> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

pub async fn list_recipe_tags(
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<Tag>, potion::Error> {
    let list: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.*
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}
