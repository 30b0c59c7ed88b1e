use crate::{
    error::QueryError,
    jwt::SessionData,
    permissions::ActionType,
    schema::{CartIngredientRow, Uuid},
    shopping_list::{aggregate, ShoppingListFile},
};

use sqlx::{Pool, Postgres};

/// Every ingredient row of every recipe in the user's cart, one row per occurrence.
pub async fn list_cart_ingredients(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<CartIngredientRow>, potion::Error> {
    let rows: Vec<CartIngredientRow> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM shopping_cart sc
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = $1
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

/// An empty cart still yields a file holding just the header line.
pub async fn download_shopping_cart(
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<ShoppingListFile, potion::Error> {
    session.authenticate(ActionType::ManageOwnCollections)?;

    let rows = list_cart_ingredients(session.user_id, pool).await?;
    let items = aggregate(rows);

    log::debug!(
        "Built shopping list for user {} with {} lines",
        session.user_id,
        items.len()
    );

    Ok(ShoppingListFile::from_items(&items))
}
