use crate::{
    authentication::permissions::ActionType,
    constants::BULK_INSERT_CHUNK,
    error::{NotFoundError, QueryError},
    form::Form,
    jwt::SessionData,
    pagination::{Page, PageRequest},
    schema::{
        IngredientAmount, Recipe, RecipeCollection, RecipePayload, RecipeRead, RecipeRow, Uuid,
    },
    validation::{first_missing, unique_tags, validate_recipe},
};

use super::{
    collections::recipe_flags, get_user_profile, list_recipe_ingredients, list_recipe_tags,
};

use potion::HtmlError;
use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

/// Query-string filters of the recipe list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author: Option<Uuid>,
    /// Any-of match on tag slugs.
    pub tags: Vec<String>,
    /// Only honoured for signed-in viewers; `false` means "don't filter".
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeFilter {
    pub fn from_form(form: &Form) -> Result<Self, potion::Error> {
        Ok(Self {
            author: form.get_optional_number("author")?,
            tags: form.get_list("tags"),
            is_favorited: form
                .get_flag("is_favorited")
                .map_err(|e| e.into())?
                .unwrap_or(false),
            is_in_shopping_cart: form
                .get_flag("is_in_shopping_cart")
                .map_err(|e| e.into())?
                .unwrap_or(false),
        })
    }
}

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, potion::Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// The recipe, if `session` may change it: its author, or an admin.
pub async fn get_recipe_mut(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, potion::Error> {
    let recipe = get_recipe(id, pool).await?;
    session.authenticate(ActionType::ManageOwnRecipes)?;

    match recipe {
        Some(recipe) => match session.authenticate(ActionType::ManageAllRecipes) {
            Ok(_) => Ok(recipe),
            Err(_) => {
                if recipe.author_id != session.user_id {
                    Err(HtmlError::Unauthorized.default())
                } else {
                    Ok(recipe)
                }
            }
        },
        None => Err(NotFoundError::recipe(id).into()),
    }
}

async fn read_recipe(
    recipe: Recipe,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<RecipeRead, potion::Error> {
    let tags = list_recipe_tags(recipe.id, pool).await?;
    let ingredients = list_recipe_ingredients(recipe.id, pool).await?;
    let author = get_user_profile(recipe.author_id, viewer, pool).await?;
    let (is_favorited, is_in_shopping_cart) = recipe_flags(recipe.id, viewer, pool).await?;

    Ok(RecipeRead {
        id: recipe.id,
        tags,
        author,
        ingredients,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        is_favorited,
        is_in_shopping_cart,
    })
}

/// Full representation with flags relative to `viewer` (all `false` when anonymous).
pub async fn get_recipe_detail(
    id: Uuid,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<RecipeRead, potion::Error> {
    match get_recipe(id, pool).await? {
        Some(recipe) => read_recipe(recipe, viewer, pool).await,
        None => Err(NotFoundError::recipe(id).into()),
    }
}

fn push_collection_filter(
    query: &mut QueryBuilder<Postgres>,
    collection: RecipeCollection,
    viewer: Uuid,
) {
    query
        .push(format!(
            " AND EXISTS (SELECT 1 FROM {} c WHERE c.recipe_id = r.id AND c.user_id = ",
            collection.table()
        ))
        .push_bind(viewer)
        .push(")");
}

/// Newest first.
pub async fn fetch_recipes(
    filter: &RecipeFilter,
    viewer: Option<Uuid>,
    page: &PageRequest,
    pool: &Pool<Postgres>,
) -> Result<Page<RecipeRead>, potion::Error> {
    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE TRUE");

    if let Some(author) = filter.author {
        query.push(" AND r.author_id = ").push_bind(author);
    }
    if !filter.tags.is_empty() {
        query
            .push(
                " AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id \
                 WHERE rt.recipe_id = r.id AND t.slug = ANY(",
            )
            .push_bind(filter.tags.clone())
            .push("))");
    }
    if let Some(viewer) = viewer {
        if filter.is_favorited {
            push_collection_filter(&mut query, RecipeCollection::Favorites, viewer);
        }
        if filter.is_in_shopping_cart {
            push_collection_filter(&mut query, RecipeCollection::ShoppingCart, viewer);
        }
    }

    query
        .push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());

    let rows: Vec<RecipeRow> = query
        .build_query_as::<RecipeRow>()
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.get(0).map(|r| r.count).unwrap_or(0);

    let mut recipes = Vec::with_capacity(rows.len());
    for row in rows {
        recipes.push(read_recipe(row.into(), viewer, pool).await?);
    }

    Page::from_rows(recipes, total_count, page).map_err(|e| e.into())
}

/// Checks that every referenced ingredient and tag exists and returns the tag set.
async fn resolve_references(
    payload: &RecipePayload,
    conn: &mut PgConnection,
) -> Result<Vec<Uuid>, potion::Error> {
    let ingredient_ids: Vec<Uuid> = payload.ingredients.iter().map(|i| i.id).collect();
    let found: Vec<(i32,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = ANY($1)")
        .bind(&ingredient_ids)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| QueryError::from(e).into())?;
    let found: Vec<Uuid> = found.into_iter().map(|r| r.0).collect();
    if let Some(id) = first_missing(&ingredient_ids, &found) {
        return Err(NotFoundError::ingredient(id).into());
    }

    let tags = unique_tags(&payload.tags);
    let found: Vec<(i32,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ANY($1)")
        .bind(&tags)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| QueryError::from(e).into())?;
    let found: Vec<Uuid> = found.into_iter().map(|r| r.0).collect();
    if let Some(id) = first_missing(&tags, &found) {
        return Err(NotFoundError::tag(id).into());
    }

    Ok(tags)
}

async fn insert_associations(
    recipe_id: Uuid,
    tags: &[Uuid],
    ingredients: &[IngredientAmount],
    conn: &mut PgConnection,
) -> Result<(), potion::Error> {
    for chunk in tags.chunks(BULK_INSERT_CHUNK) {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
        query_builder.push_values(chunk, |mut b, tag_id| {
            b.push_bind(recipe_id).push_bind(*tag_id);
        });
        query_builder
            .build()
            .execute(&mut *conn)
            .await
            .map_err(|e| QueryError::from(e).into())?;
    }

    for chunk in ingredients.chunks(BULK_INSERT_CHUNK) {
        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ",
        );
        query_builder.push_values(chunk, |mut b, ingredient| {
            b.push_bind(recipe_id)
                .push_bind(ingredient.id)
                .push_bind(ingredient.amount);
        });
        query_builder
            .build()
            .execute(&mut *conn)
            .await
            .map_err(|e| QueryError::from(e).into())?;
    }

    Ok(())
}

/// Validates, then writes the recipe, its tags and its ingredient rows in one transaction.
pub async fn create_recipe(
    payload: RecipePayload,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<RecipeRead, potion::Error> {
    session.authenticate(ActionType::CreateRecipes)?;
    validate_recipe(&payload).map_err(|e| e.into())?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    let tags = resolve_references(&payload, &mut *tr).await?;

    let id: (i32,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(session.user_id)
    .bind(payload.name.trim())
    .bind(&payload.image)
    .bind(&payload.text)
    .bind(payload.cooking_time)
    .fetch_one(&mut *tr)
    .await
    .map_err(|e| QueryError::from(e).into())?;
    let recipe_id = id.0;

    insert_associations(recipe_id, &tags, &payload.ingredients, &mut *tr).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    log::info!(
        "User {} created recipe {} with {} ingredients",
        session.user_id,
        recipe_id,
        payload.ingredients.len()
    );

    get_recipe_detail(recipe_id, Some(session.user_id), pool).await
}

/// Replaces fields, the tag set and every ingredient row. Author and pub_date stay.
pub async fn update_recipe(
    id: Uuid,
    payload: RecipePayload,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<RecipeRead, potion::Error> {
    let recipe = get_recipe_mut(id, session, pool).await?;
    validate_recipe(&payload).map_err(|e| e.into())?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    let tags = resolve_references(&payload, &mut *tr).await?;

    let result = sqlx::query(
        "UPDATE recipes SET name = $1, text = $2, cooking_time = $3, image = $4 WHERE id = $5",
    )
    .bind(payload.name.trim())
    .bind(&payload.text)
    .bind(payload.cooking_time)
    .bind(&payload.image)
    .bind(recipe.id)
    .execute(&mut *tr)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() == 0 {
        return Err(NotFoundError::recipe(id).into());
    }

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe.id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe.id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    insert_associations(recipe.id, &tags, &payload.ingredients, &mut *tr).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    log::info!("User {} updated recipe {}", session.user_id, recipe.id);

    get_recipe_detail(recipe.id, Some(session.user_id), pool).await
}

/// Join, favorite and cart rows go with it through the foreign-key cascade.
pub async fn delete_recipe(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), potion::Error> {
    let recipe = get_recipe_mut(id, session, pool).await?;

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe.id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    log::info!("User {} deleted recipe {}", session.user_id, recipe.id);

    Ok(())
}
