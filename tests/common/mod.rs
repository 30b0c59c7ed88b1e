#![allow(dead_code)]

use recipe_book_sdk::{
    actions::{create_tag, insert_ingredients, list_ingredients, register_user},
    jwt::SessionData,
    schema::{IngredientAmount, NewIngredient, NewTag, NewUser, RecipePayload, UserRole, Uuid},
};
use sqlx::PgPool;

pub async fn user(pool: &PgPool, username: &str) -> SessionData {
    let user = register_user(
        NewUser {
            email: format!("{username}@example.com"),
            username: username.to_owned(),
            first_name: String::new(),
            last_name: String::new(),
            password: "hunter2".to_owned(),
        },
        pool,
    )
    .await
    .ok()
    .unwrap();

    SessionData {
        user_id: user.id,
        username: user.username,
        role: UserRole::User,
        is_admin: false,
    }
}

pub fn admin(user_id: Uuid) -> SessionData {
    SessionData {
        user_id,
        username: "admin".to_owned(),
        role: UserRole::Admin,
        is_admin: true,
    }
}

pub async fn tag(pool: &PgPool, slug: &str, color: &str) -> Uuid {
    create_tag(
        NewTag {
            name: slug.to_uppercase(),
            color: color.to_owned(),
            slug: slug.to_owned(),
        },
        &admin(0),
        pool,
    )
    .await
    .ok()
    .unwrap()
    .id
}

/// Inserts `(name, unit)` pairs and returns their ids in the same order.
pub async fn ingredients(pool: &PgPool, items: &[(&str, &str)]) -> Vec<Uuid> {
    let new: Vec<NewIngredient> = items
        .iter()
        .map(|(name, unit)| NewIngredient {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        })
        .collect();
    insert_ingredients(&new, pool).await.ok().unwrap();

    let all = list_ingredients(None, pool).await.ok().unwrap();
    items
        .iter()
        .map(|(name, unit)| {
            all.iter()
                .find(|i| i.name == *name && i.measurement_unit == *unit)
                .unwrap()
                .id
        })
        .collect()
}

pub fn payload(name: &str, tags: &[Uuid], ingredients: &[(Uuid, i32)]) -> RecipePayload {
    RecipePayload {
        name: name.to_owned(),
        text: "Mix everything.".to_owned(),
        cooking_time: 10,
        tags: tags.to_vec(),
        ingredients: ingredients
            .iter()
            .map(|(id, amount)| IngredientAmount {
                id: *id,
                amount: *amount,
            })
            .collect(),
        image: "data:image/png;base64,AAAA".to_owned(),
    }
}
