mod common;

use recipe_book_sdk::{
    actions::{
        add_to_collection, create_recipe, download_shopping_cart, fetch_recipes,
        get_recipe_detail, list_subscriptions, remove_from_collection, subscribe, unsubscribe,
        RecipeFilter,
    },
    pagination::PageRequest,
    schema::RecipeCollection,
};
use sqlx::PgPool;

use common::{ingredients, payload, tag, user};

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn favorite_twice_and_remove_absent_are_rejected(pool: PgPool) {
    let alice = user(&pool, "alice").await;
    let breakfast = tag(&pool, "breakfast", "#E26C2D").await;
    let ids = ingredients(&pool, &[("Egg", "pcs")]).await;
    let recipe = create_recipe(payload("Eggs", &[breakfast], &[(ids[0], 2)]), &alice, &pool)
        .await
        .ok()
        .unwrap();

    let summary = add_to_collection(RecipeCollection::Favorites, recipe.id, &alice, &pool)
        .await
        .ok()
        .unwrap();
    assert_eq!(summary.name, "Eggs");

    let error = add_to_collection(RecipeCollection::Favorites, recipe.id, &alice, &pool)
        .await
        .err()
        .unwrap();
    assert_eq!(error.code, 400);

    let read = get_recipe_detail(recipe.id, Some(alice.user_id), &pool)
        .await
        .ok()
        .unwrap();
    assert!(read.is_favorited);
    assert!(!read.is_in_shopping_cart);

    let favorites = RecipeFilter {
        is_favorited: true,
        ..Default::default()
    };
    let page = fetch_recipes(&favorites, Some(alice.user_id), &PageRequest::first(6), &pool)
        .await
        .ok()
        .unwrap();
    assert_eq!(page.count, 1);

    remove_from_collection(RecipeCollection::Favorites, recipe.id, &alice, &pool)
        .await
        .ok()
        .unwrap();
    let error = remove_from_collection(RecipeCollection::Favorites, recipe.id, &alice, &pool)
        .await
        .err()
        .unwrap();
    assert_eq!(error.code, 404);

    let error = add_to_collection(RecipeCollection::ShoppingCart, recipe.id + 1, &alice, &pool)
        .await
        .err()
        .unwrap();
    assert_eq!(error.code, 404);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn shopping_list_sums_ingredients_across_cart(pool: PgPool) {
    let alice = user(&pool, "alice").await;
    let breakfast = tag(&pool, "breakfast", "#E26C2D").await;
    let ids = ingredients(&pool, &[("Salt", "g"), ("Egg", "pcs")]).await;

    let first = create_recipe(payload("Eggs", &[breakfast], &[(ids[0], 10)]), &alice, &pool)
        .await
        .ok()
        .unwrap();
    let second = create_recipe(
        payload("More eggs", &[breakfast], &[(ids[0], 5), (ids[1], 2)]),
        &alice,
        &pool,
    )
    .await
    .ok()
    .unwrap();

    for id in [first.id, second.id] {
        add_to_collection(RecipeCollection::ShoppingCart, id, &alice, &pool)
            .await
            .ok()
            .unwrap();
    }

    let file = download_shopping_cart(&alice, &pool).await.ok().unwrap();
    assert_eq!(file.body, "Список покупок: \nEgg - 2 (pcs)\nSalt - 15 (g)\n");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn empty_cart_renders_only_the_header(pool: PgPool) {
    let alice = user(&pool, "alice").await;

    let file = download_shopping_cart(&alice, &pool).await.ok().unwrap();
    assert_eq!(file.body, "Список покупок: \n");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn follow_rules(pool: PgPool) {
    let alice = user(&pool, "alice").await;
    let bob = user(&pool, "bob").await;
    let breakfast = tag(&pool, "breakfast", "#E26C2D").await;
    let ids = ingredients(&pool, &[("Egg", "pcs")]).await;
    for name in ["One", "Two", "Three"] {
        create_recipe(payload(name, &[breakfast], &[(ids[0], 1)]), &bob, &pool)
            .await
            .ok()
            .unwrap();
    }

    let error = subscribe(alice.user_id, None, &alice, &pool).await.err().unwrap();
    assert_eq!(error.code, 400);

    let error = subscribe(bob.user_id, Some(-1), &alice, &pool).await.err().unwrap();
    assert_eq!(error.code, 400);

    let subscription = subscribe(bob.user_id, Some(2), &alice, &pool)
        .await
        .ok()
        .unwrap();
    assert!(subscription.author.is_subscribed);
    assert_eq!(subscription.recipes.len(), 2);
    assert_eq!(subscription.recipes[0].name, "Three");
    assert_eq!(subscription.recipes_count, 3);

    let error = subscribe(bob.user_id, None, &alice, &pool).await.err().unwrap();
    assert_eq!(error.code, 400);

    let page = list_subscriptions(&alice, &PageRequest::first(6), None, &pool)
        .await
        .ok()
        .unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].recipes.len(), 3);

    unsubscribe(bob.user_id, &alice, &pool).await.ok().unwrap();
    let error = unsubscribe(bob.user_id, &alice, &pool).await.err().unwrap();
    assert_eq!(error.code, 404);

    let error = subscribe(bob.user_id + 100, None, &alice, &pool)
        .await
        .err()
        .unwrap();
    assert_eq!(error.code, 404);
}
