//! Checks that run before anything is written.
//!
//! Recipe rules are evaluated in a fixed order so the reported error is
//! predictable: ingredients present, tags present, then one pass over the
//! ingredient pairs (duplicate id first, then amount), then cooking time,
//! name, description and image.

use std::collections::HashSet;

use crate::{
    constants::{
        EMAIL_MAX_LENGTH, MIN_COOKING_TIME, MIN_INGREDIENT_AMOUNT, PERSON_NAME_MAX_LENGTH,
        RECIPE_NAME_MAX_LENGTH, RESERVED_USERNAMES, TAG_NAME_MAX_LENGTH, TAG_SLUG_MAX_LENGTH,
        USERNAME_MAX_LENGTH,
    },
    error::ValidationError,
    schema::{NewTag, NewUser, RecipePayload, Uuid},
};

pub fn validate_recipe(payload: &RecipePayload) -> Result<(), ValidationError> {
    if payload.ingredients.is_empty() {
        return Err(ValidationError::NoIngredients);
    }
    if payload.tags.is_empty() {
        return Err(ValidationError::NoTags);
    }

    let mut seen: Vec<Uuid> = Vec::with_capacity(payload.ingredients.len());
    for ingredient in &payload.ingredients {
        if seen.contains(&ingredient.id) {
            return Err(ValidationError::DuplicateIngredient(ingredient.id));
        }
        seen.push(ingredient.id);

        if ingredient.amount < MIN_INGREDIENT_AMOUNT {
            return Err(ValidationError::NonPositiveAmount(ingredient.id));
        }
    }

    if payload.cooking_time < MIN_COOKING_TIME {
        return Err(ValidationError::NonPositiveCookingTime);
    }

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.chars().count() > RECIPE_NAME_MAX_LENGTH {
        return Err(ValidationError::NameTooLong(RECIPE_NAME_MAX_LENGTH));
    }
    if payload.text.trim().is_empty() {
        return Err(ValidationError::EmptyText);
    }
    if payload.image.trim().is_empty() {
        return Err(ValidationError::EmptyImage);
    }

    Ok(())
}

/// `None` means every recipe of the author.
pub fn validate_recipes_limit(recipes_limit: Option<i64>) -> Result<(), ValidationError> {
    match recipes_limit {
        Some(limit) if limit < 0 => Err(ValidationError::NegativeRecipesLimit),
        _ => Ok(()),
    }
}

/// Collapses repeated tag ids, keeping first-seen order.
pub fn unique_tags(tags: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    tags.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// First requested id the store did not return.
pub fn first_missing(requested: &[Uuid], found: &[Uuid]) -> Option<Uuid> {
    requested.iter().copied().find(|id| !found.contains(id))
}

pub fn validate_follow(user_id: Uuid, author_id: Uuid) -> Result<(), ValidationError> {
    if user_id == author_id {
        return Err(ValidationError::SelfFollow);
    }
    Ok(())
}

pub fn validate_new_user(user: &NewUser) -> Result<(), ValidationError> {
    let email = user.email.trim();
    if email.is_empty() || !email.contains('@') || email.starts_with('@') || email.ends_with('@')
    {
        return Err(ValidationError::InvalidEmail);
    }
    if email.chars().count() > EMAIL_MAX_LENGTH {
        return Err(ValidationError::FieldTooLong("Email", EMAIL_MAX_LENGTH));
    }

    validate_username(&user.username)?;

    if user.first_name.chars().count() > PERSON_NAME_MAX_LENGTH {
        return Err(ValidationError::FieldTooLong(
            "First name",
            PERSON_NAME_MAX_LENGTH,
        ));
    }
    if user.last_name.chars().count() > PERSON_NAME_MAX_LENGTH {
        return Err(ValidationError::FieldTooLong(
            "Last name",
            PERSON_NAME_MAX_LENGTH,
        ));
    }
    if user.password.is_empty() {
        return Err(ValidationError::EmptyPassword);
    }

    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::InvalidUsername(
            "username can't be empty".to_owned(),
        ));
    }
    if username.chars().count() > USERNAME_MAX_LENGTH {
        return Err(ValidationError::FieldTooLong("Username", USERNAME_MAX_LENGTH));
    }
    if RESERVED_USERNAMES.contains(&username) {
        return Err(ValidationError::ReservedUsername(username.to_owned()));
    }
    // letters, digits and @/./+/-/_
    if let Some(c) = username
        .chars()
        .find(|c| !(c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')))
    {
        return Err(ValidationError::InvalidUsername(format!(
            "character '{c}' is not allowed"
        )));
    }

    Ok(())
}

pub fn validate_tag(tag: &NewTag) -> Result<(), ValidationError> {
    if tag.name.trim().is_empty() {
        return Err(ValidationError::EmptyTagName);
    }
    if tag.name.chars().count() > TAG_NAME_MAX_LENGTH {
        return Err(ValidationError::FieldTooLong("Tag name", TAG_NAME_MAX_LENGTH));
    }

    let slug_ok = !tag.slug.is_empty()
        && tag.slug.len() <= TAG_SLUG_MAX_LENGTH
        && tag
            .slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !slug_ok {
        return Err(ValidationError::InvalidSlug(tag.slug.to_owned()));
    }

    let color_ok = tag.color.len() == 7
        && tag.color.starts_with('#')
        && tag.color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !color_ok {
        return Err(ValidationError::InvalidColor(tag.color.to_owned()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::IngredientAmount;

    fn payload(ingredients: &[(i32, i32)], tags: &[i32], cooking_time: i32) -> RecipePayload {
        RecipePayload {
            name: "Pancakes".to_owned(),
            text: "Mix and fry".to_owned(),
            cooking_time,
            tags: tags.to_vec(),
            ingredients: ingredients
                .iter()
                .map(|&(id, amount)| IngredientAmount { id, amount })
                .collect(),
            image: "recipes/pancakes.png".to_owned(),
        }
    }

    #[test]
    fn accepts_a_valid_recipe() {
        assert_eq!(validate_recipe(&payload(&[(1, 200), (2, 3)], &[1], 20)), Ok(()));
    }

    #[test]
    fn requires_ingredients_before_tags() {
        assert_eq!(
            validate_recipe(&payload(&[], &[], 20)),
            Err(ValidationError::NoIngredients)
        );
        assert_eq!(
            validate_recipe(&payload(&[(1, 5)], &[], 20)),
            Err(ValidationError::NoTags)
        );
    }

    #[test]
    fn duplicate_ingredient_fails_regardless_of_amounts() {
        for amounts in [(5, 5), (1, 900), (10, -3)] {
            assert_eq!(
                validate_recipe(&payload(&[(4, amounts.0), (4, amounts.1)], &[1], 20)),
                Err(ValidationError::DuplicateIngredient(4))
            );
        }
    }

    #[test]
    fn first_repeat_is_reported() {
        let recipe = payload(&[(1, 1), (2, 1), (2, 1), (1, 1)], &[1], 5);

        assert_eq!(
            validate_recipe(&recipe),
            Err(ValidationError::DuplicateIngredient(2))
        );
    }

    #[test]
    fn zero_and_negative_amounts_fail() {
        assert_eq!(
            validate_recipe(&payload(&[(1, 10), (2, 0)], &[1], 20)),
            Err(ValidationError::NonPositiveAmount(2))
        );
        assert_eq!(
            validate_recipe(&payload(&[(1, -1)], &[1], 20)),
            Err(ValidationError::NonPositiveAmount(1))
        );
    }

    #[test]
    fn cooking_time_must_be_positive() {
        assert_eq!(
            validate_recipe(&payload(&[(1, 1)], &[1], 0)),
            Err(ValidationError::NonPositiveCookingTime)
        );
        assert_eq!(
            validate_recipe(&payload(&[(1, 1)], &[1], -15)),
            Err(ValidationError::NonPositiveCookingTime)
        );
        assert_eq!(validate_recipe(&payload(&[(1, 1)], &[1], 1)), Ok(()));
    }

    #[test]
    fn description_and_image_are_required() {
        let mut recipe = payload(&[(1, 1)], &[1], 1);
        recipe.text = String::new();
        recipe.image = String::new();
        assert_eq!(validate_recipe(&recipe), Err(ValidationError::EmptyText));

        recipe.text = "Boil".to_owned();
        assert_eq!(validate_recipe(&recipe), Err(ValidationError::EmptyImage));

        recipe.name = String::new();
        assert_eq!(validate_recipe(&recipe), Err(ValidationError::EmptyName));
    }

    #[test]
    fn recipes_limit_cannot_be_negative() {
        assert_eq!(validate_recipes_limit(None), Ok(()));
        assert_eq!(validate_recipes_limit(Some(0)), Ok(()));
        assert_eq!(
            validate_recipes_limit(Some(-1)),
            Err(ValidationError::NegativeRecipesLimit)
        );
    }

    #[test]
    fn name_is_checked_before_description() {
        let mut recipe = payload(&[(1, 1)], &[1], 1);
        recipe.name = "   ".to_owned();
        assert_eq!(validate_recipe(&recipe), Err(ValidationError::EmptyName));

        recipe.name = "x".repeat(RECIPE_NAME_MAX_LENGTH + 1);
        assert_eq!(
            validate_recipe(&recipe),
            Err(ValidationError::NameTooLong(RECIPE_NAME_MAX_LENGTH))
        );
    }

    #[test]
    fn tags_are_deduplicated_in_order() {
        assert_eq!(unique_tags(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }

    #[test]
    fn reports_first_missing_id() {
        assert_eq!(first_missing(&[5, 6, 7], &[7, 5]), Some(6));
        assert_eq!(first_missing(&[5], &[5]), None);
    }

    #[test]
    fn self_follow_is_rejected() {
        assert_eq!(validate_follow(3, 3), Err(ValidationError::SelfFollow));
        assert_eq!(validate_follow(3, 4), Ok(()));
    }

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            email: email.to_owned(),
            username: username.to_owned(),
            first_name: "Vasya".to_owned(),
            last_name: "Pupkin".to_owned(),
            password: "correct horse".to_owned(),
        }
    }

    #[test]
    fn reserved_and_malformed_usernames_fail() {
        assert_eq!(
            validate_new_user(&new_user("me", "me@example.com")),
            Err(ValidationError::ReservedUsername("me".to_owned()))
        );
        assert!(matches!(
            validate_new_user(&new_user("chef cook", "chef@example.com")),
            Err(ValidationError::InvalidUsername(_))
        ));
        assert_eq!(
            validate_new_user(&new_user("chef.cook+1@home", "chef@example.com")),
            Ok(())
        );
    }

    #[test]
    fn email_needs_a_local_part_and_domain() {
        assert_eq!(
            validate_new_user(&new_user("chef", "chef.example.com")),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(
            validate_new_user(&new_user("chef", "@example.com")),
            Err(ValidationError::InvalidEmail)
        );
    }

    #[test]
    fn tag_slug_and_color_are_restricted() {
        let tag = |slug: &str, color: &str| NewTag {
            name: "Breakfast".to_owned(),
            color: color.to_owned(),
            slug: slug.to_owned(),
        };

        assert_eq!(validate_tag(&tag("breakfast_1", "#E26C2D")), Ok(()));
        assert_eq!(
            validate_tag(&tag("break fast", "#E26C2D")),
            Err(ValidationError::InvalidSlug("break fast".to_owned()))
        );
        assert_eq!(
            validate_tag(&tag("breakfast", "E26C2D")),
            Err(ValidationError::InvalidColor("E26C2D".to_owned()))
        );
        assert_eq!(
            validate_tag(&tag("breakfast", "#E26C2G")),
            Err(ValidationError::InvalidColor("#E26C2G".to_owned()))
        );
    }
}
