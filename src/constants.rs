pub const DEFAULT_PAGE_SIZE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 100;

pub const DEFAULT_JWT_LIFETIME_HOURS: i64 = 24;
pub const MAX_JWT_LIFETIME_HOURS: i64 = 24 * 365;

pub const MIN_COOKING_TIME: i32 = 1;
pub const MIN_INGREDIENT_AMOUNT: i32 = 1;

pub const RECIPE_NAME_MAX_LENGTH: usize = 200;
pub const TAG_NAME_MAX_LENGTH: usize = 200;
pub const TAG_SLUG_MAX_LENGTH: usize = 50;
pub const USERNAME_MAX_LENGTH: usize = 150;
pub const EMAIL_MAX_LENGTH: usize = 254;
pub const PERSON_NAME_MAX_LENGTH: usize = 150;

/// Usernames that collide with routes such as `/users/me`.
pub const RESERVED_USERNAMES: &[&str] = &["me"];

pub const SHOPPING_LIST_HEADER: &str = "Список покупок: ";
pub const SHOPPING_LIST_FILENAME: &str = "shopping_cart.txt";
pub const SHOPPING_LIST_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Postgres caps bind parameters per statement at 65535.
pub const BULK_INSERT_CHUNK: usize = 65535 / 4;

pub const SESSION_COOKIE: &str = "session";
pub const TOKEN_PREFIX: &str = "Token ";
