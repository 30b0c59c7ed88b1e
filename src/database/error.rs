use std::fmt::{self, Display};

use potion::{Error, HtmlError};
use thiserror::Error as ThisError;
use warp::reject::Rejection;

pub struct QueryError {
    info: String,
    conflict: bool,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self {
            info,
            conflict: false,
        }
    }

    /// A unique constraint rejected the write.
    pub fn conflict(info: String) -> Self {
        Self {
            info,
            conflict: true,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.conflict
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Database(e) if e.is_unique_violation() => {
                log::warn!("Unique constraint violated: {e}");
                Self::conflict(format!(
                    "Entry already exists ({})",
                    e.constraint().unwrap_or("unique")
                ))
            }
            sqlx::Error::Database(e) => Self::new(format!("{e}")),
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(format!("{e}")),
            sqlx::Error::RowNotFound => Self::new(format!("RowNotFound")),
            sqlx::Error::TypeNotFound { type_name } => {
                Self::new(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::new(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnNotFound(e) => Self::new(format!("{e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new(format!("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(format!("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(format!("Worker crashed")),
            sqlx::Error::Migrate(e) => Self::new(format!("{e}")),
            _ => Self::new(format!("Unknown error")),
        }
    }
}

impl Into<Error> for QueryError {
    fn into(self) -> Error {
        if self.conflict {
            return Error {
                code: 409,
                info: Some(self.info),
                redirect: None,
            };
        }

        log::error!("Query failed: {}", self.info);
        Error {
            code: 500,
            info: Some(self.info),
            redirect: None,
        }
    }
}

/// A referenced recipe, user, ingredient or tag does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFoundError {
    info: String,
}

impl NotFoundError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_owned(),
        }
    }

    pub fn recipe(id: i32) -> Self {
        Self::new(&format!("Recipe {id} doesn't exist"))
    }

    pub fn user(id: i32) -> Self {
        Self::new(&format!("User {id} doesn't exist"))
    }

    pub fn ingredient(id: i32) -> Self {
        Self::new(&format!("Ingredient {id} doesn't exist"))
    }

    pub fn tag(id: i32) -> Self {
        Self::new(&format!("Tag {id} doesn't exist"))
    }

    /// Removing an entry that isn't there is reported, never ignored.
    pub fn already_removed(collection: &str) -> Self {
        Self::new(&format!("Recipe was already removed from {collection}"))
    }

    pub fn not_subscribed(author_id: i32) -> Self {
        Self::new(&format!("You are not subscribed to user {author_id}"))
    }
}

impl Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info)
    }
}

impl std::error::Error for NotFoundError {}

impl Into<Error> for NotFoundError {
    fn into(self) -> Error {
        Error {
            code: 404,
            info: Some(self.info),
            redirect: None,
        }
    }
}

/// Every rule a request can break before anything is written.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Add at least one ingredient")]
    NoIngredients,
    #[error("Add at least one tag")]
    NoTags,
    #[error("Ingredients must be unique (ingredient {0} is listed twice)")]
    DuplicateIngredient(i32),
    #[error("Ingredient amount can't be less than or equal to 0 (ingredient {0})")]
    NonPositiveAmount(i32),
    #[error("Cooking time can't be less than or equal to 0")]
    NonPositiveCookingTime,
    #[error("Recipe name can't be empty")]
    EmptyName,
    #[error("Recipe name can't be longer than {0} characters")]
    NameTooLong(usize),
    #[error("Recipe description can't be empty")]
    EmptyText,
    #[error("Recipe image is required")]
    EmptyImage,
    #[error("recipes_limit can't be negative")]
    NegativeRecipesLimit,

    #[error("Invalid username: {0}")]
    InvalidUsername(String),
    #[error("Username '{0}' is reserved")]
    ReservedUsername(String),
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("{0} can't be longer than {1} characters")]
    FieldTooLong(&'static str, usize),
    #[error("Password can't be empty")]
    EmptyPassword,
    #[error("User with this username or email already exists")]
    UserExists,
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid tag slug '{0}'; only letters, numbers, '-' and '_' are allowed")]
    InvalidSlug(String),
    #[error("Invalid tag color '{0}'; expected a hex code such as #E26C2D")]
    InvalidColor(String),
    #[error("Tag name can't be empty")]
    EmptyTagName,

    #[error("You can't subscribe to yourself")]
    SelfFollow,
    #[error("You are already subscribed to this user")]
    AlreadySubscribed,

    #[error("Recipe is already in {0}")]
    AlreadyInCollection(&'static str),
}

impl Into<Error> for ValidationError {
    fn into(self) -> Error {
        Error {
            code: 400,
            info: Some(self.to_string()),
            redirect: None,
        }
    }
}

#[derive(Debug)]
pub struct TypeError {
    info: String,
}

impl TypeError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

impl Into<potion::Error> for TypeError {
    fn into(self) -> potion::Error {
        HtmlError::InvalidRequest.new(&self.info)
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.info)
    }
}

impl std::error::Error for TypeError {}
impl Into<Rejection> for TypeError {
    fn into(self) -> Rejection {
        HtmlError::InvalidRequest.new(&self.info).into()
    }
}
