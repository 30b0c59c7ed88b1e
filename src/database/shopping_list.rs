//! Folds the ingredients of every recipe in a cart into one printable list.
//!
//! Rows are merged on `(name, measurement_unit)`, not on ingredient id: two
//! ingredient records that share both name and unit end up on the same line.
//!
//! Lines are ordered by Unicode code point, not by database collation:
//! uppercase sorts before lowercase, and `ё` sorts after `я`.

use std::collections::BTreeMap;

use serde::Serialize;
use warp::{
    http::header::{HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE},
    reply::Response,
};

use crate::{
    constants::{SHOPPING_LIST_CONTENT_TYPE, SHOPPING_LIST_FILENAME, SHOPPING_LIST_HEADER},
    schema::CartIngredientRow,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Sums amounts per `(name, unit)` and returns the groups sorted by name, then unit.
pub fn aggregate<I>(rows: I) -> Vec<ShoppingListItem>
where
    I: IntoIterator<Item = CartIngredientRow>,
{
    let mut groups: BTreeMap<(String, String), i64> = BTreeMap::new();
    for row in rows {
        *groups.entry((row.name, row.measurement_unit)).or_insert(0) += i64::from(row.amount);
    }

    groups
        .into_iter()
        .map(|((name, measurement_unit), amount)| ShoppingListItem {
            name,
            measurement_unit,
            amount,
        })
        .collect()
}

pub fn render(items: &[ShoppingListItem]) -> String {
    let mut list = format!("{SHOPPING_LIST_HEADER}\n");
    for item in items {
        list.push_str(&format!(
            "{} - {} ({})\n",
            item.name, item.amount, item.measurement_unit
        ));
    }
    list
}

/// The rendered list, ready to be sent as a file attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListFile {
    pub filename: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl ShoppingListFile {
    pub fn from_items(items: &[ShoppingListItem]) -> Self {
        Self {
            filename: SHOPPING_LIST_FILENAME,
            content_type: SHOPPING_LIST_CONTENT_TYPE,
            body: render(items),
        }
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

impl warp::Reply for ShoppingListFile {
    fn into_response(self) -> Response {
        let disposition = self.content_disposition();
        let mut response = Response::new(self.body.into());

        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(self.content_type));
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            headers.insert(CONTENT_DISPOSITION, value);
        }

        response
    }
}
