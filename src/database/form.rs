use std::{
    collections::{hash_map::Entry, HashMap},
    str::FromStr,
};

use potion::Error;
use serde_json::Value;

use super::{error::TypeError, pagination::PageRequest};

pub type FormData = HashMap<String, Value>;

/// Loosely typed request parameters: a JSON form body or a decoded query string.
pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    /// Repeated keys (`?tags=a&tags=b`) collect into an array.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut inner: HashMap<String, Value> = HashMap::new();
        for (key, value) in pairs {
            match inner.entry(key) {
                Entry::Occupied(mut entry) => match entry.get_mut() {
                    Value::Array(values) => values.push(Value::String(value)),
                    existing => {
                        let first = existing.take();
                        *existing = Value::Array(vec![first, Value::String(value)]);
                    }
                },
                Entry::Vacant(entry) => {
                    entry.insert(Value::String(value));
                }
            }
        }
        Self { inner }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn get_value<T>(&self, key: &str) -> Result<T, Error>
    where
        T: TryFrom<Value>,
    {
        match self.inner.get(key) {
            Some(value) => value
                .to_owned()
                .try_into()
                .map_err(|_e| TypeError::new("Invalid type conversion").into()),
            None => Err(TypeError::new("Invalid key").into()),
        }
    }

    pub fn get_number<T>(&self, key: &str) -> Result<T, Error>
    where
        T: FromStr,
    {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => v
                    .trim()
                    .parse()
                    .map_err(|_e| TypeError::new("Invalid type conversion").into()),
                None => Err(TypeError::new("Failed to parse value as str").into()),
            },
            None => Err(TypeError::new("Invalid key").into()),
        }
    }

    pub fn get_optional_number<T>(&self, key: &str) -> Result<Option<T>, Error>
    where
        T: FromStr,
    {
        if !self.contains(key) {
            return Ok(None);
        }
        self.get_number(key).map(Some)
    }

    pub fn get_str(&self, key: &str) -> Result<String, TypeError> {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => Ok(v.to_string()),
                None => Err(TypeError::new("Invalid key")),
            },
            None => Err(TypeError::new("Invalid key")),
        }
    }

    /// `1`/`true` and `0`/`false`; a missing key reads as `None`.
    pub fn get_flag(&self, key: &str) -> Result<Option<bool>, TypeError> {
        if !self.contains(key) {
            return Ok(None);
        }
        match self.get_str(key)?.trim() {
            "1" | "true" => Ok(Some(true)),
            "0" | "false" => Ok(Some(false)),
            _ => Err(TypeError::new("Invalid flag")),
        }
    }

    pub fn get_list(&self, key: &str) -> Vec<String> {
        match self.inner.get(key) {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_owned()))
                .collect(),
            Some(Value::String(value)) => vec![value.to_owned()],
            _ => vec![],
        }
    }

    pub fn get_page(&self, default_limit: i64) -> Result<PageRequest, Error> {
        let page = self.get_optional_number("page")?.unwrap_or(1);
        let limit = self.get_optional_number("limit")?.unwrap_or(default_limit);

        PageRequest::new(page, limit).map_err(|e| e.into())
    }
}
