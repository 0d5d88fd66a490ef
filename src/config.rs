//! Solver configuration as consumed by the operator and scheduling core.
//!
//! Configuration is organised in named sections of string key/value pairs, for example
//! `solver.order` or `solver-elements-quad.soln-pts`. Parsing of configuration files is the
//! responsibility of the caller; [`Config`] can be deserialized from any serde format.
use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`Config::set`].
    pub fn with(mut self, section: &str, key: &str, value: impl ToString) -> Self {
        self.set(section, key, value);
        self
    }

    pub fn set(&mut self, section: &str, key: &str, value: impl ToString) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    pub fn has_opt(&self, section: &str, key: &str) -> bool {
        self.get_opt(section, key).is_some()
    }

    pub fn get_opt(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }

    /// Returns the value of a required key.
    pub fn get(&self, section: &str, key: &str) -> Result<&str, Error> {
        self.get_opt(section, key)
            .ok_or_else(|| Error::config(format!("missing required option {}.{}", section, key)))
    }

    pub fn get_or<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        self.get_opt(section, key).unwrap_or(default)
    }

    pub fn get_int(&self, section: &str, key: &str) -> Result<i64, Error> {
        parse_int(section, key, self.get(section, key)?)
    }

    pub fn get_int_opt(&self, section: &str, key: &str) -> Result<Option<i64>, Error> {
        self.get_opt(section, key)
            .map(|value| parse_int(section, key, value))
            .transpose()
    }

    /// Returns a required non-negative integer option.
    pub fn get_usize(&self, section: &str, key: &str) -> Result<usize, Error> {
        let value = self.get_int(section, key)?;
        usize::try_from(value)
            .map_err(|_| Error::config(format!("option {}.{} must be non-negative, got {}", section, key, value)))
    }
}

fn parse_int(section: &str, key: &str, value: &str) -> Result<i64, Error> {
    i64::from_str(value.trim())
        .map_err(|_| Error::config(format!("option {}.{} is not an integer: {:?}", section, key, value)))
}
