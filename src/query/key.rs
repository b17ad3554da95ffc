//! Cache keys and key filters.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one cached resource: a resource name plus its parameters.
///
/// Parameters live in a sorted map, so keys built from the same parameters
/// in any order compare, hash and display identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryKey {
    resource: String,
    params: BTreeMap<String, String>,
}

impl QueryKey {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add or replace a parameter.
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.resource)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{name}={value}")?;
        }
        Ok(())
    }
}

impl From<&str> for QueryKey {
    fn from(resource: &str) -> Self {
        Self::new(resource)
    }
}

/// Selects cache entries for invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyFilter {
    All,
    Exact(QueryKey),
    /// Every key of one resource, whatever its parameters
    Resource(String),
    /// Keys of `resource` whose parameters include all of `params`
    Params {
        resource: String,
        params: BTreeMap<String, String>,
    },
}

impl KeyFilter {
    pub fn exact(key: QueryKey) -> Self {
        KeyFilter::Exact(key)
    }

    pub fn resource(resource: impl Into<String>) -> Self {
        KeyFilter::Resource(resource.into())
    }

    pub fn params<I, K, V>(resource: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        KeyFilter::Params {
            resource: resource.into(),
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.to_string()))
                .collect(),
        }
    }

    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            KeyFilter::All => true,
            KeyFilter::Exact(expected) => expected == key,
            KeyFilter::Resource(resource) => key.resource == *resource,
            KeyFilter::Params { resource, params } => {
                key.resource == *resource
                    && params
                        .iter()
                        .all(|(name, value)| key.params.get(name) == Some(value))
            }
        }
    }
}

impl From<QueryKey> for KeyFilter {
    fn from(key: QueryKey) -> Self {
        KeyFilter::Exact(key)
    }
}
