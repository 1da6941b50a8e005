//! Per-request signals consumed by shell resolution strategies.

use crate::error::DomainError;
use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::str::FromStr;

bitflags! {
    /// Request signals a web routing strategy is allowed to inspect.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct RoutingSources: u8 {
        const HOST = 1 << 0;
        const PATH = 1 << 1;
        const HEADER = 1 << 2;
        const CLAIM = 1 << 3;

        const ALL = Self::HOST.bits() | Self::PATH.bits() | Self::HEADER.bits() | Self::CLAIM.bits();
    }
}

impl FromStr for RoutingSources {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "host" => Ok(Self::HOST),
            "path" => Ok(Self::PATH),
            "header" => Ok(Self::HEADER),
            "claim" => Ok(Self::CLAIM),
            "all" | "*" => Ok(Self::ALL),
            _ => Err(DomainError::UnknownRoutingSource { name: s.to_owned(), context: None }),
        }
    }
}

impl Default for RoutingSources {
    fn default() -> Self {
        Self::HOST | Self::PATH
    }
}

impl Serialize for RoutingSources {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let names: Vec<String> = self.iter_names().map(|(name, _)| name.to_lowercase()).collect();
        names.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RoutingSources {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let names = Vec::<String>::deserialize(deserializer)?;
        names.iter().try_fold(Self::empty(), |acc, name| {
            name.parse::<Self>().map(|source| acc | source).map_err(serde::de::Error::custom)
        })
    }
}

/// Transient bag of request signals (host, path, headers, claims).
///
/// Built by transport code for every request and discarded afterwards. Header and claim
/// names are stored lowercase so lookups ignore case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionContext {
    host: Option<String>,
    path: Option<String>,
    headers: BTreeMap<String, String>,
    claims: BTreeMap<String, String>,
}

impl ResolutionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn with_claim(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.claims.insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&str> {
        self.claims.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}
