//! Descriptor - five-part component identity with wildcard matching

use crate::KeystoneError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const WILDCARD: &str = "*";

/// Component descriptor in the form `group:type:kind:name:version`.
///
/// Any field may be a wildcard (`*`), which matches every value on the
/// other side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Descriptor {
    group: Option<String>,
    kind_type: Option<String>,
    kind: Option<String>,
    name: Option<String>,
    version: Option<String>,
}

impl Descriptor {
    /// Create a descriptor. `"*"` and empty strings become wildcards.
    pub fn new(
        group: impl AsRef<str>,
        kind_type: impl AsRef<str>,
        kind: impl AsRef<str>,
        name: impl AsRef<str>,
        version: impl AsRef<str>,
    ) -> Self {
        Self {
            group: field(group.as_ref()),
            kind_type: field(kind_type.as_ref()),
            kind: field(kind.as_ref()),
            name: field(name.as_ref()),
            version: field(version.as_ref()),
        }
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Logical type, e.g. `logger` or `factory`
    pub fn kind_type(&self) -> Option<&str> {
        self.kind_type.as_deref()
    }

    /// Implementation kind, e.g. `console`
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Partial match: each field is equal or a wildcard on either side
    pub fn matches(&self, other: &Descriptor) -> bool {
        self.fields()
            .iter()
            .zip(other.fields().iter())
            .all(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            })
    }

    /// Full match, wildcards included
    pub fn exact_match(&self, other: &Descriptor) -> bool {
        self == other
    }

    /// Fill this descriptor's wildcards from `other`; set fields are kept
    pub fn clarify(&self, other: &Descriptor) -> Descriptor {
        Descriptor {
            group: self.group.clone().or_else(|| other.group.clone()),
            kind_type: self.kind_type.clone().or_else(|| other.kind_type.clone()),
            kind: self.kind.clone().or_else(|| other.kind.clone()),
            name: self.name.clone().or_else(|| other.name.clone()),
            version: self.version.clone().or_else(|| other.version.clone()),
        }
    }

    /// True when no field is a wildcard
    pub fn is_complete(&self) -> bool {
        self.fields().iter().all(|f| f.is_some())
    }

    fn fields(&self) -> [Option<&str>; 5] {
        [
            self.group.as_deref(),
            self.kind_type.as_deref(),
            self.kind.as_deref(),
            self.name.as_deref(),
            self.version.as_deref(),
        ]
    }
}

fn field(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value == WILDCARD {
        None
    } else {
        Some(value.to_string())
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self
            .fields()
            .iter()
            .map(|f| f.unwrap_or(WILDCARD))
            .collect();
        write!(f, "{}", parts.join(":"))
    }
}

impl FromStr for Descriptor {
    type Err = KeystoneError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = value.split(':').collect();
        if parts.len() != 5 {
            return Err(KeystoneError::InvalidDescriptor(format!(
                "expected group:type:kind:name:version, got '{}'",
                value
            )));
        }
        Ok(Self::new(parts[0], parts[1], parts[2], parts[3], parts[4]))
    }
}

impl Serialize for Descriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Descriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}
