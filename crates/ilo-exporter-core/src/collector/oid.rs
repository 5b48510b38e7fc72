//! Object identifiers and instance identifiers.
//!
//! An [`Oid`] names one attribute of one instance in the SNMP address space.
//! An [`InstanceId`] distinguishes one hardware unit within a class and is
//! appended to a table column's base OID to address that unit's attribute.

use std::fmt;
use std::str::FromStr;

/// Hierarchical numeric address, e.g. `1.3.6.1.4.1.232.6.2.6.7.1.2.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Oid(Vec<u32>);

impl Oid {
    /// Creates an OID from its components.
    pub fn new(components: impl Into<Vec<u32>>) -> Self {
        Self(components.into())
    }

    /// Returns the components of this OID.
    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// Returns a new OID with `suffix` appended.
    pub fn child(&self, suffix: &[u32]) -> Oid {
        let mut components = Vec::with_capacity(self.0.len() + suffix.len());
        components.extend_from_slice(&self.0);
        components.extend_from_slice(suffix);
        Oid(components)
    }

    /// Returns true if `base` is a strict component-wise prefix of this OID.
    pub fn is_within(&self, base: &Oid) -> bool {
        self.0.len() > base.0.len() && self.0.starts_with(&base.0)
    }

    /// Returns the components following `base`, or `None` if this OID is not
    /// inside the `base` subtree.
    pub fn suffix_after(&self, base: &Oid) -> Option<&[u32]> {
        if self.is_within(base) {
            Some(&self.0[base.0.len()..])
        } else {
            None
        }
    }
}

impl From<&[u32]> for Oid {
    fn from(components: &[u32]) -> Self {
        Oid(components.to_vec())
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", component)?;
            first = false;
        }
        Ok(())
    }
}

/// Error returned when parsing a dotted OID string fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid OID '{input}'")]
pub struct ParseOidError {
    input: String,
}

impl FromStr for Oid {
    type Err = ParseOidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('.');
        if trimmed.is_empty() {
            return Err(ParseOidError {
                input: s.to_string(),
            });
        }

        trimmed
            .split('.')
            .map(|part| part.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map(Oid)
            .map_err(|_| ParseOidError {
                input: s.to_string(),
            })
    }
}

/// Identifier of one hardware unit within a class.
///
/// Simple entities (fans, temperature sensors, CPUs, memory modules) are
/// indexed by a bare integer. Physical drives are indexed by a tuple that
/// embeds controller/box/bay position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InstanceId {
    Index(u32),
    Tuple(Vec<u32>),
}

impl InstanceId {
    /// Returns the OID components appended to a column base for this id.
    pub fn components(&self) -> &[u32] {
        match self {
            InstanceId::Index(index) => std::slice::from_ref(index),
            InstanceId::Tuple(parts) => parts,
        }
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceId::Index(index) => write!(f, "{}", index),
            InstanceId::Tuple(parts) => {
                let joined: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
                f.write_str(&joined.join("."))
            }
        }
    }
}

impl From<u32> for InstanceId {
    fn from(index: u32) -> Self {
        InstanceId::Index(index)
    }
}
