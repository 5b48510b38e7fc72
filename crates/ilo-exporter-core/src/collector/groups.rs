//! Value groups: named accessors mapping instance ids to values.
//!
//! A [`ValueGroup`] is bound to one table column (or to a non-SNMP source)
//! and resolves a list of instance ids to an id → [`GroupValue`] map. Type
//! mismatches are absorbed here: the affected id gets a sentinel value and a
//! warning is logged, the group as a whole never fails because of one bad
//! value.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use tracing::warn;

use super::batch;
use super::error::TransportError;
use super::oid::{InstanceId, Oid};
use super::traits::Transport;
use super::value::DecodedValue;

/// Static integer → name mapping for one enumerated attribute.
pub type EnumTable = &'static [(i64, &'static str)];

/// Result of resolving a value group.
pub type ValueMap = HashMap<InstanceId, GroupValue>;

/// Sentinel substituted for non-integer values in numeric groups.
pub const NUMERIC_SENTINEL: i64 = -1;

/// An integer status code paired with its symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumValue {
    value: i64,
    names: EnumTable,
}

impl EnumValue {
    pub fn new(value: i64, names: EnumTable) -> Self {
        Self { value, names }
    }

    /// The raw status code.
    pub fn value(&self) -> i64 {
        self.value
    }

    /// The symbolic name, if the code is in the table.
    pub fn name(&self) -> Option<&'static str> {
        self.names
            .iter()
            .find(|(code, _)| *code == self.value)
            .map(|(_, name)| *name)
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "unknown state {}", self.value),
        }
    }
}

/// A resolved value for one instance.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupValue {
    Integer(i64),
    Text(String),
    Enum(EnumValue),
    Absent,
}

impl GroupValue {
    /// Numeric payload for the value column of a metric row.
    pub fn as_metric(&self) -> Option<f64> {
        match self {
            GroupValue::Integer(n) => Some(*n as f64),
            GroupValue::Enum(e) => Some(e.value() as f64),
            GroupValue::Text(_) | GroupValue::Absent => None,
        }
    }
}

impl From<DecodedValue> for GroupValue {
    fn from(value: DecodedValue) -> Self {
        match value {
            DecodedValue::Integer(n) => GroupValue::Integer(n),
            DecodedValue::Text(text) => GroupValue::Text(text),
            DecodedValue::Absent => GroupValue::Absent,
        }
    }
}

impl fmt::Display for GroupValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupValue::Integer(n) => write!(f, "{}", n),
            GroupValue::Text(text) => f.write_str(text),
            GroupValue::Enum(e) => write!(f, "{}", e),
            GroupValue::Absent => f.write_str("None"),
        }
    }
}

/// Id → value table filled out-of-band, e.g. from the HTTPS side channel.
///
/// Clones share the same table. The owner of the data replaces the whole
/// table at once; readers see either the old or the new contents.
#[derive(Debug, Clone, Default)]
pub struct ExternalTable {
    values: Arc<RwLock<ValueMap>>,
}

impl ExternalTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the table and fills it with `values`.
    pub fn replace(&self, values: ValueMap) {
        let mut guard = self.values.write().unwrap_or_else(|e| e.into_inner());
        *guard = values;
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.replace(ValueMap::new());
    }

    /// Returns a copy of the current contents.
    pub fn snapshot(&self) -> ValueMap {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.values.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How a value group obtains and interprets its values.
#[derive(Debug, Clone)]
pub enum GroupKind {
    /// Decoded values as the agent returns them.
    Raw(Oid),
    /// Integers; anything else becomes [`NUMERIC_SENTINEL`].
    Numeric(Oid),
    /// Trimmed strings; anything else becomes a descriptive placeholder.
    Text(Oid),
    /// Integers decorated with a symbol table.
    Enum(Oid, EnumTable),
    /// The same value for every id, without touching the transport.
    Constant(i64),
    /// Values supplied out-of-band through a shared table.
    External(ExternalTable),
    /// A caller-supplied fixed table.
    Static(ValueMap),
}

/// A named accessor for one attribute of a hardware class.
///
/// Column-backed kinds address instance `id` at `column.<id>`.
#[derive(Debug, Clone)]
pub struct ValueGroup {
    name: String,
    kind: GroupKind,
}

impl ValueGroup {
    pub fn new(name: impl Into<String>, kind: GroupKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn raw(column: &[u32], name: impl Into<String>) -> Self {
        Self::new(name, GroupKind::Raw(Oid::from(column)))
    }

    pub fn numbers(column: &[u32], name: impl Into<String>) -> Self {
        Self::new(name, GroupKind::Numeric(Oid::from(column)))
    }

    pub fn strings(column: &[u32], name: impl Into<String>) -> Self {
        Self::new(name, GroupKind::Text(Oid::from(column)))
    }

    pub fn enums(column: &[u32], name: impl Into<String>, names: EnumTable) -> Self {
        Self::new(name, GroupKind::Enum(Oid::from(column), names))
    }

    /// Placeholder value group for metrics that only carry label columns.
    pub fn dummy(name: impl Into<String>) -> Self {
        Self::new(name, GroupKind::Constant(1))
    }

    pub fn external(name: impl Into<String>, table: ExternalTable) -> Self {
        Self::new(name, GroupKind::External(table))
    }

    pub fn predetermined(name: impl Into<String>, values: ValueMap) -> Self {
        Self::new(name, GroupKind::Static(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &GroupKind {
        &self.kind
    }

    /// Resolves the values of this group for `ids`.
    ///
    /// Column-backed kinds issue one batched request; the others never touch
    /// the transport. Only transport failures are returned as errors.
    pub fn resolve<T: Transport + ?Sized>(
        &self,
        transport: &T,
        ids: &[InstanceId],
    ) -> Result<ValueMap, TransportError> {
        let values = match &self.kind {
            GroupKind::Raw(column) => fetch(transport, column, ids)?
                .into_iter()
                .map(|(id, value)| (id, GroupValue::from(value)))
                .collect(),
            GroupKind::Numeric(column) => fetch(transport, column, ids)?
                .into_iter()
                .map(|(id, value)| {
                    let n = self.coerce_number(&id, value);
                    (id, GroupValue::Integer(n))
                })
                .collect(),
            GroupKind::Text(column) => fetch(transport, column, ids)?
                .into_iter()
                .map(|(id, value)| {
                    let text = self.coerce_text(&id, value);
                    (id, GroupValue::Text(text))
                })
                .collect(),
            GroupKind::Enum(column, names) => fetch(transport, column, ids)?
                .into_iter()
                .map(|(id, value)| {
                    let code = EnumValue::new(self.coerce_number(&id, value), *names);
                    if code.name().is_none() {
                        warn!(
                            group = %self.name,
                            %id,
                            value = code.value(),
                            "unexpected enum value from iLO"
                        );
                    }
                    (id, GroupValue::Enum(code))
                })
                .collect(),
            GroupKind::Constant(value) => ids
                .iter()
                .map(|id| (id.clone(), GroupValue::Integer(*value)))
                .collect(),
            GroupKind::External(table) => table.snapshot(),
            GroupKind::Static(values) => values.clone(),
        };

        Ok(values)
    }

    fn coerce_number(&self, id: &InstanceId, value: DecodedValue) -> i64 {
        match value {
            DecodedValue::Integer(n) => n,
            other => {
                warn!(group = %self.name, %id, value = %other, "unknown value (not an int)");
                NUMERIC_SENTINEL
            }
        }
    }

    fn coerce_text(&self, id: &InstanceId, value: DecodedValue) -> String {
        match value {
            DecodedValue::Text(text) => text.trim().to_string(),
            other => {
                let placeholder = format!("unknown value: {}", other);
                warn!(group = %self.name, %id, value = %other, "unknown value (not a string)");
                placeholder
            }
        }
    }
}

/// Fetches `column.<id>` for every id in one batched request.
fn fetch<T: Transport + ?Sized>(
    transport: &T,
    column: &Oid,
    ids: &[InstanceId],
) -> Result<Vec<(InstanceId, DecodedValue)>, TransportError> {
    let oids: Vec<Oid> = ids.iter().map(|id| column.child(id.components())).collect();
    let values = batch::get_all(transport, &oids)?;
    Ok(ids.iter().cloned().zip(values).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockTransport;

    const COLUMN: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 6, 8, 1, 4, 0];
    const CONDITION: EnumTable = &[(1, "other"), (2, "ok"), (3, "degraded")];

    fn ids(indexes: &[u32]) -> Vec<InstanceId> {
        indexes.iter().copied().map(InstanceId::Index).collect()
    }

    #[test]
    fn test_numeric_coercion_scenario() {
        let agent = MockTransport::new();
        agent.insert_int(COLUMN, &[1], 40);
        agent.insert_int(COLUMN, &[2], 42);
        agent.insert_str(COLUMN, &[3], "oops");

        let group = ValueGroup::numbers(COLUMN, "celsius");
        let values = group.resolve(&agent, &ids(&[1, 2, 3])).unwrap();

        assert_eq!(values.len(), 3);
        assert_eq!(values[&InstanceId::Index(1)], GroupValue::Integer(40));
        assert_eq!(values[&InstanceId::Index(2)], GroupValue::Integer(42));
        assert_eq!(values[&InstanceId::Index(3)], GroupValue::Integer(-1));
        assert_eq!(agent.get_calls(), 1);
    }

    #[test]
    fn test_enum_fallback() {
        let code = EnumValue::new(99, CONDITION);
        assert_eq!(code.to_string(), "unknown state 99");
        assert_eq!(code.value(), 99);
        assert_eq!(EnumValue::new(2, CONDITION).to_string(), "ok");
    }

    #[test]
    fn test_enum_group_tolerates_unknown_codes() {
        let agent = MockTransport::new();
        agent.insert_int(COLUMN, &[1], 3);
        agent.insert_int(COLUMN, &[2], 99);

        let group = ValueGroup::enums(COLUMN, "condition", CONDITION);
        let values = group.resolve(&agent, &ids(&[1, 2, 3])).unwrap();

        assert_eq!(values[&InstanceId::Index(1)].to_string(), "degraded");
        assert_eq!(values[&InstanceId::Index(2)].to_string(), "unknown state 99");
        // Missing instance is numeric-coerced before decoration.
        assert_eq!(values[&InstanceId::Index(3)].to_string(), "unknown state -1");
        assert_eq!(values[&InstanceId::Index(2)].as_metric(), Some(99.0));
    }

    #[test]
    fn test_string_coercion() {
        let agent = MockTransport::new();
        agent.insert_str(COLUMN, &[1], "  Proc 1 \n");
        agent.insert_int(COLUMN, &[2], 7);

        let group = ValueGroup::strings(COLUMN, "name");
        let values = group.resolve(&agent, &ids(&[1, 2, 3])).unwrap();

        assert_eq!(values[&InstanceId::Index(1)], GroupValue::Text("Proc 1".to_string()));
        assert_eq!(
            values[&InstanceId::Index(2)],
            GroupValue::Text("unknown value: 7".to_string())
        );
        assert_eq!(
            values[&InstanceId::Index(3)],
            GroupValue::Text("unknown value: None".to_string())
        );
    }

    #[test]
    fn test_raw_passthrough_keeps_holes() {
        let agent = MockTransport::new();
        agent.insert_int(COLUMN, &[1], 5);

        let group = ValueGroup::raw(COLUMN, "raw");
        let values = group.resolve(&agent, &ids(&[1, 2])).unwrap();
        assert_eq!(values[&InstanceId::Index(1)], GroupValue::Integer(5));
        assert_eq!(values[&InstanceId::Index(2)], GroupValue::Absent);
    }

    #[test]
    fn test_constant_skips_transport() {
        let agent = MockTransport::new();
        let group = ValueGroup::dummy("info");
        let values = group.resolve(&agent, &ids(&[4, 5])).unwrap();

        assert_eq!(values[&InstanceId::Index(4)], GroupValue::Integer(1));
        assert_eq!(values[&InstanceId::Index(5)], GroupValue::Integer(1));
        assert_eq!(agent.get_calls(), 0);
    }

    #[test]
    fn test_external_table_replace() {
        let agent = MockTransport::new();
        let table = ExternalTable::new();
        let group = ValueGroup::external("label", table.clone());

        table.replace(ValueMap::from([(
            InstanceId::Index(1),
            GroupValue::Text("01-Inlet Ambient".to_string()),
        )]));
        let values = group.resolve(&agent, &ids(&[1])).unwrap();
        assert_eq!(values.len(), 1);

        table.clear();
        assert!(group.resolve(&agent, &ids(&[1])).unwrap().is_empty());
        assert_eq!(agent.get_calls(), 0);
    }

    #[test]
    fn test_predetermined_returns_table() {
        let agent = MockTransport::new();
        let group = ValueGroup::predetermined(
            "fixed",
            ValueMap::from([(InstanceId::Index(9), GroupValue::Integer(3))]),
        );
        let values = group.resolve(&agent, &ids(&[1, 2])).unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[&InstanceId::Index(9)], GroupValue::Integer(3));
    }

    #[test]
    fn test_transport_error_propagates() {
        let agent = MockTransport::new();
        agent.fail_get_after(0, TransportError::Engine("timeout".to_string()));
        let group = ValueGroup::numbers(COLUMN, "celsius");
        assert!(group.resolve(&agent, &ids(&[1])).is_err());
    }
}
