//! In-memory mock SNMP agent for testing collectors without an iLO.
//!
//! `MockTransport` stores an OID → value table and answers `get_many` and
//! `walk` from it. Clones share state, so a test can keep a handle, hand a
//! clone to a collector, and later inspect request counts or inject
//! failures.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::collector::error::TransportError;
use crate::collector::oid::Oid;
use crate::collector::traits::Transport;
use crate::collector::value::RawValue;

#[derive(Debug, Default)]
struct AgentState {
    /// Agent MIB contents, ordered for walks.
    values: BTreeMap<Oid, RawValue>,
    /// Scripted walk results that replace the table walk for a base OID.
    walk_overrides: HashMap<Oid, Vec<(Oid, RawValue)>>,
    /// Number of `get_many` calls, including failed ones.
    get_calls: usize,
    /// Number of `walk` calls, including failed ones.
    walk_calls: usize,
    /// How many times each OID was requested through `get_many`.
    requested: HashMap<Oid, usize>,
    /// Fail every `get_many` call after this many successful ones.
    get_failure: Option<(usize, TransportError)>,
    /// Fail every walk while set.
    walk_failure: Option<TransportError>,
}

/// In-memory SNMP agent.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<AgentState>>,
}

impl MockTransport {
    /// Creates a new empty mock agent.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, AgentState> {
        // A panicking test thread must not hide the agent from other handles.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sets the value at `oid`.
    pub fn insert(&self, oid: impl Into<Oid>, value: RawValue) {
        self.state().values.insert(oid.into(), value);
    }

    /// Removes the value at `oid`, so later gets see `NoSuchInstance`.
    pub fn remove(&self, oid: &Oid) {
        self.state().values.remove(oid);
    }

    /// Sets an integer value at `base.<index>`.
    pub fn insert_int(&self, base: &[u32], index: &[u32], value: i64) {
        self.insert(Oid::from(base).child(index), RawValue::Integer(value));
    }

    /// Sets a string value at `base.<index>`.
    pub fn insert_str(&self, base: &[u32], index: &[u32], value: &str) {
        self.insert(
            Oid::from(base).child(index),
            RawValue::OctetString(value.as_bytes().to_vec()),
        );
    }

    /// Replaces the walk of `base` with a fixed result sequence.
    pub fn script_walk(&self, base: impl Into<Oid>, results: Vec<(Oid, RawValue)>) {
        self.state().walk_overrides.insert(base.into(), results);
    }

    /// Makes every `get_many` call fail after `successes` successful calls.
    pub fn fail_get_after(&self, successes: usize, error: TransportError) {
        let mut state = self.state();
        let done = state.get_calls;
        state.get_failure = Some((done + successes, error));
    }

    /// Makes every walk fail until [`MockTransport::clear_failures`].
    pub fn fail_walks(&self, error: TransportError) {
        self.state().walk_failure = Some(error);
    }

    /// Removes all injected failures.
    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.get_failure = None;
        state.walk_failure = None;
    }

    /// Number of `get_many` calls seen so far.
    pub fn get_calls(&self) -> usize {
        self.state().get_calls
    }

    /// Number of `walk` calls seen so far.
    pub fn walk_calls(&self) -> usize {
        self.state().walk_calls
    }

    /// How many times `oid` was requested through `get_many`.
    pub fn requested(&self, oid: &Oid) -> usize {
        self.state().requested.get(oid).copied().unwrap_or(0)
    }
}

impl Transport for MockTransport {
    fn get_many(&self, oids: &[Oid]) -> Result<Vec<RawValue>, TransportError> {
        let mut state = self.state();
        state.get_calls += 1;

        if let Some((allowed, ref error)) = state.get_failure
            && state.get_calls > allowed
        {
            return Err(error.clone());
        }

        for oid in oids {
            *state.requested.entry(oid.clone()).or_insert(0) += 1;
        }

        Ok(oids
            .iter()
            .map(|oid| {
                state
                    .values
                    .get(oid)
                    .cloned()
                    .unwrap_or(RawValue::NoSuchInstance)
            })
            .collect())
    }

    fn walk(&self, base: &Oid) -> Result<Vec<(Oid, RawValue)>, TransportError> {
        let mut state = self.state();
        state.walk_calls += 1;

        if let Some(ref error) = state.walk_failure {
            return Err(error.clone());
        }

        if let Some(scripted) = state.walk_overrides.get(base) {
            return Ok(scripted.clone());
        }

        Ok(state
            .values
            .range(base.clone()..)
            .skip_while(|(oid, _)| *oid == base)
            .take_while(|(oid, _)| oid.is_within(base))
            .map(|(oid, value)| (oid.clone(), value.clone()))
            .collect())
    }
}
