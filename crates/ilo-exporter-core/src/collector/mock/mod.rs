//! Mock SNMP agent for testing.
//!
//! Provides an in-memory [`MockTransport`] and pre-built agent scenarios
//! that model a typical HPE ProLiant server.

mod scenarios;
mod transport;

pub use transport::MockTransport;
