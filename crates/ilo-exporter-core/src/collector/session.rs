//! SNMP v2c transport over UDP.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tracing::trace;

use super::error::TransportError;
use super::oid::Oid;
use super::traits::Transport;
use super::value::RawValue;
use super::wire::{Message, PduKind};

/// Largest datagram accepted from the agent.
const MAX_DATAGRAM: usize = 65_535;

/// Connection parameters for the iLO SNMP agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnmpConfig {
    pub host: String,
    pub port: u16,
    pub community: String,
    pub timeout: Duration,
}

impl SnmpConfig {
    pub fn new(host: impl Into<String>, community: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 161,
            community: community.into(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Opens a new session (one UDP socket) to the agent.
    pub fn connect(&self) -> Result<SnmpTransport, TransportError> {
        SnmpTransport::connect(self)
    }
}

/// Synchronous SNMP session.
///
/// Requests are matched to responses by request id, so the session sits
/// behind a mutex; one request is in flight at a time.
pub struct SnmpTransport {
    session: Mutex<Session>,
}

struct Session {
    socket: UdpSocket,
    community: Vec<u8>,
    next_request_id: i32,
    buffer: Vec<u8>,
}

impl SnmpTransport {
    pub fn connect(config: &SnmpConfig) -> Result<Self, TransportError> {
        let open_error = |e: io::Error| {
            TransportError::Engine(format!(
                "cannot open session to {}:{}: {}",
                config.host, config.port, e
            ))
        };

        let addr = (config.host.as_str(), config.port)
            .to_socket_addrs()
            .map_err(open_error)?
            .next()
            .ok_or_else(|| TransportError::Engine(format!("no address for {}", config.host)))?;
        let local: SocketAddr = if addr.is_ipv4() {
            ([0u8; 4], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };

        let socket = UdpSocket::bind(local).map_err(open_error)?;
        socket.connect(addr).map_err(open_error)?;
        socket
            .set_read_timeout(Some(config.timeout))
            .map_err(open_error)?;

        Ok(Self {
            session: Mutex::new(Session {
                socket,
                community: config.community.as_bytes().to_vec(),
                next_request_id: 1,
                buffer: vec![0; MAX_DATAGRAM],
            }),
        })
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Session {
    /// Sends one PDU and waits for the response carrying its request id.
    fn request(&mut self, kind: PduKind, oids: &[Oid]) -> Result<Message, TransportError> {
        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.checked_add(1).unwrap_or(1);

        let request = Message::request(kind, &self.community, request_id, oids);
        self.socket.send(&request.encode()).map_err(io_error)?;

        loop {
            let len = self.socket.recv(&mut self.buffer).map_err(io_error)?;
            let response = Message::decode(&self.buffer[..len])
                .map_err(|e| TransportError::Engine(format!("malformed response: {}", e)))?;

            // Late answers to earlier, timed-out requests.
            if response.kind != PduKind::Response || response.request_id != request_id {
                trace!(request_id = response.request_id, "discarding unrelated response");
                continue;
            }
            return Ok(response);
        }
    }
}

impl Transport for SnmpTransport {
    fn get_many(&self, oids: &[Oid]) -> Result<Vec<RawValue>, TransportError> {
        if oids.is_empty() {
            return Ok(Vec::new());
        }

        let response = self.session().request(PduKind::GetRequest, oids)?;
        check_status(&response, oids)?;
        if response.varbinds.len() != oids.len() {
            return Err(TransportError::Engine(format!(
                "expected {} values, agent returned {}",
                oids.len(),
                response.varbinds.len()
            )));
        }

        Ok(response.varbinds.into_iter().map(|(_, value)| value).collect())
    }

    fn walk(&self, base: &Oid) -> Result<Vec<(Oid, RawValue)>, TransportError> {
        let mut session = self.session();
        let mut results = Vec::new();
        let mut current = base.clone();

        loop {
            let requested = std::slice::from_ref(&current);
            let response = session.request(PduKind::GetNextRequest, requested)?;
            check_status(&response, requested)?;

            let Some((address, value)) = response.varbinds.into_iter().next() else {
                return Err(TransportError::Engine(format!(
                    "empty response to getnext {}",
                    current
                )));
            };

            if value == RawValue::EndOfMibView || !address.is_within(base) {
                break;
            }
            if address <= current {
                return Err(TransportError::Engine(format!(
                    "agent returned non-increasing OID {} after {}",
                    address, current
                )));
            }

            trace!(%address, "walked");
            results.push((address.clone(), value));
            current = address;
        }

        Ok(results)
    }
}

/// Maps a non-zero error status to [`TransportError::Agent`].
fn check_status(response: &Message, oids: &[Oid]) -> Result<(), TransportError> {
    if response.error_status == 0 {
        return Ok(());
    }
    let address = (response.error_index as usize)
        .checked_sub(1)
        .and_then(|i| oids.get(i))
        .cloned();
    Err(TransportError::Agent {
        status: response.error_status,
        index: response.error_index,
        address,
    })
}

fn io_error(e: io::Error) -> TransportError {
    match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => TransportError::Timeout,
        _ => TransportError::Engine(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::ops::Bound::{Excluded, Unbounded};
    use std::sync::Arc;
    use std::thread;

    fn oid(s: &str) -> Oid {
        s.parse().unwrap()
    }

    /// Loopback agent answering each request with `respond` (no answer on
    /// `None`). Returns the session config and the log of received
    /// requests. The thread exits after two idle seconds.
    fn spawn_agent<F>(respond: F) -> (SnmpConfig, Arc<Mutex<Vec<Message>>>)
    where
        F: Fn(&Message) -> Option<Message> + Send + 'static,
    {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let port = socket.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();

        thread::spawn(move || {
            let mut buf = vec![0u8; MAX_DATAGRAM];
            while let Ok((len, peer)) = socket.recv_from(&mut buf) {
                let request = Message::decode(&buf[..len]).unwrap();
                log.lock().unwrap().push(request.clone());
                if let Some(response) = respond(&request) {
                    socket.send_to(&response.encode(), peer).unwrap();
                }
            }
        });

        let config = SnmpConfig::new("127.0.0.1", "public")
            .with_port(port)
            .with_timeout(Duration::from_millis(300));
        (config, requests)
    }

    fn reply(request: &Message, varbinds: Vec<(Oid, RawValue)>) -> Message {
        Message {
            kind: PduKind::Response,
            varbinds,
            ..request.clone()
        }
    }

    /// Answers GET and GETNEXT from a MIB table, like a real agent.
    fn table_agent(table: BTreeMap<Oid, RawValue>) -> impl Fn(&Message) -> Option<Message> {
        move |request: &Message| {
            let varbinds = request
                .varbinds
                .iter()
                .map(|(oid, _)| match request.kind {
                    PduKind::GetNextRequest => table
                        .range((Excluded(oid.clone()), Unbounded))
                        .next()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .unwrap_or((oid.clone(), RawValue::EndOfMibView)),
                    _ => (
                        oid.clone(),
                        table.get(oid).cloned().unwrap_or(RawValue::NoSuchInstance),
                    ),
                })
                .collect();
            Some(reply(request, varbinds))
        }
    }

    fn ilo_table() -> BTreeMap<Oid, RawValue> {
        BTreeMap::from([
            (oid("1.3.6.1.4.1.232.6.2.6.7.1.2.0.1"), RawValue::Integer(1)),
            (oid("1.3.6.1.4.1.232.6.2.6.7.1.2.0.2"), RawValue::Integer(2)),
            (
                oid("1.3.6.1.4.1.232.6.2.6.7.1.3.0.1"),
                RawValue::OctetString(b"system".to_vec()),
            ),
        ])
    }

    #[test]
    fn test_config_builder() {
        let config = SnmpConfig::new("10.0.0.5", "monitoring")
            .with_port(1161)
            .with_timeout(Duration::from_secs(2));
        assert_eq!(config.port, 1161);
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert_eq!(config.community, "monitoring");
    }

    #[test]
    fn test_get_many_sends_one_pdu() {
        let (config, requests) = spawn_agent(table_agent(ilo_table()));
        let transport = config.connect().unwrap();

        let values = transport
            .get_many(&[
                oid("1.3.6.1.4.1.232.6.2.6.7.1.2.0.2"),
                oid("1.3.6.1.4.1.232.6.2.6.7.1.3.0.1"),
            ])
            .unwrap();
        assert_eq!(
            values,
            vec![
                RawValue::Integer(2),
                RawValue::OctetString(b"system".to_vec())
            ]
        );

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].kind, PduKind::GetRequest);
        assert_eq!(requests[0].community, b"public");
        assert_eq!(requests[0].varbinds.len(), 2);
    }

    #[test]
    fn test_get_many_keeps_no_such_instance() {
        let (config, _) = spawn_agent(table_agent(ilo_table()));
        let transport = config.connect().unwrap();

        let values = transport
            .get_many(&[
                oid("1.3.6.1.4.1.232.6.2.6.7.1.2.0.1"),
                oid("1.3.6.1.4.1.232.99.1"),
            ])
            .unwrap();
        assert_eq!(values, vec![RawValue::Integer(1), RawValue::NoSuchInstance]);
    }

    #[test]
    fn test_walk_stops_at_subtree_end() {
        let (config, _) = spawn_agent(table_agent(ilo_table()));
        let transport = config.connect().unwrap();

        let walked = transport
            .walk(&oid("1.3.6.1.4.1.232.6.2.6.7.1.2.0"))
            .unwrap();
        assert_eq!(
            walked,
            vec![
                (oid("1.3.6.1.4.1.232.6.2.6.7.1.2.0.1"), RawValue::Integer(1)),
                (oid("1.3.6.1.4.1.232.6.2.6.7.1.2.0.2"), RawValue::Integer(2)),
            ]
        );
    }

    #[test]
    fn test_walk_stops_at_end_of_mib_view() {
        let (config, requests) = spawn_agent(table_agent(ilo_table()));
        let transport = config.connect().unwrap();

        // Last column of the table: the agent runs out of MIB.
        let walked = transport
            .walk(&oid("1.3.6.1.4.1.232.6.2.6.7.1.3.0"))
            .unwrap();
        assert_eq!(walked.len(), 1);
        assert_eq!(requests.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_error_status_is_agent_error() {
        let (config, _) = spawn_agent(|request| {
            let mut response = reply(request, request.varbinds.clone());
            response.error_status = 5;
            response.error_index = 2;
            Some(response)
        });
        let transport = config.connect().unwrap();

        let err = transport
            .get_many(&[oid("1.3.6.1.4.1.232.1"), oid("1.3.6.1.4.1.232.2")])
            .unwrap_err();
        assert_eq!(
            err,
            TransportError::Agent {
                status: 5,
                index: 2,
                address: Some(oid("1.3.6.1.4.1.232.2")),
            }
        );
    }

    #[test]
    fn test_silent_agent_times_out() {
        let (config, _) = spawn_agent(|_| None);
        let transport = config.connect().unwrap();

        let err = transport.get_many(&[oid("1.3.6.1.4.1.232.1")]).unwrap_err();
        assert_eq!(err, TransportError::Timeout);
    }

    #[test]
    fn test_stale_response_is_skipped() {
        let (config, _) = spawn_agent(|request| {
            let mut stale = reply(request, vec![(oid("1.3.6.1.4.1.232.1"), RawValue::Integer(0))]);
            stale.request_id = request.request_id.wrapping_sub(1);
            Some(stale)
        });
        let transport = config.connect().unwrap();

        // Only the stale answer arrives, so the request times out.
        let err = transport.get_many(&[oid("1.3.6.1.4.1.232.1")]).unwrap_err();
        assert_eq!(err, TransportError::Timeout);
    }
}
