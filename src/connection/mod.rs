//! Bootstrap/refresh and broker request/response I/O, built on blocking `TcpStream`
//! (a single logical actor drives the core, so holding the topology lock across a
//! blocking socket call is safe — nothing else is running concurrently).

pub mod topology;

use std::io::{self, ErrorKind, Write};
use std::net::TcpStream;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{info, warn};

use crate::codec::{ReadError, WriteError};
use crate::coordination::{discover_brokers, CoordinationClient, Error as CoordinationError};
use crate::protocol::messages::{encode_request, read_response, MetadataRequest, MetadataResponse, RequestBody};
use topology::Topology;

pub use topology::{Broker, PartitionMeta, TopicMeta};

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Coordination error: {0}")]
    Coordination(#[from] CoordinationError),

    #[error(transparent)]
    Encode(#[from] WriteError),

    #[error(transparent)]
    Decode(#[from] ReadError),

    #[error("Broker I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("No candidate broker returned a usable metadata response")]
    MetadataUnavailable,

    #[error("Unknown broker id {0}")]
    UnknownBroker(i32),
}

/// Owns the coordination session, the live [`Topology`], and the monotonic correlation id
/// counter shared by every request this producer sends.
pub struct BrokerConnector {
    coordination: Box<dyn CoordinationClient>,
    client_id: String,
    topology: Mutex<Topology>,
    next_correlation_id: Mutex<i32>,
}

impl BrokerConnector {
    pub fn new(coordination: Box<dyn CoordinationClient>, client_id: String) -> Self {
        Self {
            coordination,
            client_id,
            topology: Mutex::new(Topology::default()),
            next_correlation_id: Mutex::new(0),
        }
    }

    fn next_correlation_id(&self) -> i32 {
        let mut id = self.next_correlation_id.lock();
        let current = *id;
        *id = id.wrapping_add(1);
        current
    }

    /// Discovers broker endpoints via the coordination service, then tries each
    /// candidate in turn with an empty-topic-list Metadata request until one answers.
    pub fn bootstrap(&self) -> Result<(), Error> {
        let descriptors = discover_brokers(self.coordination.as_ref())?;
        if descriptors.is_empty() {
            warn!("coordination service returned no broker descriptors");
        }

        for descriptor in &descriptors {
            let addr = format!("{}:{}", descriptor.host, descriptor.port);
            match self.try_metadata_at(&addr) {
                Ok(response) => {
                    info!(
                        brokers = response.brokers.len(),
                        topics = response.topics.len(),
                        "bootstrap succeeded"
                    );
                    *self.topology.lock() = Topology::from_metadata(response);
                    return Ok(());
                }
                Err(e) => {
                    warn!(addr = %addr, error = %e, "candidate broker unusable during bootstrap");
                }
            }
        }

        Err(Error::MetadataUnavailable)
    }

    /// Tears down the current topology and rebuilds it. Invoked only between retry
    /// attempts, never concurrently with a send in progress. Prefers brokers already known
    /// about before falling back to the coordination service, since the live set is usually
    /// still reachable even when one partition's leader moved.
    pub fn refresh(&self) -> Result<(), Error> {
        let known: Vec<String> = {
            let topology = self.topology.lock();
            topology.brokers().map(Broker::addr).collect()
        };

        for addr in &known {
            if let Ok(response) = self.try_metadata_at(addr) {
                self.replace_topology(response);
                return Ok(());
            }
        }

        let descriptors = discover_brokers(self.coordination.as_ref())?;
        for descriptor in &descriptors {
            let addr = format!("{}:{}", descriptor.host, descriptor.port);
            if let Ok(response) = self.try_metadata_at(&addr) {
                self.replace_topology(response);
                return Ok(());
            }
        }

        Err(Error::MetadataUnavailable)
    }

    fn replace_topology(&self, response: MetadataResponse) {
        let mut topology = self.topology.lock();
        topology.teardown();
        *topology = Topology::from_metadata(response);
    }

    fn try_metadata_at(&self, addr: &str) -> Result<MetadataResponse, Error> {
        let mut stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let request = MetadataRequest { topics: None };
        let correlation_id = self.next_correlation_id();
        send_and_receive(&mut stream, &request, &self.client_id, correlation_id)?
            .ok_or(Error::MetadataUnavailable)
    }

    /// Sends `body` to the given broker. When `expect_response` is `false` (ASYNC acks,
    /// ASYNC acks) the request is written and no reply is awaited.
    pub fn send_request<B: RequestBody>(
        &self,
        broker_id: i32,
        body: &B,
        expect_response: bool,
    ) -> Result<Option<B::ResponseBody>, Error> {
        let correlation_id = self.next_correlation_id();
        let client_id = self.client_id.clone();
        let mut topology = self.topology.lock();
        let broker = topology
            .broker_mut(broker_id)
            .ok_or(Error::UnknownBroker(broker_id))?;
        let stream = broker.connection()?;
        if expect_response {
            send_and_receive(stream, body, &client_id, correlation_id)
        } else {
            let frame = encode_request(body, &client_id, correlation_id)?;
            write_all_retrying(stream, &frame)?;
            Ok(None)
        }
    }

    pub fn with_topology<T>(&self, f: impl FnOnce(&Topology) -> T) -> T {
        f(&self.topology.lock())
    }

    pub fn teardown(&self) {
        self.topology.lock().teardown();
    }
}

fn send_and_receive<B: RequestBody>(
    stream: &mut TcpStream,
    body: &B,
    client_id: &str,
    correlation_id: i32,
) -> Result<Option<B::ResponseBody>, Error> {
    let frame = encode_request(body, client_id, correlation_id)?;
    write_all_retrying(stream, &frame)?;
    let (_response_correlation_id, response) = read_response(stream)?;
    Ok(Some(response))
}

/// `EINTR` is retried transparently; any other write error propagates.
fn write_all_retrying(stream: &mut TcpStream, mut buf: &[u8]) -> io::Result<()> {
    while !buf.is_empty() {
        match stream.write(buf) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::WriteZero,
                    "failed to write whole frame",
                ))
            }
            Ok(n) => buf = &buf[n..],
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
