//! A loopback broker good for just enough of the wire protocol to answer the
//! Metadata and Produce requests the producer sends, plus a single-broker
//! coordination stand-in that points straight at it.

use std::io::{self, Cursor, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use libkafka_producer::codec::{ReadType, WriteType};
use libkafka_producer::coordination::{CoordinationClient, Error as CoordinationError};
use libkafka_producer::protocol::messages::{MetadataResponse, ProduceResponse, RequestHeader};
use libkafka_producer::protocol::ApiKey;

pub struct MockBroker {
    addr: SocketAddr,
    metadata_response: Arc<Mutex<MetadataResponse>>,
    produce_response: Arc<Mutex<ProduceResponse>>,
    produce_requests_seen: Arc<AtomicUsize>,
}

impl MockBroker {
    /// Binds a loopback listener and starts serving it on a background thread.
    pub fn start(metadata_response: MetadataResponse, produce_response: ProduceResponse) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock broker");
        let addr = listener.local_addr().expect("local addr");

        let metadata_response = Arc::new(Mutex::new(metadata_response));
        let produce_response = Arc::new(Mutex::new(produce_response));
        let produce_requests_seen = Arc::new(AtomicUsize::new(0));

        let metadata_for_thread = Arc::clone(&metadata_response);
        let produce_for_thread = Arc::clone(&produce_response);
        let seen_for_thread = Arc::clone(&produce_requests_seen);

        thread::spawn(move || {
            for incoming in listener.incoming() {
                let Ok(stream) = incoming else { break };
                let metadata = Arc::clone(&metadata_for_thread);
                let produce = Arc::clone(&produce_for_thread);
                let seen = Arc::clone(&seen_for_thread);
                thread::spawn(move || serve_connection(stream, metadata, produce, seen));
            }
        });

        Self {
            addr,
            metadata_response,
            produce_response,
            produce_requests_seen,
        }
    }

    pub fn set_metadata_response(&self, response: MetadataResponse) {
        *self.metadata_response.lock().unwrap() = response;
    }

    pub fn set_produce_response(&self, response: ProduceResponse) {
        *self.produce_response.lock().unwrap() = response;
    }

    pub fn produce_requests_seen(&self) -> usize {
        self.produce_requests_seen.load(Ordering::SeqCst)
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> i32 {
        i32::from(self.addr.port())
    }
}

fn serve_connection(
    mut stream: TcpStream,
    metadata_response: Arc<Mutex<MetadataResponse>>,
    produce_response: Arc<Mutex<ProduceResponse>>,
    produce_requests_seen: Arc<AtomicUsize>,
) {
    loop {
        let Ok(frame) = read_frame(&mut stream) else {
            return;
        };
        let mut cursor = Cursor::new(frame);
        let Ok(header) = RequestHeader::read(&mut cursor) else {
            return;
        };

        match header.api_key {
            ApiKey::Metadata => {
                let response = metadata_response.lock().unwrap().clone();
                if write_response(&mut stream, header.correlation_id, &response).is_err() {
                    return;
                }
            }
            ApiKey::Produce => {
                produce_requests_seen.fetch_add(1, Ordering::SeqCst);
                if produce_wants_response(&mut cursor) {
                    let response = produce_response.lock().unwrap().clone();
                    if write_response(&mut stream, header.correlation_id, &response).is_err() {
                        return;
                    }
                }
            }
            ApiKey::Unknown(_) => return,
        }
    }
}

/// The produce body starts with an `acks` `int16`; `0` means the caller never reads a
/// response, so the broker must not send one.
fn produce_wants_response(cursor: &mut Cursor<Vec<u8>>) -> bool {
    let position = cursor.position();
    let acks = i16::read(cursor).unwrap_or(0);
    cursor.set_position(position);
    acks != 0
}

fn read_frame(stream: &mut TcpStream) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf)?;
    let len = usize::try_from(i32::from_be_bytes(len_buf))
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "negative request_size"))?;

    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf)?;
    Ok(buf)
}

fn write_response<B: WriteType>(stream: &mut TcpStream, correlation_id: i32, body: &B) -> io::Result<()> {
    let mut payload = Vec::new();
    correlation_id
        .write(&mut payload)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    body.write(&mut payload)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let size = i32::try_from(payload.len())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    stream.write_all(&size.to_be_bytes())?;
    stream.write_all(&payload)
}

/// Publishes exactly one broker descriptor, pointed at `broker`, under `/brokers/ids`.
pub struct SingleBrokerCoordination {
    id: i32,
    host: String,
    port: i32,
}

impl SingleBrokerCoordination {
    pub fn new(id: i32, broker: &MockBroker) -> Self {
        Self {
            id,
            host: broker.host(),
            port: broker.port(),
        }
    }
}

impl CoordinationClient for SingleBrokerCoordination {
    fn list_children(&self, path: &str) -> Result<Vec<String>, CoordinationError> {
        if path == "/brokers/ids" {
            Ok(vec![self.id.to_string()])
        } else {
            Ok(Vec::new())
        }
    }

    fn get_data(&self, path: &str) -> Result<Vec<u8>, CoordinationError> {
        let expected = format!("/brokers/ids/{}", self.id);
        if path != expected {
            return Err(CoordinationError::Lookup {
                path: path.to_string(),
                source: "no such node".to_string(),
            });
        }
        Ok(format!(r#"{{"host":"{}","port":{}}}"#, self.host, self.port).into_bytes())
    }
}
