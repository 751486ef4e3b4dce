//! AXFR client.
//!
//! The resolver library only does stub lookups, so zone transfers are
//! spoken directly over TCP: one length-prefixed query, then a stream of
//! length-prefixed responses bracketed by the zone's SOA record.

use super::hickory::from_response_code;
use super::{fqdn, relative, ZoneRecord};
use crate::error::DnsError;
use hickory_resolver::proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_resolver::proto::rr::{Name, Record as WireRecord, RecordType as WireType};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// Transfers `domain` from `server`, bounded by `timeout` end to end.
pub(super) async fn axfr(server: SocketAddr, domain: &str, timeout: Duration) -> Result<Vec<ZoneRecord>, DnsError> {
    match tokio::time::timeout(timeout, exchange(server, domain)).await {
        Ok(result) => result,
        Err(_) => {
            debug!(%server, domain, "Zone transfer timed out");
            Err(DnsError::Timeout)
        }
    }
}

async fn exchange(server: SocketAddr, domain: &str) -> Result<Vec<ZoneRecord>, DnsError> {
    let query = build_query(domain, rand::random())?;
    let length = u16::try_from(query.len()).map_err(|_| DnsError::Other("AXFR query too large".to_string()))?;

    let mut stream = TcpStream::connect(server).await.map_err(io_error)?;
    stream.write_u16(length).await.map_err(io_error)?;
    stream.write_all(&query).await.map_err(io_error)?;

    let mut transfer = Transfer::default();
    loop {
        let length = stream.read_u16().await.map_err(io_error)?;
        let mut buf = vec![0u8; usize::from(length)];
        stream.read_exact(&mut buf).await.map_err(io_error)?;

        let message = Message::from_vec(&buf).map_err(|e| DnsError::Other(format!("Malformed AXFR response: {}", e)))?;
        if transfer.absorb(domain, &message)? {
            break;
        }
    }

    debug!(%server, domain, records = transfer.records.len(), "Zone transfer completed");
    Ok(transfer.records)
}

fn build_query(domain: &str, id: u16) -> Result<Vec<u8>, DnsError> {
    let name = Name::from_ascii(fqdn(domain))
        .map_err(|e| DnsError::Other(format!("Invalid zone name {}: {}", domain, e)))?;

    let mut message = Message::new();
    message
        .set_id(id)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(false);
    message.add_query(Query::query(name, WireType::AXFR));

    message
        .to_vec()
        .map_err(|e| DnsError::Other(format!("Could not encode AXFR query: {}", e)))
}

/// Accumulates records across the response messages of one transfer.
#[derive(Default)]
struct Transfer {
    records: Vec<ZoneRecord>,
    soa_seen: usize,
}

impl Transfer {
    /// Takes in one response message. Returns true once the closing SOA arrives.
    fn absorb(&mut self, domain: &str, message: &Message) -> Result<bool, DnsError> {
        if message.response_code() != ResponseCode::NoError {
            return Err(from_response_code(domain, message.response_code()));
        }

        let answers = message.answers();
        if self.soa_seen == 0 {
            match answers.first() {
                None => {
                    return Err(DnsError::NoAnswer {
                        name: domain.to_string(),
                    })
                }
                Some(first) if first.record_type() != WireType::SOA => {
                    return Err(DnsError::Other("Zone transfer did not start with SOA".to_string()));
                }
                Some(_) => {}
            }
        }

        for record in answers {
            if record.record_type() == WireType::SOA {
                self.soa_seen += 1;
                if self.soa_seen > 1 {
                    return Ok(true);
                }
            }
            self.records.push(zone_record(record));
        }
        Ok(false)
    }
}

fn zone_record(record: &WireRecord) -> ZoneRecord {
    ZoneRecord {
        name: relative(&record.name().to_string()),
        record_type: record.record_type().to_string(),
        data: record.data().map(|d| d.to_string()).unwrap_or_default(),
    }
}

fn io_error(error: io::Error) -> DnsError {
    match error.kind() {
        io::ErrorKind::TimedOut => DnsError::Timeout,
        io::ErrorKind::UnexpectedEof => DnsError::Other("Connection closed before the zone transfer completed".to_string()),
        _ => DnsError::Other(error.to_string()),
    }
}
