//! UDP transport (component C5): send a query datagram, await the matching
//! response, enforce a per-attempt timeout. Each call owns a private socket;
//! there is no multiplexing across resolves at this layer (spec section
//! 4.3), but a single resolve can still see late/stray datagrams on its own
//! socket, so the transaction id is checked before the socket is released.
use std::time::Duration;

use byteorder::{BigEndian, ByteOrder};
use log::{debug, warn};
use tokio::net::UdpSocket;
use tokio::time::timeout as tokio_timeout;

use crate::error::{DNSError, DNSResult};

const MAX_DNS_PACKET_SIZE: usize = 4096;

/// Send `query` (which must begin with the 2-byte transaction id) to
/// `server` and return the first response datagram whose id matches,
/// within `timeout`. The socket is released on every exit path: success,
/// send error, recv error, or timeout.
pub async fn send_query(server: &str, query: &[u8], timeout: Duration) -> DNSResult<Vec<u8>> {
    if query.len() < 2 {
        return Err(DNSError::parse("query buffer too short to carry a transaction id"));
    }
    let expected_id = BigEndian::read_u16(&query[0..2]);

    let result = tokio_timeout(timeout, send_and_receive(server, query, expected_id)).await;

    match result {
        Ok(inner) => inner,
        Err(_) => {
            warn!("UDP query to {} timed out after {:?}", server, timeout);
            Err(DNSError::timeout(server, timeout.as_millis() as u64))
        }
    }
    // `socket` (inside send_and_receive) is dropped at the end of every one
    // of these paths, which is how tokio::net::UdpSocket releases its fd —
    // idempotent since dropping twice is not possible in safe Rust.
}

async fn send_and_receive(server: &str, query: &[u8], expected_id: u16) -> DNSResult<Vec<u8>> {
    let socket = UdpSocket::bind("0.0.0.0:0")
        .await
        .map_err(|e| DNSError::transport(server, format!("failed to bind UDP socket: {}", e)))?;

    socket
        .connect(server)
        .await
        .map_err(|e| DNSError::transport(server, format!("failed to connect UDP socket: {}", e)))?;

    socket
        .send(query)
        .await
        .map_err(|e| DNSError::transport(server, format!("send failed: {}", e)))?;

    debug!("sent {} byte query to {}", query.len(), server);

    let mut buf = vec![0u8; MAX_DNS_PACKET_SIZE];
    loop {
        let n = socket
            .recv(&mut buf)
            .await
            .map_err(|e| DNSError::transport(server, format!("recv failed: {}", e)))?;

        if n < 2 {
            continue;
        }

        let id = BigEndian::read_u16(&buf[0..2]);
        if id != expected_id {
            debug!("dropping stray datagram from {} with mismatched id", server);
            continue;
        }

        buf.truncate(n);
        return Ok(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_against_a_loopback_responder() {
        let responder = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let responder_addr = responder.local_addr().unwrap();

        let query = vec![0x12, 0x34, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0];
        let query_for_responder = query.clone();

        let server_task = tokio::spawn(async move {
            let mut buf = [0u8; 512];
            let (n, peer) = responder.recv_from(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], query_for_responder.as_slice());
            let response = vec![0x12, 0x34, 0x81, 0x80, 0, 1, 0, 0, 0, 0, 0, 0];
            responder.send_to(&response, peer).await.unwrap();
        });

        let response = send_query(&responder_addr.to_string(), &query, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(response[0], 0x12);
        assert_eq!(response[1], 0x34);

        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn times_out_when_nothing_answers() {
        // bind a socket we never read from, to reserve a port that accepts the
        // datagram but never replies.
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = silent.local_addr().unwrap();

        let query = vec![0xAB, 0xCD, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0];
        let result = send_query(&addr.to_string(), &query, Duration::from_millis(50)).await;
        assert!(matches!(result, Err(DNSError::Timeout { .. })));
    }

    #[tokio::test]
    async fn drops_datagrams_with_mismatched_transaction_id() {
        let responder = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let responder_addr = responder.local_addr().unwrap();

        let query = vec![0x00, 0x01, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0];

        let server_task = tokio::spawn(async move {
            let mut buf = [0u8; 512];
            let (_, peer) = responder.recv_from(&mut buf).await.unwrap();
            // stray datagram with the wrong id, then the real reply
            let stray = vec![0x99, 0x99, 0x81, 0x80, 0, 1, 0, 0, 0, 0, 0, 0];
            responder.send_to(&stray, peer).await.unwrap();
            let response = vec![0x00, 0x01, 0x81, 0x80, 0, 1, 0, 0, 0, 0, 0, 0];
            responder.send_to(&response, peer).await.unwrap();
        });

        let response = send_query(&responder_addr.to_string(), &query, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(&response[0..2], &[0x00, 0x01]);

        server_task.await.unwrap();
    }
}
