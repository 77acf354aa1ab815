//! DNS-over-HTTPS transport (component C6, RFC 8484).
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use log::debug;

use crate::error::{DNSError, DNSResult};

const DNS_MESSAGE_MIME: &str = "application/dns-message";

/// POST the raw wire query to `url` with the RFC 8484 content type, enforce
/// `timeout` via an abortable request, and return the raw response bytes.
/// Non-2xx responses are transport failures carrying the status code.
pub async fn send_query_post(client: &reqwest::Client, url: &str, query: &[u8], timeout: Duration) -> DNSResult<Vec<u8>> {
    let request = client
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, DNS_MESSAGE_MIME)
        .header(reqwest::header::ACCEPT, DNS_MESSAGE_MIME)
        .body(query.to_vec())
        .timeout(timeout);

    debug!("POSTing {} byte DoH query to {}", query.len(), url);

    let response = request.send().await.map_err(|e| map_reqwest_error(url, e, timeout))?;

    if !response.status().is_success() {
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or("unknown reason");
        return Err(DNSError::transport(
            url,
            format!("HTTP {} ({})", status.as_u16(), reason),
        ));
    }

    response
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| map_reqwest_error(url, e, timeout))
}

/// Build the alternate GET form: the query encoded as base64url (no padding)
/// in the `dns` query parameter, per RFC 8484 section 4.1.1.
pub async fn send_query_get(client: &reqwest::Client, url: &str, query: &[u8], timeout: Duration) -> DNSResult<Vec<u8>> {
    let encoded = URL_SAFE_NO_PAD.encode(query);

    let request = client
        .get(url)
        .query(&[("dns", encoded)])
        .header(reqwest::header::ACCEPT, DNS_MESSAGE_MIME)
        .timeout(timeout);

    let response = request.send().await.map_err(|e| map_reqwest_error(url, e, timeout))?;

    if !response.status().is_success() {
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or("unknown reason");
        return Err(DNSError::transport(
            url,
            format!("HTTP {} ({})", status.as_u16(), reason),
        ));
    }

    response
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| map_reqwest_error(url, e, timeout))
}

fn map_reqwest_error(url: &str, err: reqwest::Error, timeout: Duration) -> DNSError {
    if err.is_timeout() {
        DNSError::timeout(url, timeout.as_millis() as u64)
    } else {
        DNSError::transport(url, err.to_string())
    }
}

/// A minimal HTTP/1.1 responder, good enough to exercise the DoH transport
/// end to end without pulling in a full server crate: `reply` computes the
/// response body from the request body (empty for a bodyless GET), and the
/// request line is recorded so a test can check the method and path sent.
#[cfg(test)]
pub(crate) mod harness {
    use std::sync::{Arc, Mutex};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    pub(crate) async fn spawn<F>(reply: F) -> (String, Arc<Mutex<Vec<String>>>)
    where
        F: Fn(&str, Vec<u8>) -> Vec<u8> + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let requests_for_accept_loop = requests.clone();
        let reply: Arc<dyn Fn(&str, Vec<u8>) -> Vec<u8> + Send + Sync> = Arc::new(reply);

        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(v) => v,
                    Err(_) => return,
                };
                tokio::spawn(handle_connection(stream, reply.clone(), requests_for_accept_loop.clone()));
            }
        });

        (format!("http://{}/dns-query", addr), requests)
    }

    async fn handle_connection(
        mut stream: TcpStream,
        reply: Arc<dyn Fn(&str, Vec<u8>) -> Vec<u8> + Send + Sync>,
        requests: Arc<Mutex<Vec<String>>>,
    ) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = find_subslice(&buf, b"\r\n\r\n") {
                break pos;
            }
        };

        let header_text = String::from_utf8_lossy(&buf[..header_end]).into_owned();
        let request_line = header_text.split("\r\n").next().unwrap_or_default().to_string();
        let content_length: usize = header_text
            .split("\r\n")
            .find_map(|line| {
                let lower = line.to_ascii_lowercase();
                lower.strip_prefix("content-length:").map(|v| v.trim().to_string())
            })
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        let mut received_body = buf[header_end + 4..].to_vec();
        while received_body.len() < content_length {
            let n = match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            received_body.extend_from_slice(&chunk[..n]);
        }

        requests.lock().unwrap().push(request_line.clone());

        let body = reply(&request_line, received_body);
        let response_head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/dns-message\r\nContent-Length: {}\r\n\r\n",
            body.len()
        );
        let _ = stream.write_all(response_head.as_bytes()).await;
        let _ = stream.write_all(&body).await;
    }

    fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }
}
