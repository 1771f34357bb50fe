//! The I/O half of the host-does-IO split.
//!
//! # Design
//! `ApiClient` never touches sockets itself; it hands a finished
//! `HttpRequest` to a `Transport` and gets an `HttpResponse` back. Non-2xx
//! statuses are data, not errors: a transport only fails when no response
//! arrived at all, which the client reports as a network error.

use std::time::Duration;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by a shared `ureq` agent.
///
/// The agent is built with status-as-error disabled so 4xx/5xx responses come
/// back as data for the response interceptor to classify.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    timeout: Option<Duration>,
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            agent: build_agent(timeout),
            timeout,
        }
    }

    fn agent_for(&self, timeout: Option<Duration>) -> ureq::Agent {
        if timeout == self.timeout {
            self.agent.clone()
        } else {
            build_agent(timeout)
        }
    }
}

fn build_agent(timeout: Option<Duration>) -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(timeout)
        .build()
        .new_agent()
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let agent = self.agent_for(request.timeout);
        let url = request.url.as_str();
        let body = request.body.as_deref().unwrap_or_default();

        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = agent.get(url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Delete => {
                let mut builder = agent.delete(url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch => {
                let mut builder = match request.method {
                    HttpMethod::Post => agent.post(url),
                    HttpMethod::Put => agent.put(url),
                    _ => agent.patch(url),
                };
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.send(body)
            }
        };

        let mut response = result.map_err(map_ureq_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        // ureq caps `read_to_vec` at 10 MiB unless told otherwise; downloads
        // routinely exceed that.
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(map_ureq_error)?;

        Ok(HttpResponse { status, headers, body })
    }
}

fn map_ureq_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        ureq::Error::HostNotFound | ureq::Error::ConnectionFailed => {
            TransportError::Connect(err.to_string())
        }
        ureq::Error::Io(e) => TransportError::Connect(e.to_string()),
        other => TransportError::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;

    use super::*;

    /// Serve one response with a `len`-byte body on a throwaway port.
    fn serve_bytes(len: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {len}\r\nConnection: close\r\n\r\n"
            )
            .unwrap();
            stream.write_all(&vec![b'x'; len]).unwrap();
        });
        format!("http://{addr}/big")
    }

    #[test]
    fn bodies_over_ten_mebibytes_are_read_whole() {
        let len = 11 * 1024 * 1024;
        let transport = UreqTransport::new(Some(Duration::from_secs(30)));
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: serve_bytes(len),
            headers: Vec::new(),
            body: None,
            timeout: Some(Duration::from_secs(30)),
        };
        let response = transport.execute(&request).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body.len(), len);
    }

    #[test]
    fn unreachable_host_is_a_connect_error() {
        // Port 9 on loopback is discard; nothing listens there in CI.
        let transport = UreqTransport::new(Some(Duration::from_secs(2)));
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: "http://127.0.0.1:9/api/test".to_string(),
            headers: Vec::new(),
            body: None,
            timeout: Some(Duration::from_secs(2)),
        };
        let err = transport.execute(&request).unwrap_err();
        assert!(matches!(
            err,
            TransportError::Connect(_) | TransportError::Timeout | TransportError::Other(_)
        ));
    }
}
