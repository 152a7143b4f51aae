use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP status {status} ({message})")]
    Status { status: u16, message: String },

    #[error("response decode failed: {0}")]
    Decode(String),

    #[error("request encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// Blocking JSON transport. One attempt per call: failures go straight back
/// to the caller with the server's message when it sent one.
#[derive(Debug, Clone)]
pub struct JsonHttp {
    base_url: String,
    agent: ureq::Agent,
}

impl JsonHttp {
    pub fn new(base_url: &str, connect_timeout: Duration, read_timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(connect_timeout)
            .timeout_read(read_timeout)
            .timeout_write(read_timeout)
            .build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.send_text(Method::Get, path, None)?;
        decode(&body)
    }

    pub fn send<B, T>(&self, method: Method, path: &str, payload: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let encoded = serde_json::to_string(payload)?;
        let body = self.send_text(method, path, Some(&encoded))?;
        decode(&body)
    }

    /// For endpoints whose response body is irrelevant (deletes, status updates).
    pub fn send_unit<B>(&self, method: Method, path: &str, payload: Option<&B>) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let encoded = payload.map(serde_json::to_string).transpose()?;
        self.send_text(method, path, encoded.as_deref())?;
        Ok(())
    }

    pub fn send_text(
        &self,
        method: Method,
        path: &str,
        body: Option<&str>,
    ) -> Result<String, ApiError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(method = method.as_str(), %url, "api request");

        let request = self
            .agent
            .request(method.as_str(), &url)
            .set("Accept", "application/json");
        let result = match body {
            Some(body) => request
                .set("Content-Type", "application/json")
                .send_string(body),
            None => request.call(),
        };

        match result {
            Ok(response) => response
                .into_string()
                .map_err(|err| ApiError::Decode(err.to_string())),
            Err(ureq::Error::Status(status, response)) => {
                let response_body = response.into_string().ok().unwrap_or_default();
                Err(ApiError::Status {
                    status,
                    message: error_message(status, &response_body),
                })
            }
            Err(ureq::Error::Transport(err)) => Err(ApiError::Transport(err.to_string())),
        }
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|err| {
        let snippet = body.trim().chars().take(120).collect::<String>();
        ApiError::Decode(format!("{err} in `{snippet}`"))
    })
}

/// Prefers the API's `{"error": "..."}` field, then the raw body, then the
/// bare status line.
pub(crate) fn error_message(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed)
        && let Some(message) = value
            .get("error")
            .or_else(|| value.get("message"))
            .and_then(serde_json::Value::as_str)
        && !message.trim().is_empty()
    {
        return message.trim().to_string();
    }
    if trimmed.is_empty() {
        return format!("request failed with status {status}");
    }
    trimmed.chars().take(240).collect()
}

#[cfg(test)]
pub(crate) mod test_server {
    use std::collections::VecDeque;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Debug, Clone)]
    pub(crate) enum Behavior {
        Respond(u16, String),
        DelayRespond(Duration, u16, String),
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) struct RecordedRequest {
        pub(crate) method: String,
        pub(crate) path: String,
        pub(crate) body: String,
    }

    #[derive(Debug)]
    pub(crate) struct TestServer {
        pub(crate) base_url: String,
        requests: Arc<Mutex<Vec<RecordedRequest>>>,
        shutdown_tx: mpsc::Sender<()>,
        join_handle: Option<std::thread::JoinHandle<()>>,
    }

    impl TestServer {
        pub(crate) fn spawn(behaviors: Vec<Behavior>) -> Self {
            let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind test server");
            listener.set_nonblocking(true).expect("set nonblocking");
            let addr = listener.local_addr().expect("local addr");

            let requests = Arc::new(Mutex::new(Vec::new()));
            let requests_clone = Arc::clone(&requests);
            let shared_behaviors = Arc::new(Mutex::new(VecDeque::from(behaviors)));
            let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

            let join_handle = std::thread::spawn(move || {
                loop {
                    if shutdown_rx.try_recv().is_ok() {
                        break;
                    }

                    match listener.accept() {
                        Ok((mut stream, _)) => {
                            let behavior = {
                                let mut queue = shared_behaviors.lock().expect("lock behaviors");
                                queue.pop_front().unwrap_or_else(|| {
                                    Behavior::Respond(200, "{}".to_string())
                                })
                            };
                            let recorded = read_request(&mut stream);
                            requests_clone.lock().expect("lock requests").push(recorded);
                            std::thread::spawn(move || serve_behavior(&mut stream, behavior));
                        }
                        Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                            std::thread::sleep(Duration::from_millis(5));
                        }
                        Err(_) => break,
                    }
                }
            });

            Self {
                base_url: format!("http://{addr}/api"),
                requests,
                shutdown_tx,
                join_handle: Some(join_handle),
            }
        }

        pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().expect("lock requests").clone()
        }
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            let _ = self.shutdown_tx.send(());
            if let Some(handle) = self.join_handle.take() {
                let _ = handle.join();
            }
        }
    }

    fn read_request(stream: &mut TcpStream) -> RecordedRequest {
        let _ = stream.set_nonblocking(false);
        let _ = stream.set_read_timeout(Some(Duration::from_millis(500)));
        let mut buf = [0_u8; 1024];
        let mut data = Vec::new();
        let mut header_end = None;
        let mut content_length = 0_usize;
        loop {
            if let Some(end) = header_end
                && data.len() >= end + content_length
            {
                break;
            }
            match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(read) => {
                    data.extend_from_slice(&buf[..read]);
                    if header_end.is_none()
                        && let Some(pos) = data.windows(4).position(|window| window == b"\r\n\r\n")
                    {
                        header_end = Some(pos + 4);
                        content_length = parse_content_length(&data[..pos]);
                    }
                }
                Err(_) => break,
            }
        }

        let text = String::from_utf8_lossy(&data).to_string();
        let (head, body) = text.split_once("\r\n\r\n").unwrap_or((text.as_str(), ""));
        let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
        RecordedRequest {
            method: request_line.next().unwrap_or_default().to_string(),
            path: request_line.next().unwrap_or_default().to_string(),
            body: body.to_string(),
        }
    }

    fn parse_content_length(head: &[u8]) -> usize {
        String::from_utf8_lossy(head)
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse().ok())
            .unwrap_or(0)
    }

    fn reason_phrase(status: u16) -> &'static str {
        match status {
            200 => "OK",
            201 => "Created",
            204 => "No Content",
            400 => "Bad Request",
            401 => "Unauthorized",
            404 => "Not Found",
            500 => "Internal Server Error",
            503 => "Service Unavailable",
            _ => "Status",
        }
    }

    fn serve_behavior(stream: &mut TcpStream, behavior: Behavior) {
        match behavior {
            Behavior::Respond(status, body) => {
                let _ = write_response(stream, status, &body);
            }
            Behavior::DelayRespond(delay, status, body) => {
                std::thread::sleep(delay);
                let _ = write_response(stream, status, &body);
            }
        }
    }

    fn write_response(stream: &mut TcpStream, status: u16, body: &str) -> std::io::Result<()> {
        let reason = reason_phrase(status);
        let payload = body.as_bytes();
        write!(
            stream,
            "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            payload.len()
        )?;
        stream.write_all(payload)?;
        stream.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::test_server::{Behavior, TestServer};
    use super::*;

    fn client(server: &TestServer, read_timeout: Duration) -> JsonHttp {
        JsonHttp::new(&server.base_url, Duration::from_millis(200), read_timeout)
    }

    #[test]
    fn error_message_prefers_api_error_field() {
        assert_eq!(
            error_message(400, r#"{"error":"Email already exists"}"#),
            "Email already exists"
        );
        assert_eq!(error_message(502, "bad gateway"), "bad gateway");
        assert_eq!(error_message(500, "  "), "request failed with status 500");
    }

    #[test]
    fn sends_json_body_with_method_and_path() {
        let server = TestServer::spawn(vec![Behavior::Respond(200, r#"{"ok":true}"#.to_string())]);
        let http = client(&server, Duration::from_millis(500));

        let response: serde_json::Value = http
            .send(Method::Patch, "/videos/7/status", &serde_json::json!({"status": "WATCHING"}))
            .expect("request should succeed");

        assert_eq!(response["ok"], true);
        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "PATCH");
        assert_eq!(requests[0].path, "/api/videos/7/status");
        assert_eq!(requests[0].body, r#"{"status":"WATCHING"}"#);
    }

    #[test]
    fn does_not_retry_server_errors() {
        let server = TestServer::spawn(vec![
            Behavior::Respond(503, r#"{"error":"maintenance"}"#.to_string()),
            Behavior::Respond(200, "{}".to_string()),
        ]);
        let http = client(&server, Duration::from_millis(500));

        let err = http
            .get::<serde_json::Value>("playlists/1")
            .expect_err("503 should surface immediately");

        assert_eq!(err.status(), Some(503));
        assert!(err.to_string().contains("maintenance"), "unexpected error: {err}");
        assert_eq!(server.requests().len(), 1);
    }

    #[test]
    fn read_timeout_is_reported_as_transport_error() {
        let server = TestServer::spawn(vec![Behavior::DelayRespond(
            Duration::from_millis(300),
            200,
            "{}".to_string(),
        )]);
        let http = client(&server, Duration::from_millis(50));

        let err = http
            .get::<serde_json::Value>("videos/1")
            .expect_err("slow response should time out");

        assert!(matches!(err, ApiError::Transport(_)), "unexpected error: {err:?}");
        assert_eq!(server.requests().len(), 1);
    }

    #[test]
    fn undecodable_body_is_a_decode_error() {
        let server = TestServer::spawn(vec![Behavior::Respond(200, "<html>".to_string())]);
        let http = client(&server, Duration::from_millis(500));

        let err = http
            .get::<serde_json::Value>("users/1")
            .expect_err("html is not json");

        assert!(matches!(err, ApiError::Decode(_)), "unexpected error: {err:?}");
    }
}
