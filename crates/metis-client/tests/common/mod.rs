//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::time::Duration;

use metis_client::MetisClient;
use wiremock::MockServer;

/// API key used by every test client.
pub const TEST_KEY: &str = "test-key";

/// Build a client pointed at a mock server.
pub fn client_for(server: &MockServer) -> MetisClient {
    MetisClient::builder()
        .api_key(TEST_KEY)
        .base_url(server.uri())
        .timeout(Duration::from_secs(5))
        .stream_timeout(Duration::from_secs(5))
        .build()
        .expect("client should build")
}

/// Build a strict-streaming client pointed at a mock server.
pub fn strict_client_for(server: &MockServer) -> MetisClient {
    MetisClient::builder()
        .api_key(TEST_KEY)
        .base_url(server.uri())
        .strict_streaming(true)
        .build()
        .expect("client should build")
}

/// One decoded part of a multipart body.
#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub value: String,
}

/// Decode a `multipart/form-data` body the way a server would.
pub fn parse_multipart(content_type: &str, body: &[u8]) -> Vec<FormPart> {
    let boundary = content_type
        .split("boundary=")
        .nth(1)
        .expect("content type should carry a boundary")
        .trim_matches('"');
    let delimiter = format!("--{boundary}");
    let body = String::from_utf8_lossy(body);

    body.split(delimiter.as_str())
        .filter(|section| !section.is_empty() && !section.starts_with("--"))
        .map(|section| {
            let section = section.strip_prefix("\r\n").unwrap_or(section);
            let (head, value) = section
                .split_once("\r\n\r\n")
                .expect("part should have headers and a body");
            let value = value.strip_suffix("\r\n").unwrap_or(value);

            let mut part = FormPart {
                name: String::new(),
                filename: None,
                content_type: None,
                value: value.to_string(),
            };

            for line in head.lines() {
                let (key, rest) = line.split_once(':').expect("header line");
                match key.trim().to_ascii_lowercase().as_str() {
                    "content-disposition" => {
                        for param in rest.split(';').map(str::trim) {
                            if let Some(name) = param.strip_prefix("name=") {
                                part.name = name.trim_matches('"').to_string();
                            } else if let Some(filename) = param.strip_prefix("filename=") {
                                part.filename = Some(filename.trim_matches('"').to_string());
                            }
                        }
                    }
                    "content-type" => part.content_type = Some(rest.trim().to_string()),
                    _ => {}
                }
            }

            part
        })
        .collect()
}

/// A local port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    port
}
