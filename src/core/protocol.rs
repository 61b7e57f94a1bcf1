//! Wire protocol for the remote command service.
//!
//! The service lives behind a single capability URL handed to us by the
//! host before the session starts. The final path segment of that URL
//! doubles as a recipient key and is echoed back on every request in the
//! `X-Recipient-Key` header.
//!
//! Requests are `POST {base}?cmd={command}` with the raw argument string
//! (if any) as the body. Replies come back in one of three shapes:
//!
//! - the literal sentinel `EOF`, ending the boot message stream
//! - a JSON object `{"messages": [...]}` or bare JSON array, an ordered
//!   batch of output lines
//! - any other body, treated as a single output line

use std::time::Duration;

use serde::Deserialize;

use super::session::{SessionError, Transport};

/// Reply value that ends the boot message stream.
pub const COMPLETION_SENTINEL: &str = "EOF";

/// Clear remote-side session state before a boot replay.
pub const CMD_RESET: &str = "reset";
/// Pull the next boot message.
pub const CMD_NEXT: &str = "next";
/// Deliver a user-typed command line.
pub const CMD_INPUT: &str = "input";

/// The capability endpoint: service base URL plus the recipient key
/// derived from its final path segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub base: String,
    pub recipient: String,
}

impl Endpoint {
    pub fn parse(url: &str) -> Result<Self, SessionError> {
        let url = url.trim().trim_end_matches('/');
        if url.is_empty() {
            return Err(SessionError::Configuration(
                "no service endpoint supplied".into(),
            ));
        }
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .ok_or_else(|| {
                SessionError::Configuration(format!("endpoint is not an http(s) URL: {url}"))
            })?;
        let recipient = match rest.rfind('/') {
            Some(i) if i + 1 < rest.len() => rest[i + 1..].to_string(),
            _ => {
                return Err(SessionError::Configuration(format!(
                    "endpoint URL has no capability segment: {url}"
                )))
            }
        };
        Ok(Self {
            base: url.to_string(),
            recipient,
        })
    }
}

/// One outgoing request: a command identifier and an optional argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandRequest {
    pub command: &'static str,
    pub arg: Option<String>,
}

impl CommandRequest {
    pub fn new(command: &'static str) -> Self {
        Self { command, arg: None }
    }

    pub fn with_arg(command: &'static str, arg: &str) -> Self {
        Self {
            command,
            arg: Some(arg.to_string()),
        }
    }
}

/// Decoded service reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceReply {
    /// Ordered output lines, possibly empty.
    Messages(Vec<String>),
    /// Completion sentinel: the message stream has ended.
    Done,
}

#[derive(Deserialize)]
struct MessageBatch {
    messages: Vec<String>,
}

/// Decode a success body. A body that announces JSON but fails to parse is
/// a protocol failure; plain text is always a single message.
pub fn decode_reply(body: &str) -> Result<ServiceReply, SessionError> {
    let trimmed = body.trim();
    if trimmed == COMPLETION_SENTINEL {
        return Ok(ServiceReply::Done);
    }
    if trimmed.is_empty() {
        return Ok(ServiceReply::Messages(Vec::new()));
    }
    if trimmed.starts_with('{') {
        return serde_json::from_str::<MessageBatch>(trimmed)
            .map(|batch| ServiceReply::Messages(batch.messages))
            .map_err(|e| SessionError::Protocol(format!("malformed reply: {e}")));
    }
    if trimmed.starts_with('[') {
        return serde_json::from_str::<Vec<String>>(trimmed)
            .map(ServiceReply::Messages)
            .map_err(|e| SessionError::Protocol(format!("malformed reply: {e}")));
    }
    Ok(ServiceReply::Messages(vec![trimmed.to_string()]))
}

/// Blocking HTTP transport, one call per request. Runs on the session's
/// worker thread, never on the render loop.
pub struct HttpTransport {
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Transport for HttpTransport {
    fn send(&self, endpoint: &Endpoint, request: &CommandRequest) -> Result<String, SessionError> {
        let url = format!("{}?cmd={}", endpoint.base, request.command);
        let call = ureq::post(&url)
            .set("X-Recipient-Key", &endpoint.recipient)
            .timeout(self.timeout);
        let result = match &request.arg {
            Some(arg) => call.send_string(arg),
            None => call.call(),
        };
        match result {
            Ok(response) => response
                .into_string()
                .map_err(|e| SessionError::Transport(e.to_string())),
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(SessionError::Protocol(format!("status {status}: {body}")))
            }
            Err(e) => Err(SessionError::Transport(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_recipient_is_last_segment() {
        let ep = Endpoint::parse("https://sim.example.net/cap/abc-123").unwrap();
        assert_eq!(ep.base, "https://sim.example.net/cap/abc-123");
        assert_eq!(ep.recipient, "abc-123");
    }

    #[test]
    fn test_endpoint_trailing_slash_is_trimmed() {
        let ep = Endpoint::parse("http://host/key/").unwrap();
        assert_eq!(ep.base, "http://host/key");
        assert_eq!(ep.recipient, "key");
    }

    #[test]
    fn test_endpoint_rejects_empty_and_schemeless() {
        assert!(matches!(
            Endpoint::parse(""),
            Err(SessionError::Configuration(_))
        ));
        assert!(matches!(
            Endpoint::parse("ftp://host/key"),
            Err(SessionError::Configuration(_))
        ));
    }

    #[test]
    fn test_endpoint_rejects_missing_segment() {
        assert!(matches!(
            Endpoint::parse("https://host"),
            Err(SessionError::Configuration(_))
        ));
    }

    #[test]
    fn test_decode_sentinel() {
        assert_eq!(decode_reply("EOF").unwrap(), ServiceReply::Done);
        assert_eq!(decode_reply("  EOF\n").unwrap(), ServiceReply::Done);
    }

    #[test]
    fn test_decode_empty_body_is_zero_messages() {
        assert_eq!(
            decode_reply("").unwrap(),
            ServiceReply::Messages(Vec::new())
        );
    }

    #[test]
    fn test_decode_message_batch() {
        let reply = decode_reply(r#"{"messages": ["one", "two"]}"#).unwrap();
        assert_eq!(
            reply,
            ServiceReply::Messages(vec!["one".into(), "two".into()])
        );
    }

    #[test]
    fn test_decode_bare_array() {
        let reply = decode_reply(r#"["a", "b", "c"]"#).unwrap();
        assert_eq!(
            reply,
            ServiceReply::Messages(vec!["a".into(), "b".into(), "c".into()])
        );
    }

    #[test]
    fn test_decode_plain_text_is_single_message() {
        let reply = decode_reply("SYSTEM ONLINE\n").unwrap();
        assert_eq!(reply, ServiceReply::Messages(vec!["SYSTEM ONLINE".into()]));
    }

    #[test]
    fn test_decode_broken_json_is_protocol_failure() {
        assert!(matches!(
            decode_reply(r#"{"messages": oops"#),
            Err(SessionError::Protocol(_))
        ));
        assert!(matches!(
            decode_reply(r#"[1, 2]"#),
            Err(SessionError::Protocol(_))
        ));
    }
}
