//! Line codec for the stdio JSON-RPC transport.
//!
//! One JSON-RPC 2.0 message per line, newline-delimited. `max_line_bytes`
//! caps the accepted request size; oversized lines fail the read instead of
//! growing the buffer without bound.

use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt};

/// JSON-RPC error code: malformed JSON.
pub const PARSE_ERROR: i64 = -32700;
/// JSON-RPC error code: not a valid request object.
pub const INVALID_REQUEST: i64 = -32600;
/// JSON-RPC error code: unknown method.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// JSON-RPC error code: bad method parameters.
pub const INVALID_PARAMS: i64 = -32602;
/// JSON-RPC error code: internal failure.
pub const INTERNAL_ERROR: i64 = -32603;

/// An inbound JSON-RPC request or notification.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl Request {
    /// Notifications carry no id and receive no response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Build a success response.
pub fn response(id: Value, result: Value) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

/// Build an error response.
pub fn error_response(id: Value, code: i64, message: &str) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message,
        },
    })
}

/// Read one line from the stream.
///
/// Returns `None` on clean EOF. Errors if a line's content exceeds
/// `max_line_bytes`; the trailing delimiter does not count against the cap.
pub async fn read_line<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    max_line_bytes: usize,
) -> std::io::Result<Option<String>> {
    let mut buf = Vec::new();
    // +2 leaves room for a CRLF delimiter on a maximum-size line.
    let mut limited = AsyncReadExt::take(&mut *reader, max_line_bytes as u64 + 2);
    let n = limited.read_until(b'\n', &mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    while let Some(&last) = buf.last() {
        if last == b'\n' || last == b'\r' {
            buf.pop();
        } else {
            break;
        }
    }
    if buf.len() > max_line_bytes {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("request line exceeds {max_line_bytes} bytes"),
        ));
    }
    let line = String::from_utf8(buf).map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, "request line is not UTF-8")
    })?;
    Ok(Some(line))
}

/// Write one message as a single line and flush.
pub async fn write_line<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    message: &Value,
) -> std::io::Result<()> {
    let mut encoded = serde_json::to_vec(message)?;
    encoded.push(b'\n');
    writer.write_all(&encoded).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn read_line_returns_none_on_eof() {
        let mut reader = BufReader::new(Cursor::new(Vec::<u8>::new()));
        assert!(read_line(&mut reader, 1024).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn read_line_strips_newline() {
        let mut reader = BufReader::new(Cursor::new(b"{\"a\":1}\r\n".to_vec()));
        let line = read_line(&mut reader, 1024).await.unwrap().unwrap();
        assert_eq!(line, "{\"a\":1}");
    }

    #[tokio::test]
    async fn read_line_rejects_oversized() {
        let mut reader = BufReader::new(Cursor::new(vec![b'x'; 64]));
        let err = read_line(&mut reader, 16).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn read_line_accepts_content_exactly_at_the_cap() {
        let mut line = vec![b'x'; 16];
        line.extend_from_slice(b"\r\n");
        let mut reader = BufReader::new(Cursor::new(line));
        let got = read_line(&mut reader, 16).await.unwrap().unwrap();
        assert_eq!(got.len(), 16);
    }

    #[tokio::test]
    async fn read_line_rejects_one_past_the_cap() {
        let mut line = vec![b'x'; 17];
        line.push(b'\n');
        let mut reader = BufReader::new(Cursor::new(line));
        let err = read_line(&mut reader, 16).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn write_line_terminates_with_newline() {
        let mut out = Cursor::new(Vec::new());
        write_line(&mut out, &serde_json::json!({"ok": true}))
            .await
            .unwrap();
        let buf = out.into_inner();
        assert!(buf.ends_with(b"\n"));
        let parsed: Value = serde_json::from_slice(&buf[..buf.len() - 1]).unwrap();
        assert_eq!(parsed["ok"], true);
    }

    #[test]
    fn notification_has_no_id() {
        let req: Request =
            serde_json::from_str(r#"{"method":"notifications/initialized"}"#).unwrap();
        assert!(req.is_notification());

        let req: Request = serde_json::from_str(r#"{"id":1,"method":"ping"}"#).unwrap();
        assert!(!req.is_notification());
    }
}
