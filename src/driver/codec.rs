//! Driver wire protocol codec
//!
//! Each message is a header block followed by a JSON body:
//! ```text
//! Content-Length: <byte-length>\r\n
//! \r\n
//! <JSON body>
//! ```

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::common::Error;

/// Largest body we accept; screenshots travel as files, not inline
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Read one message body from the stream
pub async fn read_message<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<String, Error> {
    let mut content_length: Option<usize> = None;

    loop {
        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line).await.map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                Error::DriverCrashed
            } else {
                Error::Io(e)
            }
        })?;

        if bytes_read == 0 {
            return Err(Error::DriverCrashed);
        }

        if line == "\r\n" || line == "\n" {
            // A blank line before any header is noise, not a terminator
            if content_length.is_none() {
                continue;
            }
            break;
        }

        let line = line.trim();
        if let Some(value) = line.strip_prefix("Content-Length:") {
            content_length = Some(value.trim().parse().map_err(|_| {
                Error::DriverProtocol(format!("Invalid Content-Length: {}", value.trim()))
            })?);
        }
    }

    let len = content_length
        .ok_or_else(|| Error::DriverProtocol("Missing Content-Length header".to_string()))?;

    if len > MAX_BODY_BYTES {
        return Err(Error::DriverProtocol(format!(
            "Content-Length too large: {} bytes",
            len
        )));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await.map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::DriverCrashed
        } else {
            Error::Io(e)
        }
    })?;

    String::from_utf8(body).map_err(|e| Error::DriverProtocol(format!("Invalid UTF-8: {}", e)))
}

/// Write one message body with its header
pub async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, json: &str) -> Result<(), Error> {
    let header = format!("Content-Length: {}\r\n\r\n", json.len());

    writer.write_all(header.as_bytes()).await?;
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_read_message_with_extra_headers() {
        let data = b"Content-Length: 13\r\nContent-Type: application/json\r\n\r\n{\"test\":true}";
        let mut reader = BufReader::new(Cursor::new(data.to_vec()));

        let result = read_message(&mut reader).await.unwrap();
        assert_eq!(result, "{\"test\":true}");
    }

    #[tokio::test]
    async fn test_read_two_messages_back_to_back() {
        let data = b"Content-Length: 2\r\n\r\n{}Content-Length: 4\r\n\r\nnull";
        let mut reader = BufReader::new(Cursor::new(data.to_vec()));

        assert_eq!(read_message(&mut reader).await.unwrap(), "{}");
        assert_eq!(read_message(&mut reader).await.unwrap(), "null");
        assert!(matches!(
            read_message(&mut reader).await,
            Err(Error::DriverCrashed)
        ));
    }

    #[tokio::test]
    async fn test_truncated_body_is_crash() {
        let data = b"Content-Length: 50\r\n\r\n{\"short\":1}";
        let mut reader = BufReader::new(Cursor::new(data.to_vec()));
        assert!(matches!(
            read_message(&mut reader).await,
            Err(Error::DriverCrashed)
        ));
    }

    #[tokio::test]
    async fn test_bad_length_is_protocol_error() {
        let data = b"Content-Length: abc\r\n\r\n";
        let mut reader = BufReader::new(Cursor::new(data.to_vec()));
        assert!(matches!(
            read_message(&mut reader).await,
            Err(Error::DriverProtocol(_))
        ));
    }

    #[tokio::test]
    async fn test_write_message() {
        let mut output = Vec::new();
        write_message(&mut output, "{\"test\":true}").await.unwrap();

        let expected = "Content-Length: 13\r\n\r\n{\"test\":true}";
        assert_eq!(String::from_utf8(output).unwrap(), expected);
    }
}
