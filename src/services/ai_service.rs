use crate::error::AnalysisError;
use crate::models::EncodedImage;

/// A remote multimodal model that answers a prompt about one image.
#[async_trait::async_trait]
pub trait VisionModel: Send + Sync {
    /// Send the prompt and image, returning the model's raw text.
    async fn generate(&self, prompt: &str, image: &EncodedImage) -> Result<String, AnalysisError>;

    fn model_name(&self) -> &str;
}

/// Map a non-success HTTP status and body to an error.
pub(crate) fn classify_http_error(status: reqwest::StatusCode, body: &str) -> AnalysisError {
    let lower = body.to_lowercase();
    let auth_status = status == reqwest::StatusCode::UNAUTHORIZED
        || status == reqwest::StatusCode::FORBIDDEN;

    if auth_status || lower.contains("api key") || lower.contains("api_key_invalid") {
        AnalysisError::Authentication(format!("HTTP {}: {}", status.as_u16(), body))
    } else {
        AnalysisError::Transport(format!("HTTP {}: {}", status.as_u16(), body))
    }
}

/// Single-request HTTP server for exercising the backends end to end.
#[cfg(test)]
pub(crate) mod stub_server {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned response and return the base URL to reach it.
    pub(crate) async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}", addr)
    }

    // Drain headers and body so the client never sees a reset mid-upload.
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);

        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    }
}
