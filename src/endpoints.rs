//! Endpoint server for exposing metrics and health checks

use crate::metrics::Metrics;
use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Start the endpoint server
pub async fn endpoint_server(port: u16, metrics: Arc<Metrics>) -> Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Metrics endpoint listening on {}", addr);

    // Simple HTTP server for metrics
    loop {
        match listener.accept().await {
            Ok((mut socket, _addr)) => {
                let metrics = Arc::clone(&metrics);
                tokio::spawn(async move {
                    use tokio::io::{AsyncReadExt, AsyncWriteExt};

                    let mut buf = [0; 1024];
                    match socket.read(&mut buf).await {
                        Ok(_) => {
                            let body = metrics
                                .export()
                                .unwrap_or_else(|e| format!("# export error: {e}"));
                            let response = format!(
                                "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4\r\nContent-Length: {}\r\n\r\n{}",
                                body.len(),
                                body
                            );
                            let _ = socket.write_all(response.as_bytes()).await;
                        }
                        Err(e) => {
                            tracing::error!("Failed to read from socket: {}", e);
                        }
                    }
                });
            }
            Err(e) => {
                tracing::error!("Failed to accept connection: {}", e);
            }
        }
    }
}
