//! Shared helpers for tests that need a fake upstream service.

use axum::Router;

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn spawn_mock(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A URL where nothing is listening
pub fn unreachable_url(path: &str) -> String {
    format!("http://127.0.0.1:1{}", path)
}
