//! Local HTTP servers standing in for Jellyfin, Qwen-Audio and Neo4j

use axum::Router;

/// Serve `router` on an ephemeral local port; returns the base URL
pub async fn spawn_mock(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("mock server address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    format!("http://{}", addr)
}
