//! Health endpoint — reports whether the bus connection is up.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;

use protectbridge_app::health::HealthFlag;

/// Build the health [`Router`]: `GET /health` answers `200 OK` while the
/// bus is connected and `503 Service Unavailable` otherwise.
pub fn router(health: HealthFlag) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(health)
}

async fn health_check(State(health): State<HealthFlag>) -> (StatusCode, &'static str) {
    if health.is_healthy() {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "UNHEALTHY")
    }
}

/// Bind `addr` and serve the health endpoint until the task is aborted.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: &str, health: HealthFlag) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "health endpoint listening");
    axum::serve(listener, router(health)).await
}
