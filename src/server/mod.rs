//! HTTP façade over the result store.
//!
//! Exposes the `/links` API:
//! - `POST` queues URLs for analysis
//! - `GET` lists records with pagination
//! - `PUT` manually sets a record to `pending` or `stop`
//! - `DELETE /links/:id` removes a record
//!
//! The façade only touches the store; all analysis happens in the dispatcher.

mod handlers;
mod routes;
mod types;

pub use routes::create_router;
pub use types::{LinkView, LinksResponse, Pagination};

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;

use crate::config::ServerConfig;
use crate::storage::Storage;
use crate::AnalyzerError;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub allowed_origins: Vec<HeaderValue>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, config: &ServerConfig) -> Result<Self, AnalyzerError> {
        let allowed_origins = config
            .allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin.trim_end_matches('/')).map_err(|e| {
                    AnalyzerError::Server(format!("Invalid allowed origin '{}': {}", origin, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            storage,
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
            allowed_origins,
        })
    }
}

/// Start the web server and run it until `shutdown` resolves.
pub async fn serve<F>(state: AppState, addr: SocketAddr, shutdown: F) -> Result<(), AnalyzerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
