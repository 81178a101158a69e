use crate::models::GatewayConfig;
use crate::modules::renewal::TokenRenewer;
use crate::modules::token_store::TokenStore;
use crate::proxy::observer::{GatewayObserver, NoopObserver};
use crate::proxy::upstream::UpstreamClient;
use axum::{
    extract::{DefaultBodyLimit, Request},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, Span};

/// Axum application state
#[derive(Clone)]
pub struct AppState {
    pub token_store: Arc<dyn TokenStore>,
    pub renewer: Arc<TokenRenewer>,
    pub upstream: Arc<UpstreamClient>,
    pub observer: Arc<dyn GatewayObserver>,
    pub cron_key: Arc<str>,
}

impl AppState {
    pub fn new(
        config: &GatewayConfig,
        token_store: Arc<dyn TokenStore>,
    ) -> crate::error::AppResult<Self> {
        Ok(Self {
            renewer: Arc::new(TokenRenewer::new(config, token_store.clone())?),
            upstream: Arc::new(UpstreamClient::new(config.upstream_base())?),
            token_store,
            observer: Arc::new(NoopObserver),
            cron_key: Arc::from(config.cron_key.as_str()),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn GatewayObserver>) -> Self {
        self.observer = observer;
        self
    }
}

/// Build routes: status, cron renewal, and the catch-all proxy
pub fn build_router(state: AppState) -> Router {
    use crate::proxy::handlers;

    Router::new()
        // Other methods on these paths are proxied like any unmatched route
        .route(
            "/",
            get(handlers::status::handle_status).fallback(handlers::forward::handle_forward),
        )
        .route(
            "/bakong/renew/cron",
            get(handlers::cron::handle_renew_cron).fallback(handlers::forward::handle_forward),
        )
        .fallback(handlers::forward::handle_forward)
        .layer(DefaultBodyLimit::max(100 * 1024 * 1024))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(axum::middleware::from_fn(
            crate::proxy::middleware::logging_middleware,
        ))
        .layer(axum::middleware::from_fn(
            crate::proxy::middleware::cors_middleware,
        ))
        .with_state(state)
}

/// Request span without the query string, which may carry the cron key
fn request_span(request: &Request) -> Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        version = ?request.version(),
    )
}

/// Axum server instance
pub struct AxumServer {
    shutdown_tx: Option<oneshot::Sender<()>>,
    local_addr: SocketAddr,
}

impl AxumServer {
    /// Start Axum server
    pub async fn start(
        host: &str,
        port: u16,
        state: AppState,
    ) -> Result<(Self, tokio::task::JoinHandle<()>), String> {
        let app = build_router(state);

        // Bind address
        let addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| format!("Failed to bind address {}: {}", addr, e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        tracing::info!("Gateway server started at http://{}", local_addr);

        // Create shutdown channel
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let server_instance = Self {
            shutdown_tx: Some(shutdown_tx),
            local_addr,
        };

        // Start server in new task
        let handle = tokio::spawn(async move {
            use hyper::server::conn::http1;
            use hyper_util::rt::TokioIo;
            use hyper_util::service::TowerToHyperService;

            loop {
                tokio::select! {
                    res = listener.accept() => {
                        match res {
                            Ok((stream, _)) => {
                                let io = TokioIo::new(stream);
                                let service = TowerToHyperService::new(app.clone());

                                tokio::task::spawn(async move {
                                    if let Err(err) = http1::Builder::new()
                                        .serve_connection(io, service)
                                        .await
                                    {
                                        debug!("Connection handling finished or errored: {:?}", err);
                                    }
                                });
                            }
                            Err(e) => {
                                error!("Failed to accept connection: {:?}", e);
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::info!("Gateway server stopped listening");
                        break;
                    }
                }
            }
        });

        Ok((server_instance, handle))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop server
    pub fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::logger::test_support::capture_logs;
    use axum::body::Body;

    #[test]
    fn test_request_span_omits_query() {
        let (captured, _guard) = capture_logs();

        let request = axum::http::Request::builder()
            .uri("/bakong/renew/cron?key=cron-s3cret")
            .body(Body::empty())
            .unwrap();
        let span = request_span(&request);
        let _entered = span.enter();
        debug!("handling");

        let output = captured.text();
        assert!(output.contains("path=/bakong/renew/cron"), "{}", output);
        assert!(!output.contains("cron-s3cret"), "{}", output);
    }
}
