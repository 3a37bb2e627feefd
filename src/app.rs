use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::{
    auth::{AuthenticationFlow, PasswordHasher, TokenIssuer},
    config::{AuthConfig, Config},
    cors::build_cors_layer,
    error::{OrgAuthError, Result},
    http,
    members::MemberManager,
    middleware::MakeRequestUuid,
    repository::UserRepository,
};

/// Shared state handed to every handler.
///
/// All parts are cheap to clone and safe to use from concurrent requests.
#[derive(Clone)]
pub struct AppState {
    pub flow: AuthenticationFlow,
    pub members: MemberManager,
    pub issuer: TokenIssuer,
}

impl AppState {
    pub fn new(repo: Arc<dyn UserRepository>, hasher: PasswordHasher, auth: &AuthConfig) -> Self {
        let issuer = TokenIssuer::new(auth.jwt_secret.as_bytes());
        let flow = AuthenticationFlow::new(
            repo.clone(),
            hasher,
            issuer.clone(),
            Duration::from_secs(auth.token_ttl_seconds),
            auth.cookie_secure,
        );

        Self {
            flow,
            members: MemberManager::new(repo),
            issuer,
        }
    }
}

/// The HTTP service: routes, middleware stack and listener.
pub struct App {
    config: Config,
    state: AppState,
}

impl App {
    pub fn new(config: Config, state: AppState) -> Self {
        Self { config, state }
    }

    /// The fully layered router, ready to serve or to drive from tests.
    pub fn router(&self) -> Router {
        let mut router = http::router(self.state.clone());

        // Layers wrap outward: CORS, then request id, then tracing outermost.
        if let Some(cors_layer) = build_cors_layer(&self.config.cors) {
            router = router.layer(cors_layer);
        }

        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the configured address and serve until SIGINT or SIGTERM.
    pub async fn serve(self) -> Result<()> {
        let addr = self
            .config
            .server
            .addr()
            .map_err(|e| OrgAuthError::bad_request(format!("invalid server address: {}", e)))?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| OrgAuthError::internal(format!("failed to bind {}: {}", addr, e)))?;

        tracing::info!("Server starting on http://{}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| OrgAuthError::internal(format!("server error: {}", e)))
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
