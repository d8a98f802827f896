// crates/notify-server/src/front_door.rs
// ============================================================================
// Module: Front Door
// Description: Plain HTTP, static TLS, and ACME TLS listeners.
// Purpose: Serve the ingress router in the mode selected by configuration.
// Dependencies: axum, axum-server, rustls, rustls-acme, tokio, tracing
// ============================================================================

//! ## Overview
//! [`NotifyServer::serve`] picks one listener:
//! - `core.auto_tls.enabled`: certificates are ordered on demand for
//!   `auto_tls.host` and cached under `auto_tls.folder`. The ACME event
//!   stream is polled on a background task.
//! - `core.ssl.enabled`: static PEM certificate and key.
//! - otherwise plain HTTP.
//!
//! Every mode stops accepting connections when the shutdown future resolves
//! and lets in-flight requests finish within `core.shutdown_timeout_ms`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use notify_config::NotifyConfig;
use rustls_acme::AcmeConfig;
use rustls_acme::caches::DirCache;
use tokio_stream::StreamExt;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::error::ServerError;
use crate::ingress::AppState;
use crate::ingress::build_router;

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP server bound to one configuration.
pub struct NotifyServer {
    /// Active configuration.
    config: Arc<NotifyConfig>,
    /// Ingress routing table.
    router: Router,
}

impl NotifyServer {
    /// Builds the server from handler state.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        let config = Arc::clone(&state.config);
        Self {
            config,
            router: build_router(state),
        }
    }

    /// Returns a clone of the routing table.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serves until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the listener cannot bind or TLS material
    /// cannot be loaded.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let core = &self.config.core;
        if core.auto_tls.enabled {
            install_crypto_provider();
            let addr = core.auto_tls_addr()?;
            self.serve_acme(addr, shutdown).await
        } else if core.ssl.enabled {
            install_crypto_provider();
            let addr = core.http_addr()?;
            self.serve_static_tls(addr, shutdown).await
        } else {
            let addr = core.http_addr()?;
            self.serve_plain(addr, shutdown).await
        }
    }

    async fn serve_plain<F>(self, addr: SocketAddr, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|err| ServerError::Transport(format!("bind {addr}: {err}")))?;
        info!(%addr, "listening for http");
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|err| ServerError::Transport(err.to_string()))
    }

    async fn serve_static_tls<F>(self, addr: SocketAddr, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let ssl = &self.config.core.ssl;
        let (Some(cert), Some(key)) = (&ssl.cert_path, &ssl.key_path) else {
            return Err(ServerError::Tls("core.ssl requires cert_path and key_path".to_string()));
        };
        let tls = RustlsConfig::from_pem_file(cert, key)
            .await
            .map_err(|err| ServerError::Tls(format!("load certificate: {err}")))?;
        let handle = self.shutdown_handle(shutdown);
        info!(%addr, "listening for https");
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await
            .map_err(|err| ServerError::Transport(format!("serve {addr}: {err}")))
    }

    async fn serve_acme<F>(self, addr: SocketAddr, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let auto_tls = &self.config.core.auto_tls;
        let mut state = AcmeConfig::new([auto_tls.host.clone()])
            .contact(auto_tls.contact.iter().map(|email| format!("mailto:{email}")))
            .cache(DirCache::new(auto_tls.folder.clone()))
            .directory_lets_encrypt(auto_tls.production)
            .state();
        let acceptor = state.axum_acceptor(state.default_rustls_config());
        tokio::spawn(async move {
            while let Some(event) = state.next().await {
                match event {
                    Ok(ok) => info!(event = ?ok, "acme event"),
                    Err(err) => error!(error = %err, "acme error"),
                }
            }
        });
        let handle = self.shutdown_handle(shutdown);
        info!(
            %addr,
            host = %auto_tls.host,
            production = auto_tls.production,
            "listening for https with acme certificates"
        );
        axum_server::bind(addr)
            .acceptor(acceptor)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await
            .map_err(|err| ServerError::Transport(format!("serve {addr}: {err}")))
    }

    /// Returns a handle that starts graceful shutdown when `shutdown` resolves.
    fn shutdown_handle<F>(&self, shutdown: F) -> Handle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = Handle::new();
        let grace = Duration::from_millis(self.config.core.shutdown_timeout_ms);
        let trigger = handle.clone();
        tokio::spawn(async move {
            shutdown.await;
            trigger.graceful_shutdown(Some(grace));
        });
        handle
    }
}

/// Installs the process-wide rustls crypto provider if none is set.
fn install_crypto_provider() {
    if rustls::crypto::aws_lc_rs::default_provider().install_default().is_err() {
        warn!("rustls crypto provider already installed");
    }
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "ctrl-c handler failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "sigterm handler failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
