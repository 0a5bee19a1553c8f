use std::{net::SocketAddr, path::PathBuf};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use clap::Parser;
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;

use tcash::{
    setup_logging,
    stub::{StubLedger, build_router},
};

/// An in-memory ledger API for trying out the T-Cash client locally.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Reject requests that do not carry this bearer token.
    #[arg(long)]
    token: Option<String>,

    /// Also write debug logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let args = Args::parse();
    setup_logging(args.log_file.as_deref());

    let ledger = StubLedger::new();
    if let Some(token) = &args.token {
        ledger.require_token(token);
    }

    let router = add_tracing_layer(build_router(ledger));

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Stub ledger listening on http://{addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // The handlers already log rejected requests.
        .on_failure(());

    router.layer(tracing_layer)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Could not listen for Ctrl+C: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("Could not listen for SIGTERM: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::debug!("Received ctrl+c signal."),
        _ = terminate => tracing::debug!("Received terminate signal."),
    }
}
