use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{
    api,
    error::{Error, Result},
    types::PendingSignIn,
};

pub async fn bind(addr: &str) -> Result<TcpListener> {
    let addr = SocketAddr::from_str(addr)
        .map_err(|e| Error::Config(format!("invalid SERVER_ADDRESS {}: {}", addr, e)))?;
    TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Config(format!("cannot bind callback server to {}: {}", addr, e)))
}

pub fn router(state: Arc<Mutex<Option<PendingSignIn>>>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback).layer(Extension(state)))
}

pub async fn start_api_server(
    listener: TcpListener,
    state: Arc<Mutex<Option<PendingSignIn>>>,
) -> Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}
