//! TCP listeners and the accept loop that hands connections to
//! [`dispatch_request`].

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use futures_util::future;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
#[cfg(unix)]
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::routing::dispatch::{dispatch_request, normalize_base_path};
use crate::state::AppState;

/// Pause after a failed `accept`. Errors such as EMFILE persist until some
/// connection closes, so retrying immediately would only spin.
pub const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(50);

#[cfg(unix)]
const LISTEN_BACKLOG: i32 = 1024;

/// Bind, log and serve until the process exits.
///
/// # Errors
///
/// Returns the bind error when no listener can be opened.
pub async fn run(state: Arc<AppState>) -> io::Result<()> {
    let server = &state.config.server;
    let base_path: Arc<str> = Arc::from(normalize_base_path(&server.base_path));
    let listeners = bind_listeners(server).await?;
    tracing::info!(
        host = %server.host,
        port = server.port,
        base_path = %base_path,
        listeners = listeners.len(),
        node_id = %state.config.engine.node_id,
        random_source = state.generator.random_source_name(),
        "uuidify listening"
    );
    serve(listeners, state, base_path).await;
    Ok(())
}

/// Open one listener, or `tcp_reuse_port_listener_count` SO_REUSEPORT
/// listeners on platforms that support it.
///
/// # Errors
///
/// Returns the resolution or bind error.
pub async fn bind_listeners(server: &ServerConfig) -> io::Result<Vec<TcpListener>> {
    let count = match server.tcp_reuse_port_listener_count {
        Some(count) if count > 1 && cfg!(unix) => count,
        Some(count) if count > 1 => {
            tracing::warn!(
                "SO_REUSEPORT is not available on this platform; using a single listener"
            );
            1
        }
        _ => 1,
    };
    if count == 1 {
        let listener = TcpListener::bind((server.host.as_str(), server.port)).await?;
        return Ok(vec![listener]);
    }

    let addr = tokio::net::lookup_host((server.host.as_str(), server.port))
        .await?
        .next()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no address for {}:{}", server.host, server.port),
            )
        })?;
    (0..count).map(|_| bind_reuse_port(addr)).collect()
}

#[cfg(unix)]
fn bind_reuse_port(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_reuse_port(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    TcpListener::from_std(socket.into())
}

#[cfg(not(unix))]
fn bind_reuse_port(_addr: SocketAddr) -> io::Result<TcpListener> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "SO_REUSEPORT is only supported on Unix-like platforms",
    ))
}

/// Run one accept loop per listener, each on its own task.
pub async fn serve(listeners: Vec<TcpListener>, state: Arc<AppState>, base_path: Arc<str>) {
    let conn_builder = AutoBuilder::new(TokioExecutor::new());
    let loops = listeners.into_iter().map(|listener| {
        tokio::spawn(accept_loop(
            listener,
            conn_builder.clone(),
            Arc::clone(&state),
            Arc::clone(&base_path),
        ))
    });
    for finished in future::join_all(loops).await {
        if let Err(err) = finished {
            tracing::error!("accept loop stopped: {err}");
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    conn_builder: AutoBuilder<TokioExecutor>,
    state: Arc<AppState>,
    base_path: Arc<str>,
) {
    loop {
        let (stream, remote_addr) = accept_with_backoff(|| listener.accept()).await;
        spawn_connection(stream, remote_addr, &conn_builder, &state, &base_path);
    }
}

/// Call `accept` until it succeeds, logging each failure and sleeping
/// [`ACCEPT_RETRY_DELAY`] before the next attempt.
pub async fn accept_with_backoff<T, F, Fut>(mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(accepted) => return accepted,
            Err(err) => {
                tracing::warn!(error = %err, retry_in = ?ACCEPT_RETRY_DELAY, "accept failed");
                tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
            }
        }
    }
}

fn spawn_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    conn_builder: &AutoBuilder<TokioExecutor>,
    state: &Arc<AppState>,
    base_path: &Arc<str>,
) {
    if let Err(err) = stream.set_nodelay(true) {
        tracing::debug!(%remote_addr, "TCP_NODELAY not set: {err}");
    }
    let conn_builder = conn_builder.clone();
    let state = Arc::clone(state);
    let base_path = Arc::clone(base_path);
    let service = service_fn(move |request: Request<Incoming>| {
        dispatch_request(
            Arc::clone(&state),
            Arc::clone(&base_path),
            request.map(Body::new),
        )
    });
    tokio::spawn(async move {
        if let Err(err) = conn_builder
            .serve_connection(TokioIo::new(stream), service)
            .await
        {
            tracing::debug!(%remote_addr, "connection ended with error: {err:#}");
        }
    });
}
