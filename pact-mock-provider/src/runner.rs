use crate::{error::Error, mock_provider::RequestHandler, transport};
use hyper::{
    service::{make_service_fn, service_fn},
    Body, Request, Response, Server, StatusCode,
};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio::{sync::oneshot, task::JoinHandle};

/// A bound hyper server running on a spawned tokio task.
#[derive(Debug)]
pub(crate) struct RunningServer {
    address: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<()>>,
}

impl RunningServer {
    pub(crate) fn address(&self) -> SocketAddr {
        self.address
    }

    /// Stops accepting connections, lets in-flight requests finish within `grace`, then
    /// abandons whatever is left.
    pub(crate) async fn stop(mut self, grace: Duration) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        if let Some(mut join_handle) = self.join_handle.take() {
            if tokio::time::timeout(grace, &mut join_handle).await.is_err() {
                tracing::warn!(address = %self.address, ?grace, "Abandoning in-flight requests");
                join_handle.abort();
                let _ = join_handle.await;
            }
        }

        tracing::info!(address = %self.address, "Mock provider stopped");
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(join_handle) = self.join_handle.take() {
            join_handle.abort();
        }
    }
}

/// Binds `address` and starts serving. Must be called from within a tokio runtime.
pub(crate) fn start(
    address: SocketAddr,
    handler: Arc<RequestHandler>,
) -> Result<RunningServer, Error> {
    let builder = Server::try_bind(&address)?;

    let server = builder.serve(make_service_fn(move |_| {
        let handler = handler.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |request| {
                let handler = handler.clone();
                async move { Ok::<_, Infallible>(handle_request(&handler, request).await) }
            }))
        }
    }));

    let address = server.local_addr();
    let (shutdown, shutdown_signal) = oneshot::channel::<()>();
    let server = server.with_graceful_shutdown(async {
        let _ = shutdown_signal.await;
    });

    let join_handle = tokio::spawn(async move {
        if let Err(e) = server.await {
            tracing::error!(error = %e, "Mock provider server error");
        }
    });

    tracing::info!(%address, "Mock provider listening");

    Ok(RunningServer {
        address,
        shutdown: Some(shutdown),
        join_handle: Some(join_handle),
    })
}

async fn handle_request(handler: &RequestHandler, request: Request<Body>) -> Response<Body> {
    let request = match transport::decode(request).await {
        Ok(request) => request,
        Err(e) => {
            tracing::error!(error = %e, "Couldn't read the request");
            return internal_error();
        }
    };

    match transport::encode(&handler.handle(request)) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Couldn't write the response");
            internal_error()
        }
    }
}

fn internal_error() -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}
