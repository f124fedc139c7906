//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::ws::WebSocket;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use modmux::{BoxError, DispatcherContext, HandlerSink, Module, ServerKind};

/// Bind an ephemeral port and serve the context in the background.
pub async fn spawn_server(ctx: &DispatcherContext) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let ctx = ctx.clone();
    tokio::spawn(async move {
        ctx.run(listener).await.unwrap();
    });
    addr
}

/// Primary module serving a fixed body under `<context_path>/hello`.
pub struct EchoModule {
    context_path: &'static str,
    body: &'static str,
    activations: AtomicUsize,
    fail_next: AtomicBool,
}

impl EchoModule {
    pub fn new(context_path: &'static str, body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            context_path,
            body,
            activations: AtomicUsize::new(0),
            fail_next: AtomicBool::new(false),
        })
    }

    /// Variant whose first activation attempt fails.
    pub fn failing_once(context_path: &'static str, body: &'static str) -> Arc<Self> {
        let module = Self::new(context_path, body);
        module.fail_next.store(true, Ordering::SeqCst);
        module
    }

    pub fn activations(&self) -> usize {
        self.activations.load(Ordering::SeqCst)
    }
}

impl Module for EchoModule {
    fn context_path(&self) -> &str {
        self.context_path
    }

    fn kind(&self) -> ServerKind {
        ServerKind::Primary
    }

    fn activate(&self, sink: HandlerSink) -> Result<(), BoxError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err("setup failed".into());
        }
        let HandlerSink::Routes(routes) = sink else {
            return Err("expected a route sink".into());
        };
        self.activations.fetch_add(1, Ordering::SeqCst);
        let body = self.body;
        routes.mount(Router::new().route(
            &format!("{}/hello", self.context_path),
            get(move || async move { body }),
        ));
        Ok(())
    }
}

/// Primary module whose first activation mounts routes and then fails; the
/// retry mounts a fresh router with a different body.
pub struct RecoveringModule {
    context_path: &'static str,
    attempts: AtomicUsize,
}

impl RecoveringModule {
    pub fn new(context_path: &'static str) -> Arc<Self> {
        Arc::new(Self {
            context_path,
            attempts: AtomicUsize::new(0),
        })
    }
}

impl Module for RecoveringModule {
    fn context_path(&self) -> &str {
        self.context_path
    }

    fn kind(&self) -> ServerKind {
        ServerKind::Primary
    }

    fn activate(&self, sink: HandlerSink) -> Result<(), BoxError> {
        let HandlerSink::Routes(routes) = sink else {
            return Err("expected a route sink".into());
        };
        let route = format!("{}/hello", self.context_path);
        if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
            routes.mount(Router::new().route(&route, get(|| async { "partial" })));
            return Err("setup failed".into());
        }
        routes.mount(Router::new().route(&route, get(|| async { "ready" })));
        Ok(())
    }
}

/// Streaming module echoing every frame back to the client.
pub struct WsEchoModule {
    context_path: &'static str,
    activations: AtomicUsize,
}

impl WsEchoModule {
    pub fn new(context_path: &'static str) -> Arc<Self> {
        Arc::new(Self {
            context_path,
            activations: AtomicUsize::new(0),
        })
    }

    pub fn activations(&self) -> usize {
        self.activations.load(Ordering::SeqCst)
    }
}

impl Module for WsEchoModule {
    fn context_path(&self) -> &str {
        self.context_path
    }

    fn kind(&self) -> ServerKind {
        ServerKind::Streaming
    }

    fn activate(&self, sink: HandlerSink) -> Result<(), BoxError> {
        let HandlerSink::Stream(stream) = sink else {
            return Err("expected a stream sink".into());
        };
        self.activations.fetch_add(1, Ordering::SeqCst);
        stream.accept(|mut socket: WebSocket| async move {
            while let Some(Ok(msg)) = socket.recv().await {
                if socket.send(msg).await.is_err() {
                    break;
                }
            }
        });
        Ok(())
    }
}
