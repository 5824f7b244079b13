//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use users_sdk::{RegisterRequest, User, UsersClient};

use user_service::config::ServiceConfig;
use user_service::http::HttpServer;
use user_service::lifecycle::Shutdown;
use user_service::users::MemoryUserStore;

pub const PASSWORD: &str = "pa55word";

/// A running service bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> UsersClient {
        UsersClient::new(&self.url())
    }

    /// Trigger shutdown and wait for the server task to finish.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.handle.await;
    }
}

/// Defaults with the limiter off, so flow tests are not throttled.
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.rate_limit.enabled = false;
    config
}

pub async fn spawn_server(config: ServiceConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, Arc::new(MemoryUserStore::new()));
    let handle = tokio::spawn(server.run(listener, shutdown.clone()));

    TestServer {
        addr,
        shutdown,
        handle,
    }
}

/// Serve an arbitrary router with client addresses attached.
pub async fn serve_router(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .unwrap();
    });

    addr
}

pub fn registration(email: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.into(),
        password: PASSWORD.into(),
        first_name: "Jon".into(),
        last_name: "Doe".into(),
    }
}

/// Register `email` and return the account plus a client carrying its token.
pub async fn signed_in(client: &UsersClient, email: &str) -> (User, UsersClient) {
    let user = client.register(&registration(email)).await.unwrap();
    let token = client.login(email, PASSWORD).await.unwrap();
    (user, client.with_token(token))
}
