//! Test fixtures with sample data.

use std::net::SocketAddr;

use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Registration credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleAccount {
    /// Handle
    pub username: String,
    /// Email
    pub email: String,
    /// Plaintext password
    pub password: String,
}

impl SampleAccount {
    /// The canonical `alice` account.
    #[must_use]
    pub fn alice() -> Self {
        Self::new("alice", "alice@x.com", "secret1")
    }

    /// A second, unrelated account.
    #[must_use]
    pub fn bob() -> Self {
        Self::new("bob", "bob@x.com", "hunter22")
    }

    /// Builds an account from parts.
    #[must_use]
    pub fn new(username: &str, email: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    /// `POST /auth/register` body.
    #[must_use]
    pub fn register_body(&self) -> Value {
        json!({
            "username": self.username,
            "email": self.email,
            "password": self.password,
        })
    }

    /// `POST /auth/login` body.
    #[must_use]
    pub fn login_body(&self) -> Value {
        json!({ "email": self.email, "password": self.password })
    }
}

/// An account whose username and email are unique per call, for suites that
/// share a database.
#[must_use]
pub fn unique_account() -> SampleAccount {
    let tag = uuid::Uuid::new_v4().simple().to_string();
    let tag = &tag[..12];
    SampleAccount::new(&format!("user_{tag}"), &format!("{tag}@example.com"), "secret1")
}

/// Serves `router` on an ephemeral localhost port, with peer addresses
/// available to handlers, and returns the bound address.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        let _ = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;
    });

    addr
}
