//! Shared setup for auth service tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use auth_service::password::BcryptHasher;
use auth_service::store::MemoryCredentialStore;
use auth_service::token::TokenService;
use auth_service::{router, AccountService, AppState};
use axum::Router;
use secrecy::SecretString;

pub const TEST_SECRET: &str = "test-signing-secret";

pub fn token_service() -> TokenService {
    TokenService::new(
        &SecretString::from(TEST_SECRET.to_string()),
        Duration::from_secs(900),
        Duration::from_secs(7 * 24 * 3600),
    )
    .unwrap()
}

pub fn accounts_with_store() -> (AccountService, Arc<MemoryCredentialStore>) {
    let store = Arc::new(MemoryCredentialStore::new());
    let accounts = AccountService::new(store.clone(), token_service(), Arc::new(BcryptHasher::new(4)));
    (accounts, store)
}

pub fn accounts() -> AccountService {
    accounts_with_store().0
}

pub fn app() -> Router {
    router(AppState { accounts: accounts() }, "*")
}
