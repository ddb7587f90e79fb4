//! Auth Property Tests
//!
//! Validates identity round-trips and uniform login failures over generated
//! accounts.

mod common;

use auth_service::dto::{LoginRequest, RegisterRequest};
use proptest::prelude::*;
use test_utils::{account_strategy, password_strategy};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Property: register followed by verify yields the registered identity
    #[test]
    fn prop_register_then_verify_same_user((username, email, password) in account_strategy()) {
        let rt = runtime();
        let accounts = common::accounts();

        let session = rt.block_on(accounts.register(RegisterRequest {
            username: Some(username.clone()),
            email: Some(email.clone()),
            password: Some(password),
        })).unwrap();

        let header = format!("Bearer {}", session.tokens.access_token);
        let verified = accounts.verify(Some(&header)).unwrap();

        prop_assert_eq!(verified.id, session.user.id);
        prop_assert_eq!(verified.username, username);
        prop_assert_eq!(verified.email, email);
    }

    /// Property: wrong password and unknown email fail with the same message
    #[test]
    fn prop_login_failures_identical(
        (username, email, password) in account_strategy(),
        wrong in password_strategy(),
    ) {
        prop_assume!(wrong != password);
        let rt = runtime();
        let accounts = common::accounts();

        rt.block_on(accounts.register(RegisterRequest {
            username: Some(username),
            email: Some(email.clone()),
            password: Some(password.clone()),
        })).unwrap();

        let bad_password = rt.block_on(accounts.login(LoginRequest {
            email: Some(email),
            password: Some(wrong),
        })).unwrap_err();
        let bad_email = rt.block_on(accounts.login(LoginRequest {
            email: Some("nobody@nowhere.test".to_string()),
            password: Some(password),
        })).unwrap_err();

        prop_assert_eq!(bad_password.status(), bad_email.status());
        prop_assert_eq!(bad_password.to_string(), bad_email.to_string());
    }
}
