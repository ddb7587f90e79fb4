//! Gateway Property Tests

mod common;

use axum::http::{Method, StatusCode};
use common::{app, config, request_from};
use proptest::prelude::*;
use test_utils::{client_ip_strategy, http_method_strategy, path_tail_strategy};
use tower::ServiceExt;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: the orders gate rejects every path and method without a header
    #[test]
    fn prop_orders_gate_independent_of_path(
        tail in path_tail_strategy(),
        method in http_method_strategy(),
        ip in client_ip_strategy(),
    ) {
        let rt = runtime();
        let (app, _) = app(&config(None, None, None));
        let method = Method::from_bytes(method.as_bytes()).unwrap();
        let request = request_from(method, &format!("/api/orders/{tail}"), &format!("{ip}:4000"));

        let response = rt.block_on(app.oneshot(request)).unwrap();

        prop_assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    /// Property: a client is allowed exactly `max` requests per window
    #[test]
    fn prop_global_limit_counts_exactly(max in 1u32..15, extra in 1u32..5) {
        let rt = runtime();
        let mut config = config(None, None, None);
        config.rate_limit_max = max;
        let (app, _) = app(&config);

        let statuses: Vec<StatusCode> = rt.block_on(async {
            let mut out = Vec::new();
            for _ in 0..(max + extra) {
                let response = app
                    .clone()
                    .oneshot(request_from(Method::GET, "/health", "192.0.2.50:9000"))
                    .await
                    .unwrap();
                out.push(response.status());
            }
            out
        });

        let allowed = statuses.iter().filter(|s| **s == StatusCode::OK).count();
        prop_assert_eq!(allowed, max as usize);
        prop_assert!(statuses[max as usize..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
    }
}
