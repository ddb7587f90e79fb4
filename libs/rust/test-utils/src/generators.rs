//! Shared proptest generators.

use proptest::prelude::*;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Generate usernames accepted by registration.
pub fn username_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{2,19}"
}

/// Generate syntactically plain email addresses.
pub fn email_strategy() -> impl Strategy<Value = String> {
    ("[a-z][a-z0-9.]{0,15}", "[a-z]{2,10}", "[a-z]{2,4}")
        .prop_map(|(local, domain, tld)| format!("{local}@{domain}.{tld}"))
}

/// Generate non-empty passwords.
pub fn password_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9!@#$%^&*]{6,24}"
}

/// Generate a `(username, email, password)` registration triple.
pub fn account_strategy() -> impl Strategy<Value = (String, String, String)> {
    (username_strategy(), email_strategy(), password_strategy())
}

/// Generate a relative path of one to four URL-safe segments, no leading slash.
pub fn path_tail_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9-]{1,12}", 1..4).prop_map(|segments| segments.join("/"))
}

/// Generate HTTP methods a proxied route accepts.
pub fn http_method_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("GET"), Just("POST"), Just("PUT"), Just("DELETE")]
}

/// Generate client IPv4 addresses.
pub fn client_ip_strategy() -> impl Strategy<Value = IpAddr> {
    any::<[u8; 4]>().prop_map(|o| IpAddr::V4(Ipv4Addr::new(o[0], o[1], o[2], o[3])))
}

/// Generate printable, non-empty header values.
pub fn header_value_strategy() -> impl Strategy<Value = String> {
    "[!-~]{1,64}"
}

/// Generate rate-limit windows (1 second to 1 hour).
pub fn window_strategy() -> impl Strategy<Value = Duration> {
    (1u64..3600).prop_map(Duration::from_secs)
}
