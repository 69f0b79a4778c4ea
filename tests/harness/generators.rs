// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test data generators for form submissions and attack simulation.

use serde_json::json;
use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of client IP addresses.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// A contact payload that passes validation.
pub fn contact_payload(i: usize) -> String {
    json!({
        "name": "Grace Hopper",
        "email": format!("grace{i}@example.com"),
        "phone": "+1 555 010 2030",
        "message": format!("Hello, I would like to discuss project number {i} with your team"),
    })
    .to_string()
}

/// A newsletter payload that passes validation.
pub fn newsletter_payload(i: usize) -> String {
    json!({ "email": format!("reader{i}@example.org") }).to_string()
}

/// Bodies that must never get past validation.
pub fn junk_payloads() -> Vec<String> {
    vec![
        String::new(),
        "not json at all".to_string(),
        "[]".to_string(),
        "42".to_string(),
        "null".to_string(),
        "{".to_string(),
        json!({}).to_string(),
        json!({ "email": "" }).to_string(),
        json!({ "email": "no-at-sign" }).to_string(),
        json!({ "email": ["a@example.com"] }).to_string(),
        json!({ "email": "a@example.com", "phone": "call me", "message": "short" }).to_string(),
        json!({
            "name": "<script>alert(1)</script>",
            "email": "a@example.com",
            "phone": "+1 555 010 2030",
            "message": "this message is long enough and has words",
        })
        .to_string(),
    ]
}

/// User agents of automation clients.
pub fn automated_agents() -> Vec<Option<&'static str>> {
    vec![
        None,
        Some("curl/8.7.1"),
        Some("Wget/1.21.4"),
        Some("python-requests/2.32.3"),
        Some("Go-http-client/2.0"),
        Some("Mozilla/5.0 (X11; Linux x86_64) HeadlessChrome/125.0.0.0"),
        Some("okhttp/4.12.0"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ips() {
        let ips = generate_ips(256);
        assert_eq!(ips.len(), 256);
        // All should be unique
        let unique: std::collections::HashSet<_> = ips.iter().collect();
        assert_eq!(unique.len(), 256);
    }

    #[test]
    fn test_payloads_are_json_objects() {
        for body in [contact_payload(1), newsletter_payload(1)] {
            let value: serde_json::Value = serde_json::from_str(&body).unwrap();
            assert!(value.is_object());
        }
    }
}
