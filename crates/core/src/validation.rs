//! Input validation for endpoint registration.
//!
//! - URL shape: absolute, `http` or `https`, with a host.
//! - Destination host: not loopback, private, link-local, CGNAT or a
//!   well-known internal name, unless the deployment allows private hosts.
//! - Subscription patterns: non-empty list of two-segment patterns.

use std::net::IpAddr;

use crate::error::CoreError;
use crate::matching::{EventPattern, WILDCARD};

/// Registration-time policy knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndpointPolicy {
    /// Skip the internal-address check (local development and tests).
    pub allow_private_hosts: bool,
}

// ---------------------------------------------------------------------------
// URL validation
// ---------------------------------------------------------------------------

/// Validate an endpoint URL and return it trimmed.
pub fn validate_endpoint_url(url: &str, policy: EndpointPolicy) -> Result<String, CoreError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(CoreError::Validation("url must not be empty".into()));
    }

    let parsed = url::Url::parse(url)
        .map_err(|e| CoreError::Validation(format!("url is not a valid absolute URL: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(CoreError::Validation(format!(
                "url scheme must be http or https, got {scheme}"
            )));
        }
    }

    let host = match parsed.host() {
        Some(url::Host::Domain(d)) if !d.is_empty() => {
            // `localhost.` and `localhost` name the same host.
            let d = d.strip_suffix('.').unwrap_or(d);
            HostKind::Name(d.to_ascii_lowercase())
        }
        Some(url::Host::Ipv4(v4)) => HostKind::Ip(IpAddr::V4(v4)),
        Some(url::Host::Ipv6(v6)) => HostKind::Ip(IpAddr::V6(v6)),
        _ => return Err(CoreError::Validation("url must have a host".into())),
    };

    if !policy.allow_private_hosts {
        host.ensure_public()?;
    }

    Ok(url.to_string())
}

enum HostKind {
    Name(String),
    Ip(IpAddr),
}

impl HostKind {
    fn ensure_public(&self) -> Result<(), CoreError> {
        let internal = match self {
            HostKind::Ip(ip) => is_internal_ip(ip),
            HostKind::Name(name) => {
                name == "localhost"
                    || name.ends_with(".localhost")
                    || name.ends_with(".internal")
                    || name.ends_with(".local")
            }
        };
        if internal {
            return Err(CoreError::Validation(
                "url host resolves to a private or internal address".into(),
            ));
        }
        Ok(())
    }
}

/// Whether an IP address belongs to a private/internal range.
pub fn is_internal_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                || a == 0 // 0.0.0.0/8
                || (a == 100 && (b & 0xC0) == 64) // 100.64.0.0/10
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_internal_ip(&IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00 // fc00::/7 unique local
                || (first & 0xffc0) == 0xfe80 // fe80::/10 link local
        }
    }
}

// ---------------------------------------------------------------------------
// Pattern validation
// ---------------------------------------------------------------------------

/// Validate subscription patterns and return them trimmed, with duplicates
/// removed (first occurrence wins).
pub fn validate_event_patterns(events: &[String]) -> Result<Vec<String>, CoreError> {
    if events.is_empty() {
        return Err(CoreError::Validation("events must not be empty".into()));
    }

    let mut out: Vec<String> = Vec::with_capacity(events.len());
    for raw in events {
        let pattern = raw.trim();
        let well_formed = EventPattern::parse(pattern).is_some()
            && pattern
                .split('.')
                .all(|segment| segment == WILDCARD || is_event_name(segment));
        if !well_formed {
            return Err(CoreError::Validation(format!(
                "invalid event pattern '{pattern}': expected ResourceType.action, either may be *"
            )));
        }
        if !out.iter().any(|p| p == pattern) {
            out.push(pattern.to_string());
        }
    }
    Ok(out)
}

/// Whether `segment` is a valid resource type or action name.
///
/// Names are restricted to ASCII letters, digits, `-` and `_` so an event
/// type is always a legal HTTP header value.
pub fn is_event_name(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Reject blank tenant identifiers.
pub fn validate_tenant_id(tenant_id: &str) -> Result<String, CoreError> {
    let tenant_id = tenant_id.trim();
    if tenant_id.is_empty() {
        return Err(CoreError::Validation("tenant_id must not be empty".into()));
    }
    Ok(tenant_id.to_string())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const STRICT: EndpointPolicy = EndpointPolicy {
        allow_private_hosts: false,
    };
    const LENIENT: EndpointPolicy = EndpointPolicy {
        allow_private_hosts: true,
    };

    // --- URL shape ---

    #[test]
    fn accepts_https_and_http() {
        assert!(validate_endpoint_url("https://hooks.example.com/fhir", STRICT).is_ok());
        assert!(validate_endpoint_url("http://hooks.example.com:8080/x", STRICT).is_ok());
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let url = validate_endpoint_url("  https://hooks.example.com  ", STRICT).unwrap();
        assert_eq!(url, "https://hooks.example.com");
    }

    #[test]
    fn rejects_empty_url() {
        assert_matches!(
            validate_endpoint_url("   ", STRICT),
            Err(CoreError::Validation(msg)) if msg.contains("empty")
        );
    }

    #[test]
    fn rejects_other_schemes() {
        for url in ["ftp://example.com/x", "file:///etc/passwd", "mailto:a@example.com"] {
            assert_matches!(validate_endpoint_url(url, STRICT), Err(CoreError::Validation(_)));
        }
    }

    #[test]
    fn rejects_relative_url() {
        assert_matches!(
            validate_endpoint_url("/webhooks/receive", STRICT),
            Err(CoreError::Validation(_))
        );
    }

    // --- Internal hosts ---

    #[test]
    fn rejects_internal_hosts_by_default() {
        for url in [
            "http://127.0.0.1/hook",
            "http://10.1.2.3/hook",
            "http://192.168.1.10/hook",
            "http://169.254.169.254/latest/meta-data",
            "http://100.64.0.1/hook",
            "http://[::1]/hook",
            "http://[fd00::1]/hook",
            "http://localhost:8080/hook",
            "http://metadata.google.internal/",
            "http://printer.local/",
            "http://localhost./",
            "http://LOCALHOST./hook",
            "http://metadata.google.internal./",
            "http://0.1.2.3/",
        ] {
            assert_matches!(
                validate_endpoint_url(url, STRICT),
                Err(CoreError::Validation(_)),
                "expected {url} to be rejected"
            );
        }
    }

    #[test]
    fn allows_internal_hosts_when_permitted() {
        assert!(validate_endpoint_url("http://127.0.0.1:9000/hook", LENIENT).is_ok());
        assert!(validate_endpoint_url("http://localhost/hook", LENIENT).is_ok());
    }

    #[test]
    fn public_ip_is_allowed() {
        assert!(validate_endpoint_url("https://93.184.216.34/hook", STRICT).is_ok());
    }

    #[test]
    fn ipv4_mapped_ipv6_is_checked() {
        let ip: IpAddr = "::ffff:127.0.0.1".parse().unwrap();
        assert!(is_internal_ip(&ip));
    }

    // --- Patterns ---

    #[test]
    fn rejects_empty_events() {
        assert_matches!(validate_event_patterns(&[]), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_malformed_pattern() {
        let events = vec!["Patient.create".to_string(), "Patient".to_string()];
        assert_matches!(
            validate_event_patterns(&events),
            Err(CoreError::Validation(msg)) if msg.contains("'Patient'")
        );
    }

    #[test]
    fn rejects_patterns_with_control_or_symbol_characters() {
        for pattern in ["Patient.cre\u{1}ate", "Pati ent.create", "Patient.cre:ate", "Patient.**"] {
            assert_matches!(
                validate_event_patterns(&[pattern.to_string()]),
                Err(CoreError::Validation(_)),
                "expected {pattern:?} to be rejected"
            );
        }
    }

    #[test]
    fn event_names_are_ascii_words() {
        assert!(is_event_name("Patient"));
        assert!(is_event_name("create"));
        assert!(is_event_name("Medication_Request-v2"));
        assert!(!is_event_name(""));
        assert!(!is_event_name("*"));
        assert!(!is_event_name("a.b"));
        assert!(!is_event_name("cre\u{1}ate"));
        assert!(!is_event_name("Patiënt"));
    }

    #[test]
    fn removes_duplicates_keeping_order() {
        let events = vec![
            "*.delete".to_string(),
            "Patient.create".to_string(),
            " *.delete ".to_string(),
        ];
        assert_eq!(
            validate_event_patterns(&events).unwrap(),
            vec!["*.delete".to_string(), "Patient.create".to_string()]
        );
    }

    #[test]
    fn blank_tenant_is_rejected() {
        assert_matches!(validate_tenant_id(" "), Err(CoreError::Validation(_)));
        assert_eq!(validate_tenant_id(" t-1 ").unwrap(), "t-1");
    }
}
