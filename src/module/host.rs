//! Ingress hostname naming

use crate::config::HostPolicy;

const DEFAULT_DELIMITER: &str = "-";

/// Compute the hostname for a resource from the module's naming policy
///
/// Returns an empty string when there is no policy, which callers treat as "leave the host
/// alone". A fixed `hostname` wins outright; otherwise the last `/` segment of `base_name`
/// is decorated with the prefix (joined by the delimiter) and the wildcard domain.
pub fn compute_host(policy: Option<&HostPolicy>, base_name: &str) -> String {
    let Some(policy) = policy else {
        return String::new();
    };

    if !policy.hostname.is_empty() {
        return policy.hostname.clone();
    }

    let mut host = base_name
        .rsplit('/')
        .next()
        .unwrap_or(base_name)
        .to_string();

    if !policy.prefix.is_empty() {
        let delimiter = if policy.delimiter.is_empty() {
            DEFAULT_DELIMITER
        } else {
            policy.delimiter.as_str()
        };
        host = format!("{}{delimiter}{host}", policy.prefix);
    }

    if !policy.wildcard.is_empty() {
        host = format!("{host}.{}", policy.wildcard);
    }

    host
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(prefix: &str, wildcard: &str, hostname: &str, delimiter: &str) -> HostPolicy {
        HostPolicy {
            prefix: prefix.to_string(),
            wildcard: wildcard.to_string(),
            hostname: hostname.to_string(),
            delimiter: delimiter.to_string(),
        }
    }

    #[test]
    fn test_no_policy_means_no_host() {
        assert_eq!(compute_host(None, "test-ingress"), "");
    }

    #[test]
    fn test_prefix_only() {
        let p = policy("infra", "", "", "");
        assert_eq!(compute_host(Some(&p), "test-ingress"), "infra-test-ingress");
    }

    #[test]
    fn test_prefix_and_wildcard() {
        let p = policy("infra", "example.com", "", "");
        assert_eq!(
            compute_host(Some(&p), "test-ingress"),
            "infra-test-ingress.example.com"
        );
    }

    #[test]
    fn test_fixed_hostname_wins() {
        let p = policy("infra", "example.com", "fixed.io", ".");
        assert_eq!(compute_host(Some(&p), "test-ingress"), "fixed.io");
    }

    #[test]
    fn test_custom_delimiter() {
        let p = policy("infra", "", "", ".");
        assert_eq!(compute_host(Some(&p), "web"), "infra.web");
    }

    #[test]
    fn test_wildcard_always_uses_dot() {
        let p = policy("", "example.com", "", "_");
        assert_eq!(compute_host(Some(&p), "web"), "web.example.com");
    }

    #[test]
    fn test_empty_policy_gives_bare_name() {
        let p = HostPolicy::default();
        assert_eq!(compute_host(Some(&p), "monitoring/grafana"), "grafana");
    }
}
