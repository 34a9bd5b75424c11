//! Hostname syntax and suffix matching. Comparisons ignore ASCII case.

const MAX_HOSTNAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Syntactic DNS check for a server hostname: at least two labels, LDH
/// labels of 1..=63 chars without edge hyphens, and an alphabetic (or
/// punycode) top-level label. IP literals, `localhost` and trailing dots
/// are rejected.
pub fn is_valid_hostname(hostname: &str) -> bool {
    if hostname.is_empty() || hostname.len() > MAX_HOSTNAME_LEN {
        return false;
    }
    let labels: Vec<&str> = hostname.split('.').collect();
    if labels.len() < 2 || !labels.iter().all(|l| is_valid_label(l)) {
        return false;
    }
    match labels.last() {
        Some(tld) => is_valid_tld(tld),
        None => false,
    }
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

fn is_valid_tld(tld: &str) -> bool {
    if tld.len() >= 4 && tld[..4].eq_ignore_ascii_case("xn--") {
        return true;
    }
    tld.len() >= 2 && tld.bytes().all(|b| b.is_ascii_alphabetic())
}

/// True when `hostname` is a proper subdomain of `domain`, at any depth.
/// The match is anchored on a `.` so `evilexample.com` is not a subdomain
/// of `example.com`.
pub fn is_subdomain_of(domain: &str, hostname: &str) -> bool {
    if hostname.len() <= domain.len() + 1 {
        return false;
    }
    let split = hostname.len() - domain.len();
    if !hostname.is_char_boundary(split) {
        return false;
    }
    let (head, tail) = hostname.split_at(split);
    head.ends_with('.') && tail.eq_ignore_ascii_case(domain)
}

/// Whether a hostname taken from a policy document can be used at all.
/// Full DNS checks happen at resolution time; this only rejects text that
/// cannot name a host.
pub(crate) fn is_parsable_hostname(hostname: &str) -> bool {
    !hostname.is_empty()
        && hostname
            .chars()
            .all(|c| !c.is_whitespace() && !c.is_control() && !matches!(c, '/' | ':' | '@' | '?' | '#'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_hostnames() {
        for host in ["example.com", "api.example.com", "a-b.c0.example.org", "EXAMPLE.COM", "xn--80ak6aa92e.xn--p1ai"] {
            assert!(is_valid_hostname(host), "{host}");
        }
    }

    #[test]
    fn rejects_malformed_hostnames() {
        let long_label = format!("{}.com", "a".repeat(64));
        for host in [
            "", "localhost", "example.com.", ".example.com", "exa mple.com", "-a.example.com",
            "a-.example.com", "a..com", "127.0.0.1", "example.c0m", "example.c", "ex_ample.com",
            "https://example.com", long_label.as_str(),
        ] {
            assert!(!is_valid_hostname(host), "{host:?}");
        }
    }

    #[test]
    fn subdomain_match_is_dot_anchored() {
        assert!(is_subdomain_of("example.com", "api.example.com"));
        assert!(is_subdomain_of("example.com", "a.b.example.com"));
        assert!(is_subdomain_of("example.com", "API.Example.COM"));
        assert!(!is_subdomain_of("example.com", "example.com"));
        assert!(!is_subdomain_of("example.com", "evilexample.com"));
        assert!(!is_subdomain_of("example.com", "pleexample.com"));
        assert!(!is_subdomain_of("example.com", ".example.com"));
        assert!(!is_subdomain_of("api.example.com", "example.com"));
    }

    #[test]
    fn parsable_hostnames() {
        assert!(is_parsable_hostname("example.com"));
        assert!(!is_parsable_hostname(""));
        assert!(!is_parsable_hostname("exa mple.com"));
        assert!(!is_parsable_hostname("https://example.com"));
    }
}
