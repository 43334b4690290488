/// Which trust boundary a request hostname falls under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostClass {
    Root,
    Subdomain,
}

/// Classify `host` against the configured apex domains.
///
/// A host is a subdomain only when some root domain is a whole-label suffix
/// of it: `tenant.root.com` matches `root.com`, `evilroot.com` does not.
/// Everything else, including an empty host, is `Root`.
pub fn classify_host<S: AsRef<str>>(host: &str, root_domains: &[S]) -> HostClass {
    let host = normalize_host(host);

    let is_subdomain = root_domains.iter().any(|root| {
        let root = root.as_ref().trim_end_matches('.');
        if root.is_empty() || host.len() <= root.len() {
            return false;
        }
        let split = host.len() - root.len();
        // need at least one non-empty label in front of the dot
        split > 1
            && host.is_char_boundary(split)
            && host[split..].eq_ignore_ascii_case(root)
            && host.as_bytes()[split - 1] == b'.'
    });

    if is_subdomain {
        HostClass::Subdomain
    } else {
        HostClass::Root
    }
}

/// Lowercase, drop any port and a trailing dot
pub fn normalize_host(raw: &str) -> String {
    let raw = raw.trim();
    let without_port = if raw.starts_with('[') {
        // IPv6 literal, never a subdomain of anything
        raw.split(']').next().map(|h| &h[1..]).unwrap_or(raw)
    } else {
        raw.rsplit_once(':').map(|(h, _)| h).unwrap_or(raw)
    };
    without_port.trim_end_matches('.').to_ascii_lowercase()
}

/// Maps a hostname to the audience tag the assertion must carry
#[derive(Debug, Clone)]
pub struct AudiencePolicy {
    root_domains: Vec<String>,
    root_audience: String,
    subdomain_audience: String,
}

impl AudiencePolicy {
    pub fn new(
        root_domains: Vec<String>,
        root_audience: impl Into<String>,
        subdomain_audience: impl Into<String>,
    ) -> Self {
        Self {
            root_domains,
            root_audience: root_audience.into(),
            subdomain_audience: subdomain_audience.into(),
        }
    }

    pub fn classify(&self, host: &str) -> HostClass {
        classify_host(host, &self.root_domains)
    }

    pub fn audience_for(&self, host: &str) -> &str {
        match self.classify(host) {
            HostClass::Root => &self.root_audience,
            HostClass::Subdomain => &self.subdomain_audience,
        }
    }
}
