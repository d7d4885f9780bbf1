//! Browser origin policy for the upgrade endpoint.
//!
//! Browsers attach an `Origin` header to WebSocket handshakes, and unlike
//! `fetch()` they do not enforce CORS on them.  Without a check any web page
//! the user visits could open a bridge through this server to an arbitrary
//! TCP endpoint.  The policy is therefore explicit configuration:
//!
//! | Policy       | Accepts                                                  |
//! |--------------|----------------------------------------------------------|
//! | `SameOrigin` | Origin whose host (and port) equals the `Host` header    |
//! | `AllowList`  | Origins listed in configuration (scheme + host + port)   |
//! | `Any`        | Everything (opt-in)                                      |
//!
//! A request with no `Origin` header did not come from a browser page and is
//! accepted under every policy.

use url::Url;

/// Which origins may open a bridge session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OriginPolicy {
    /// Only pages served from the same host as the bridge itself.
    #[default]
    SameOrigin,
    /// Only the listed origins, e.g. `https://play.example.org`.
    AllowList(Vec<String>),
    /// Any origin.
    Any,
}

impl OriginPolicy {
    /// Decides whether a handshake may proceed.
    ///
    /// - `origin` – value of the request's `Origin` header, if any.
    /// - `host`   – value of the request's `Host` header, if any.
    pub fn permits(&self, origin: Option<&str>, host: Option<&str>) -> bool {
        let Some(origin) = origin else {
            return true;
        };

        match self {
            OriginPolicy::Any => true,
            OriginPolicy::SameOrigin => match (origin_authority(origin), host) {
                (Some(authority), Some(host)) => authority.eq_ignore_ascii_case(host.trim()),
                _ => false,
            },
            OriginPolicy::AllowList(allowed) => {
                let candidate = normalize_origin(origin);
                allowed
                    .iter()
                    .any(|entry| normalize_origin(entry) == candidate)
            }
        }
    }

    /// Short label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            OriginPolicy::SameOrigin => "same-origin",
            OriginPolicy::AllowList(_) => "allow-list",
            OriginPolicy::Any => "any",
        }
    }
}

/// Extracts `host[:port]` from an origin such as `http://example.com:3001`.
///
/// The port is omitted when it is the scheme's default, matching what
/// browsers put in the `Host` header.
fn origin_authority(origin: &str) -> Option<String> {
    let url = Url::parse(origin.trim()).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Canonical `scheme://host[:port]` form, lowercased.
///
/// Unparseable values (including the literal `null` origin of sandboxed
/// frames) fall back to a trimmed lowercase string so they only ever match
/// an identical entry.
fn normalize_origin(origin: &str) -> String {
    match Url::parse(origin.trim()) {
        Ok(url) if url.host_str().is_some() => url.origin().ascii_serialization(),
        _ => origin.trim().trim_end_matches('/').to_ascii_lowercase(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
