//! Supported subscription wire formats and their per-format policies.
//!
//! # Design Decisions
//! - Closed enum resolved once at the HTTP boundary from the client's
//!   `User-Agent`, then passed explicitly through the pipeline; the core
//!   never inspects headers or re-detects
//! - Everything a format disagrees on (wildcard boundary, carried sections,
//!   passthrough headers) lives here as data, not as branches in the core

use std::fmt;

use crate::convert::groups::Boundary;

/// Closed set of supported subscription formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubFormat {
    /// Clash YAML document.
    Clash,
    /// Surge INI document.
    Surge,
}

/// Upstream response headers forwarded for Clash clients.
const CLASH_PASSTHROUGH: &[&str] = &[
    "subscription-userinfo",
    "profile-update-interval",
    "content-disposition",
    "profile-web-page-url",
];

/// Upstream response headers forwarded for Surge clients.
const SURGE_PASSTHROUGH: &[&str] = &["content-disposition"];

/// Headers forwarded when no supported client was recognized and the raw
/// upstream document is returned unmodified.
pub const BYPASS_PASSTHROUGH: &[&str] = CLASH_PASSTHROUGH;

impl SubFormat {
    /// Detect the format from the client's `User-Agent` value.
    ///
    /// Case-insensitive substring match, `clash` checked first. `None`
    /// means no supported client was recognized and the conversion core
    /// is bypassed.
    pub fn detect(user_agent: &str) -> Option<Self> {
        let ua = user_agent.to_ascii_lowercase();
        if ua.contains("clash") {
            Some(Self::Clash)
        } else if ua.contains("surge") {
            Some(Self::Surge)
        } else {
            None
        }
    }

    /// Parse a format name as used in configuration and CLI arguments.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "clash" => Some(Self::Clash),
            "surge" => Some(Self::Surge),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Clash => "clash",
            Self::Surge => "surge",
        }
    }

    /// Which end of a group membership list may carry a wildcard token.
    pub fn boundary(&self) -> Boundary {
        match self {
            Self::Clash => Boundary::Trailing,
            Self::Surge => Boundary::Leading,
        }
    }

    /// Sections copied verbatim from the original document into the merged
    /// output, overwriting the template's same-named section.
    pub fn carried_sections(&self) -> &'static [&'static str] {
        match self {
            Self::Clash => &[],
            Self::Surge => &["Panel"],
        }
    }

    /// Upstream response headers forwarded to the client for this format.
    pub fn passthrough_headers(&self) -> &'static [&'static str] {
        match self {
            Self::Clash => CLASH_PASSTHROUGH,
            Self::Surge => SURGE_PASSTHROUGH,
        }
    }
}

impl fmt::Display for SubFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_is_case_insensitive_substring() {
        assert_eq!(SubFormat::detect("ClashX/1.95.1"), Some(SubFormat::Clash));
        assert_eq!(SubFormat::detect("clash-verge/v1.3"), Some(SubFormat::Clash));
        assert_eq!(SubFormat::detect("Surge iOS/2989"), Some(SubFormat::Surge));
        assert_eq!(SubFormat::detect("SURGE Mac/4.0"), Some(SubFormat::Surge));
    }

    #[test]
    fn test_detect_unknown_client_bypasses() {
        assert_eq!(SubFormat::detect("curl/8.4.0"), None);
        assert_eq!(SubFormat::detect(""), None);
        assert_eq!(SubFormat::detect("Quantumult%20X/1.0"), None);
    }

    #[test]
    fn test_clash_takes_precedence_over_surge() {
        // Both markers present: first match wins, deterministically.
        assert_eq!(SubFormat::detect("clash-on-surge"), Some(SubFormat::Clash));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(SubFormat::from_name("clash"), Some(SubFormat::Clash));
        assert_eq!(SubFormat::from_name("Surge"), Some(SubFormat::Surge));
        assert_eq!(SubFormat::from_name("quantumult"), None);
    }

    #[test]
    fn test_boundary_policy_per_format() {
        assert_eq!(SubFormat::Clash.boundary(), Boundary::Trailing);
        assert_eq!(SubFormat::Surge.boundary(), Boundary::Leading);
    }

    #[test]
    fn test_passthrough_header_sets() {
        assert!(SubFormat::Clash
            .passthrough_headers()
            .contains(&"subscription-userinfo"));
        assert_eq!(SubFormat::Surge.passthrough_headers(), ["content-disposition"]);
        assert_eq!(BYPASS_PASSTHROUGH, SubFormat::Clash.passthrough_headers());
    }
}
