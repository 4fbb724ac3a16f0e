//! Proxy-group membership resolution.
//!
//! # Responsibilities
//! - Substitute the full live proxy list for the `$all` sentinel (or an
//!   empty membership list)
//! - Expand a boundary wildcard token (`/^…/`) by regex search over the
//!   live proxy names
//! - Leave groups without a substitution marker untouched
//!
//! # Design Decisions
//! - Wildcard position is a per-format policy (`Boundary`), not hard-coded:
//!   Clash templates put the pattern last, Surge templates put it first
//! - Only the delimiting slashes are stripped from a wildcard token, so the
//!   caret is part of the compiled pattern and `/^US/` anchors at the start
//!   of a name
//! - Matching is a case-sensitive search, not a full match
//! - Resolution is infallible: an unusable pattern drops the token and keeps
//!   the rest of the group

use regex::Regex;

/// Membership token that substitutes the entire live proxy list.
pub const ALL_SENTINEL: &str = "$all";

const WILDCARD_OPEN: &str = "/^";
const WILDCARD_CLOSE: char = '/';

/// Which end of a membership list may carry a wildcard token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Last element (Clash convention).
    Trailing,
    /// First element (Surge convention: options trail the member list).
    Leading,
}

/// True if `token` is a wildcard pattern marker (`/^…/`).
pub fn is_wildcard(token: &str) -> bool {
    token.len() >= 3 && token.starts_with(WILDCARD_OPEN) && token.ends_with(WILDCARD_CLOSE)
}

/// Resolve a group membership list against the live proxy names.
///
/// 1. An empty list, or a list containing [`ALL_SENTINEL`], receives the
///    entire live list at the sentinel position; literals keep their places.
/// 2. Otherwise, a wildcard token at the boundary position is replaced by
///    the live names matching its pattern, in live order.
/// 3. Otherwise the list is returned unchanged.
pub fn resolve(members: Vec<String>, live: &[String], boundary: Boundary) -> Vec<String> {
    if members.is_empty() {
        return live.to_vec();
    }

    if members.iter().any(|m| m == ALL_SENTINEL) {
        let mut out = Vec::with_capacity(members.len() + live.len());
        let mut substituted = false;
        for member in members {
            if member == ALL_SENTINEL {
                // Only the first sentinel expands; stray repeats are dropped.
                if !substituted {
                    out.extend(live.iter().cloned());
                    substituted = true;
                }
            } else {
                out.push(member);
            }
        }
        return out;
    }

    let index = match boundary {
        Boundary::Trailing => members.len() - 1,
        Boundary::Leading => 0,
    };
    if !is_wildcard(&members[index]) {
        return members;
    }

    let mut out = members;
    let token = out.remove(index);
    let pattern = &token[1..token.len() - 1];
    let matched: Vec<String> = match Regex::new(pattern) {
        Ok(re) => live.iter().filter(|name| re.is_match(name)).cloned().collect(),
        Err(err) => {
            tracing::debug!(
                pattern = %pattern,
                error = %err,
                "Wildcard pattern failed to compile, dropping token"
            );
            Vec::new()
        }
    };

    // Expanded names take the position the token occupied.
    match boundary {
        Boundary::Trailing => {
            out.extend(matched);
            out
        }
        Boundary::Leading => {
            let mut expanded = matched;
            expanded.extend(out);
            expanded
        }
    }
}
