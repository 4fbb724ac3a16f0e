//! Clash YAML documents: parse, merge, serialize.
//!
//! # Design Decisions
//! - Documents stay generic `serde_yaml::Mapping` trees; only `proxies` and
//!   `proxy-groups` are interpreted, every other key passes through untouched
//! - `Mapping` preserves insertion order, so a template re-serializes with its
//!   sections where the author put them
//! - serde_yaml's emitter writes plain nodes only, never anchors or aliases,
//!   which keeps the output self-contained for client parsers

use serde_yaml::{Mapping, Value};

use crate::convert::format::SubFormat;
use crate::convert::groups::{self, Boundary};
use crate::convert::{MergeError, ParseError};

const PROXIES_KEY: &str = "proxies";
const GROUPS_KEY: &str = "proxy-groups";
const NAME_KEY: &str = "name";

/// A parsed Clash document, root mapping held as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct ClashDocument {
    root: Mapping,
}

/// Parse Clash YAML. The only schema requirement at this stage is a
/// top-level mapping; `proxies` and `proxy-groups` are checked at merge time.
pub fn parse(text: &str) -> Result<ClashDocument, ParseError> {
    let value: Value = serde_yaml::from_str(text).map_err(|err| ParseError::Malformed {
        format: SubFormat::Clash,
        detail: err.to_string(),
    })?;
    match value {
        Value::Mapping(root) => Ok(ClashDocument { root }),
        _ => Err(ParseError::Malformed {
            format: SubFormat::Clash,
            detail: "top level is not a mapping".to_string(),
        }),
    }
}

/// Merge the original document's proxies into the template and resolve every
/// template group against the live proxy name list.
pub fn merge(original: ClashDocument, template: ClashDocument) -> Result<ClashDocument, MergeError> {
    let ClashDocument { mut root } = template;

    let proxies = match original
        .root
        .into_iter()
        .find(|(k, _)| k.as_str() == Some(PROXIES_KEY))
    {
        Some((_, Value::Sequence(proxies))) => proxies,
        _ => return Err(MergeError::MissingProxies),
    };

    let mut live = Vec::with_capacity(proxies.len());
    for (index, proxy) in proxies.iter().enumerate() {
        let name = proxy
            .as_mapping()
            .and_then(|entry| entry.get(NAME_KEY))
            .and_then(Value::as_str)
            .ok_or(MergeError::UnnamedProxy { index })?;
        live.push(name.to_string());
    }

    root.insert(PROXIES_KEY.into(), Value::Sequence(proxies));

    let groups = match root.get_mut(GROUPS_KEY) {
        Some(Value::Sequence(groups)) => groups,
        _ => return Err(MergeError::MissingGroups),
    };
    for group in groups.iter_mut() {
        match group.as_mapping_mut() {
            Some(group) => resolve_group(group, &live),
            None => tracing::debug!("skipping non-mapping entry in proxy-groups"),
        }
    }

    Ok(ClashDocument { root })
}

/// Alias-free YAML text for the merged document.
pub fn serialize(doc: &ClashDocument) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&doc.root)
}

fn resolve_group(group: &mut Mapping, live: &[String]) {
    let members = match group.get(PROXIES_KEY) {
        // Absent or null membership reads as an empty list: full substitution.
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Sequence(members)) => {
            let mut tokens = Vec::with_capacity(members.len());
            for member in members {
                match member.as_str() {
                    Some(token) => tokens.push(token.to_string()),
                    None => {
                        tracing::debug!(
                            group = %group_name(group),
                            "group has a non-string member, left unresolved"
                        );
                        return;
                    }
                }
            }
            tokens
        }
        Some(_) => {
            tracing::debug!(
                group = %group_name(group),
                "group membership is not a list, left unresolved"
            );
            return;
        }
    };

    let resolved = groups::resolve(members, live, Boundary::Trailing);
    group.insert(
        PROXIES_KEY.into(),
        Value::Sequence(resolved.into_iter().map(Value::String).collect()),
    );
}

fn group_name(group: &Mapping) -> &str {
    group
        .get(NAME_KEY)
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>")
}
