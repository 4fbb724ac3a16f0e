//! Surge INI documents: parse, merge, serialize.
//!
//! # Responsibilities
//! - Separate the leading comment run from the body and capture the
//!   managed-config directive out of it
//! - Parse the body as ordered named sections of ordered `key = value`
//!   entries, keys case-preserved, bare lines kept as valueless entries
//! - Merge the original's `[Proxy]` section into a template, resolve
//!   `[Proxy Group]` membership, carry designated sections forward
//!
//! # Design Decisions
//! - Keys are never case-folded; Surge policy names are case-sensitive and
//!   must survive a round trip byte-for-byte
//! - The managed-config directive is recognized by its marker substring, not
//!   by position, and rides outside the document as preserved metadata
//! - Inside the body only `;` starts a comment; the leading run also accepts
//!   `#` so the directive and its neighbors parse as comments

use crate::convert::format::SubFormat;
use crate::convert::groups::{self, Boundary};
use crate::convert::{MergeError, ParseError, PreservedMetadata};

const PROXY_SECTION: &str = "Proxy";
const GROUP_SECTION: &str = "Proxy Group";

/// Marker substring identifying the managed-config directive line.
const MANAGED_CONFIG_MARKER: &str = "MANAGED-CONFIG";

/// Proxy values that are pass-through directives rather than real proxies.
const NOOP_VALUES: &[&str] = &["direct", "reject"];

/// A parsed Surge document: named sections in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct SurgeDocument {
    sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq)]
struct Section {
    name: String,
    entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    key: String,
    value: Option<String>,
}

/// Parse Surge INI text into a document plus its preserved metadata.
pub fn parse(text: &str) -> Result<(SurgeDocument, PreservedMetadata), ParseError> {
    let mut directive: Option<String> = None;
    let mut sections: Vec<Section> = Vec::new();
    let mut in_preamble = true;

    for (number, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if in_preamble {
            if line.starts_with('#') || line.starts_with(';') {
                if directive.is_none() && line.contains(MANAGED_CONFIG_MARKER) {
                    directive = Some(line.to_string());
                }
                continue;
            }
            in_preamble = false;
        }

        if let Some(rest) = line.strip_prefix('[') {
            let name = rest.strip_suffix(']').ok_or_else(|| {
                malformed(format!("line {}: unterminated section header", number + 1))
            })?;
            let name = name.trim();
            if sections.iter().any(|section| section.name == name) {
                return Err(malformed(format!(
                    "line {}: duplicate section [{name}]",
                    number + 1
                )));
            }
            sections.push(Section {
                name: name.to_string(),
                entries: Vec::new(),
            });
            continue;
        }

        if line.starts_with(';') {
            continue;
        }

        let Some(section) = sections.last_mut() else {
            return Err(malformed(format!(
                "line {}: entry outside any section",
                number + 1
            )));
        };
        let entry = match line.split_once('=') {
            Some((key, value)) => Entry {
                key: key.trim().to_string(),
                value: Some(value.trim().to_string()),
            },
            None => Entry {
                key: line.to_string(),
                value: None,
            },
        };
        if section.entries.iter().any(|seen| seen.key == entry.key) {
            return Err(malformed(format!(
                "line {}: duplicate key {} in section [{}]",
                number + 1,
                entry.key,
                section.name
            )));
        }
        section.entries.push(entry);
    }

    if sections.is_empty() {
        return Err(malformed("no sections found"));
    }

    let metadata = match directive {
        Some(line) => PreservedMetadata::directive(line),
        None => PreservedMetadata::none(),
    };
    Ok((SurgeDocument { sections }, metadata))
}

/// Merge the original's proxies into the template, resolve group membership,
/// and carry designated sections across.
pub fn merge(original: SurgeDocument, template: SurgeDocument) -> Result<SurgeDocument, MergeError> {
    let mut original = original;
    let mut sections = template.sections;

    let mut proxies =
        take_section(&mut original.sections, PROXY_SECTION).ok_or(MergeError::MissingProxies)?;
    proxies.entries.retain(|entry| !is_noop(entry));
    let live: Vec<String> = proxies.entries.iter().map(|e| e.key.clone()).collect();

    let groups = sections
        .iter_mut()
        .find(|section| section.name == GROUP_SECTION)
        .ok_or(MergeError::MissingGroups)?;
    for entry in &mut groups.entries {
        match entry.value.take() {
            Some(value) => entry.value = Some(resolve_group_line(&value, &live)),
            None => {
                tracing::debug!(group = %entry.key, "group entry has no value, left unresolved");
            }
        }
    }

    match sections.iter().position(|s| s.name == PROXY_SECTION) {
        Some(at) => sections[at] = proxies,
        None => {
            // A template without its own proxy section gets one right before
            // the groups that reference it.
            let at = sections
                .iter()
                .position(|s| s.name == GROUP_SECTION)
                .unwrap_or(sections.len());
            sections.insert(at, proxies);
        }
    }

    for &carried in SubFormat::Surge.carried_sections() {
        if let Some(section) = take_section(&mut original.sections, carried) {
            match sections.iter().position(|s| s.name == carried) {
                Some(at) => sections[at] = section,
                None => sections.push(section),
            }
        }
    }

    Ok(SurgeDocument { sections })
}

/// Render the document back to INI text. A non-empty metadata directive is
/// emitted first with its URL placeholder substituted.
pub fn serialize(doc: &SurgeDocument, metadata: &PreservedMetadata, request_url: &str) -> String {
    let mut out = String::new();
    if let Some(directive) = metadata.render(request_url) {
        out.push_str(&directive);
        out.push_str("\n\n");
    }
    for (index, section) in doc.sections.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push('[');
        out.push_str(&section.name);
        out.push_str("]\n");
        for entry in &section.entries {
            out.push_str(&entry.key);
            if let Some(value) = &entry.value {
                out.push_str(" = ");
                out.push_str(value);
            }
            out.push('\n');
        }
    }
    out
}

fn malformed(detail: impl Into<String>) -> ParseError {
    ParseError::Malformed {
        format: SubFormat::Surge,
        detail: detail.into(),
    }
}

fn take_section(sections: &mut Vec<Section>, name: &str) -> Option<Section> {
    let at = sections.iter().position(|s| s.name == name)?;
    Some(sections.remove(at))
}

fn is_noop(entry: &Entry) -> bool {
    match &entry.value {
        Some(value) => NOOP_VALUES.iter().any(|noop| value.eq_ignore_ascii_case(noop)),
        None => false,
    }
}

/// Resolve one group value of the shape `type, member, ..., opt=val, ...`.
/// The leading type token and the option tokens are preserved around the
/// resolved membership.
fn resolve_group_line(value: &str, live: &[String]) -> String {
    if value.is_empty() {
        return String::new();
    }
    let mut tokens = value.split(',').map(str::trim);
    let kind = match tokens.next() {
        Some(kind) => kind,
        None => return value.to_string(),
    };

    let mut members = Vec::new();
    let mut options = Vec::new();
    for token in tokens {
        if token.contains('=') {
            options.push(token.to_string());
        } else {
            members.push(token.to_string());
        }
    }

    let resolved = groups::resolve(members, live, Boundary::Leading);

    let mut parts = Vec::with_capacity(1 + resolved.len() + options.len());
    parts.push(kind.to_string());
    parts.extend(resolved);
    parts.extend(options);
    parts.join(", ")
}
