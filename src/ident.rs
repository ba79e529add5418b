//! Canonical page identifier normalization.
//!
//! Every page is addressed by a canonical identifier: lowercase words joined
//! by underscores. Older wikis stored pages under CamelCase or space/hyphen
//! separated names; `canonicalize` maps any of those spellings to the one
//! canonical form. The function is deterministic and idempotent, which the
//! consolidation scan relies on: a second pass over an already-migrated store
//! must find nothing to do.

/// Normalize a page name to its canonical identifier.
///
/// `"LabInventory"` becomes `"lab_inventory"`, `"Meeting Notes"` becomes
/// `"meeting_notes"`, `"lab_inventory"` stays `"lab_inventory"`.
pub fn canonicalize(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if is_separator(c) {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }

        if c.is_uppercase() {
            let prev = if i > 0 { Some(chars[i - 1]) } else { None };
            let next = chars.get(i + 1);

            // A word boundary sits before an uppercase char that follows a
            // lowercase char or digit, and before the last uppercase char of
            // an acronym run ("WikiHTTPLog" -> "wiki_http_log").
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };

            if boundary && !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            for lower in c.to_lowercase() {
                out.push(lower);
            }
        } else {
            out.push(c);
        }
    }

    out.trim_matches('_').to_string()
}

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '-' | '.' | '_')
}
