// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slugify file names into agent ids.

/// Derive an agent id from a definition file stem.
///
/// Lowercases, collapses runs of non-alphanumeric characters to a single
/// hyphen, and trims leading/trailing hyphens. An empty result means the
/// file cannot name an agent and the definition is rejected.
pub fn slugify(input: &str) -> String {
    let lower = input.to_lowercase();
    let mut slug = String::with_capacity(lower.len());
    let mut last_was_hyphen = false;
    for ch in lower.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    slug.trim_matches('-').to_string()
}

#[cfg(test)]
#[path = "slug_tests.rs"]
mod tests;
