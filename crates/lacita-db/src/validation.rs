// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

/// A search term only participates in the query once stripped of
/// leading/trailing whitespace; an all-whitespace input is the same as
/// no search at all.
pub fn normalize_search(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// Escapes LIKE wildcards so user input matches literally inside a
/// `%term%` pattern (paired with `ESCAPE '\'`).
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{escape_like, normalize_search, validate_db_path};

    #[test]
    fn db_path_rejects_uri_forms() {
        assert!(validate_db_path("file:test.db").is_err());
        assert!(validate_db_path("https://example.com/db.sqlite").is_err());
        assert!(validate_db_path("db.sqlite?mode=ro").is_err());
        assert!(validate_db_path("/tmp/lacita.db").is_ok());
        assert!(validate_db_path(":memory:").is_ok());
    }

    #[test]
    fn search_normalization_strips_whitespace() {
        assert_eq!(normalize_search("  career  "), Some("career".to_owned()));
        assert_eq!(normalize_search("   "), None);
        assert_eq!(normalize_search(""), None);
    }

    #[test]
    fn like_wildcards_are_escaped_literally() {
        assert_eq!(escape_like("100%_done"), "100\\%\\_done");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("career"), "career");
    }
}
