//! Front-matter parsing

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Front-matter header of a lesson
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "updated", alias = "lastModified")]
    pub modified: Option<String>,
    #[serde(alias = "date")]
    pub published: Option<String>,
    pub draft: bool,

    /// Additional custom fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    pub fn parse(content: &str) -> Result<(Self, &str)> {
        let content = content.trim_start_matches('\u{feff}').trim_start();

        if content.starts_with("---") {
            return Self::parse_yaml(content);
        }

        if content.starts_with(";;;") {
            return Self::parse_json(content);
        }

        Ok((FrontMatter::default(), content))
    }

    fn parse_yaml(content: &str) -> Result<(Self, &str)> {
        let rest = content[3..].trim_start_matches(['\n', '\r']);

        let Some(end_pos) = rest.find("\n---") else {
            // No closing fence, the opening one is a thematic break
            return Ok((FrontMatter::default(), content));
        };

        let yaml_content = &rest[..end_pos];
        let remaining = rest[end_pos + 4..].trim_start_matches(['\n', '\r']);

        if yaml_content.trim().is_empty() {
            return Ok((FrontMatter::default(), remaining));
        }

        // A `---` pair around prose is two thematic breaks, not a header
        if !yaml_content.lines().any(looks_like_yaml_key) {
            return Ok((FrontMatter::default(), content));
        }

        let fm = serde_yaml::from_str::<FrontMatter>(yaml_content)
            .map_err(|e| anyhow!("Failed to parse YAML front-matter: {}", e))?;
        Ok((fm, remaining))
    }

    fn parse_json(content: &str) -> Result<(Self, &str)> {
        let rest = &content[3..];
        let Some(end_pos) = rest.find(";;;") else {
            bail!("Unterminated JSON front-matter");
        };

        let json_content = rest[..end_pos].trim();
        let remaining = rest[end_pos + 3..].trim_start_matches(['\n', '\r']);

        // `;;;` fences may wrap a bare list of members without braces
        let fm: FrontMatter = if json_content.starts_with('{') {
            serde_json::from_str(json_content)
        } else {
            serde_json::from_str(&format!("{{{}}}", json_content))
        }
        .map_err(|e| anyhow!("Failed to parse JSON front-matter: {}", e))?;

        Ok((fm, remaining))
    }

    /// Parse the published date; an unrecognized value is an error
    pub fn parse_published(&self) -> Result<Option<DateTime<Local>>> {
        parse_date_field("published", self.published.as_deref())
    }

    /// Parse the last-modified date; an unrecognized value is an error
    pub fn parse_modified(&self) -> Result<Option<DateTime<Local>>> {
        parse_date_field("modified", self.modified.as_deref())
    }
}

fn parse_date_field(field: &str, value: Option<&str>) -> Result<Option<DateTime<Local>>> {
    match value {
        None => Ok(None),
        Some(raw) => parse_date_string(raw)
            .map(Some)
            .ok_or_else(|| anyhow!("`{}` is not a recognized date: {:?}", field, raw)),
    }
}

/// `key: value` or `key:` with an identifier-like key that is not a URL scheme
fn looks_like_yaml_key(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return false;
    }

    let Some(colon_pos) = trimmed.find(':') else {
        return false;
    };
    let key = &trimmed[..colon_pos];
    let is_valid_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && !matches!(key, "http" | "https" | "ftp");

    let after_colon = &trimmed[colon_pos + 1..];
    is_valid_key && (after_colon.is_empty() || after_colon.starts_with(' '))
}

/// Parse a date string in various formats, interpreted in local time
pub fn parse_date_string(s: &str) -> Option<DateTime<Local>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }

    const DATETIME_FORMATS: [&str; 7] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Local.from_local_datetime(&dt).earliest();
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            let dt = d.and_hms_opt(0, 0, 0)?;
            return Local.from_local_datetime(&dt).earliest();
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: Mocks
description: Replacing collaborators with test doubles
modified: 2024-03-02 09:15:00
published: 2023-11-20
---

Mocks let you observe calls.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Mocks"));
        assert_eq!(
            fm.description.as_deref(),
            Some("Replacing collaborators with test doubles")
        );
        assert!(!fm.draft);
        assert!(remaining.starts_with("Mocks let you observe calls."));

        let modified = fm.parse_modified().unwrap().unwrap();
        assert_eq!(
            modified.format("%Y-%m-%d %H:%M").to_string(),
            "2024-03-02 09:15"
        );
        let published = fm.parse_published().unwrap().unwrap();
        assert_eq!(published.format("%Y-%m-%d").to_string(), "2023-11-20");
    }

    #[test]
    fn test_field_aliases() {
        let content = "---\ntitle: Spies\nupdated: 2024-01-01\ndate: 2023-06-01\n---\nbody";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.modified.as_deref(), Some("2024-01-01"));
        assert_eq!(fm.published.as_deref(), Some("2023-06-01"));

        let content = "---\ntitle: Spies\nlastModified: 2024-02-02\n---\nbody";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.modified.as_deref(), Some("2024-02-02"));
    }

    #[test]
    fn test_unrecognized_date_is_error() {
        let content = "---\ntitle: Spies\nmodified: last tuesday\n---\nbody";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        let err = fm.parse_modified().unwrap_err();
        assert!(err.to_string().contains("modified"));
        assert!(fm.parse_published().unwrap().is_none());
    }

    #[test]
    fn test_extra_fields_are_kept() {
        let content = "---\ntitle: Coverage\nsection: vitest\n---\nbody";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        assert_eq!(
            fm.extra.get("section").and_then(|v| v.as_str()),
            Some("vitest")
        );
    }

    #[test]
    fn test_parse_json_frontmatter() {
        let content = r#";;;
"title": "Snapshots",
"description": "Recording output"
;;;

Snapshot body.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Snapshots"));
        assert_eq!(fm.description.as_deref(), Some("Recording output"));
        assert!(remaining.contains("Snapshot body."));
    }

    #[test]
    fn test_no_frontmatter() {
        let (fm, remaining) = FrontMatter::parse("# Just a heading\n").unwrap();
        assert!(fm.title.is_none());
        assert_eq!(remaining, "# Just a heading\n");
    }

    #[test]
    fn test_thematic_breaks_are_not_yaml() {
        let content = r#"---

Check out https://vitest.dev and the docs.

---
More content.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert!(fm.title.is_none());
        assert!(remaining.contains("https://vitest.dev"));
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let content = "---\ntitle: [unclosed\n---\nbody";
        assert!(FrontMatter::parse(content).is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        for s in [
            "2024-01-15",
            "2024/01/15",
            "2024-01-15 10:30",
            "2024-01-15T10:30:00",
            "2024-01-15T10:30:00.250",
        ] {
            let dt = parse_date_string(s).unwrap_or_else(|| panic!("failed on {}", s));
            assert_eq!(dt.format("%Y-%m-%d").to_string(), "2024-01-15");
        }
        assert!(parse_date_string("2024-01-15T10:30:00Z").is_some());
        assert!(parse_date_string("last tuesday").is_none());
    }
}
