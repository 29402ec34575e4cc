// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::TEST_EVENT_PROVIDER;
use crate::ingest::types::{Provider, ProviderSource};

/// Load the provider list from an explicit path. Supports TOML or JSON formats.
pub fn load_providers_from(path: &Path) -> Result<Vec<Provider>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading providers from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_providers(&content, ext.as_str())
}

fn parse_providers(s: &str, hint_ext: &str) -> Result<Vec<Provider>> {
    // Try TOML first if hinted or content looks like toml.
    let try_toml = hint_ext == "toml" || s.contains("[[providers]]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    // Try JSON array
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    // Fallback: also try TOML if not attempted
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported provider list format"))
}

fn parse_toml(s: &str) -> Result<Vec<Provider>> {
    #[derive(serde::Deserialize)]
    struct TomlProviders {
        providers: Vec<Provider>,
    }
    let v: TomlProviders = toml::from_str(s)?;
    Ok(clean_list(v.providers))
}

fn parse_json(s: &str) -> Result<Vec<Provider>> {
    let v: Vec<Provider> = serde_json::from_str(s)?;
    Ok(clean_list(v))
}

/// Trims fields, drops blank entries and keeps the first provider for each name.
/// File order is preserved. The test-event name is reserved and never polled.
fn clean_list(items: Vec<Provider>) -> Vec<Provider> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let name = it.name.trim();
        let url = it.feed_url.trim();
        if name.is_empty() || url.is_empty() {
            continue;
        }
        if name == TEST_EVENT_PROVIDER {
            tracing::warn!(provider = name, "provider name is reserved for test events, skipping");
            continue;
        }
        if seen.insert(name.to_string()) {
            out.push(Provider::new(name, url));
        }
    }
    out
}

/// Provider list backed by a file that is re-read on every tick.
///
/// A missing or broken file keeps the last list that loaded successfully, so a
/// half-written edit never empties the poll set.
#[derive(Debug)]
pub struct FileProviders {
    path: PathBuf,
    last: Mutex<Vec<Provider>>,
}

impl FileProviders {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last: Mutex::new(Vec::new()),
        }
    }
}

impl ProviderSource for FileProviders {
    fn providers(&self) -> Vec<Provider> {
        match load_providers_from(&self.path) {
            Ok(fresh) => {
                let mut last = self.last.lock();
                if *last != fresh {
                    tracing::info!(
                        path = %self.path.display(),
                        count = fresh.len(),
                        "provider list loaded"
                    );
                    *last = fresh.clone();
                }
                fresh
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %format!("{e:#}"),
                    "provider list unavailable, keeping previous"
                );
                self.last.lock().clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_trim_and_formats_work() {
        let toml = r#"
[[providers]]
name = " Acme "
rss = "https://status.acme.test/feed.rss"

[[providers]]
name = ""
rss = "https://nowhere.test"

[[providers]]
name = "Acme"
rss = "https://duplicate.test"
"#;
        let json = r#"[
            {"name": "Globex", "rss": "https://status.globex.test/history.atom"},
            {"name": "Initech", "feed_url": " https://initech.test/rss "}
        ]"#;

        let toml_out = parse_toml(toml).unwrap();
        assert_eq!(
            toml_out,
            vec![Provider::new("Acme", "https://status.acme.test/feed.rss")]
        );

        let json_out = parse_json(json).unwrap();
        assert_eq!(
            json_out,
            vec![
                Provider::new("Globex", "https://status.globex.test/history.atom"),
                Provider::new("Initech", "https://initech.test/rss"),
            ]
        );
    }

    #[test]
    fn test_event_name_is_reserved() {
        let json = r#"[
            {"name": "System Test", "rss": "https://acme.test/rss"},
            {"name": "Acme", "rss": "https://acme.test/rss"}
        ]"#;
        assert_eq!(
            parse_json(json).unwrap(),
            vec![Provider::new("Acme", "https://acme.test/rss")]
        );
    }

    #[test]
    fn unknown_format_is_an_error() {
        assert!(parse_providers("providers: [acme]", "yaml").is_err());
    }

    #[test]
    fn broken_file_keeps_previous_list() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("providers.json");
        let src = FileProviders::new(&path);

        // Nothing on disk yet
        assert!(src.providers().is_empty());

        fs::write(&path, r#"[{"name": "Acme", "rss": "https://acme.test/rss"}]"#).unwrap();
        assert_eq!(src.providers().len(), 1);

        // Half-written edit
        fs::write(&path, r#"[{"name": "Acme", "rss": "#).unwrap();
        assert_eq!(
            src.providers(),
            vec![Provider::new("Acme", "https://acme.test/rss")]
        );

        // Hot add
        fs::write(
            &path,
            r#"[{"name": "Acme", "rss": "https://acme.test/rss"},
                {"name": "Globex", "rss": "https://globex.test/rss"}]"#,
        )
        .unwrap();
        let names: Vec<_> = src.providers().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Acme", "Globex"]);
    }
}
