//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early in the binary (every getter also calls it lazily).
use std::str::FromStr;
use std::sync::Once;
use tracing::info;

static INIT: Once = Once::new();

/// Load .env exactly once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        if dotenv::dotenv().is_err() {
            // Fallback to the crate root so `cargo run` from a subdirectory still finds it.
            let candidate = format!("{}/.env", env!("CARGO_MANIFEST_DIR"));
            let _ = dotenv::from_filename(candidate);
        }
    });
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

/// Get parsed value with default fallback. Unparseable values fall back too.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env_parse_opt(key).unwrap_or(default)
}

/// Optional parsed value.
pub fn env_parse_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    env_opt(key).and_then(|s| s.parse().ok())
}

/// Boolean flag; accepts 1/true/on/yes (case-insensitive) as true.
pub fn env_flag(key: &str, default: bool) -> bool {
    match env_opt(key) {
        Some(raw) => parse_flag(&raw),
        None => default,
    }
}

fn parse_flag(raw: &str) -> bool {
    let v = raw.trim().to_ascii_lowercase();
    matches!(v.as_str(), "1" | "true" | "on" | "yes")
}

fn snapshot(keys: &[&str]) -> Vec<(String, String)> {
    keys.iter()
        .map(|&k| (k.to_string(), env_opt(k).unwrap_or_default()))
        .collect()
}

/// Log one snapshot line of the given keys. Returns error if any of `required` is missing.
pub fn preflight_check(title: &str, required: &[&str], also_log: &[&str]) -> anyhow::Result<()> {
    init_env();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|k| env_opt(k).is_none())
        .collect();
    info!(target = "preflight", title, snapshot = ?snapshot(also_log), "configuration snapshot");
    if !missing.is_empty() {
        return Err(anyhow::anyhow!("missing required env: {:?}", missing));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_accepts_common_truthy_spellings() {
        for raw in ["1", "true", "TRUE", " on ", "Yes"] {
            assert!(parse_flag(raw), "{raw} should be truthy");
        }
        for raw in ["0", "false", "off", "nope", ""] {
            assert!(!parse_flag(raw), "{raw} should be falsy");
        }
    }

    #[test]
    fn snapshot_lists_unset_keys_as_empty() {
        let snap = snapshot(&["TIKI_CRAWL_TEST_UNSET_KEY_0003"]);
        assert_eq!(snap, vec![("TIKI_CRAWL_TEST_UNSET_KEY_0003".to_string(), String::new())]);
    }

    #[test]
    fn preflight_fails_on_missing_required_key() {
        let err = preflight_check("test", &["TIKI_CRAWL_TEST_UNSET_KEY_0004"], &[]).unwrap_err();
        assert!(err.to_string().contains("TIKI_CRAWL_TEST_UNSET_KEY_0004"));
        assert!(preflight_check("test", &[], &["TIKI_CRAWL_TEST_UNSET_KEY_0004"]).is_ok());
    }

    #[test]
    fn parse_falls_back_on_missing_or_garbage() {
        assert_eq!(env_parse("TIKI_CRAWL_TEST_UNSET_KEY_0001", 7u32), 7);
        assert_eq!(env_parse_opt::<u32>("TIKI_CRAWL_TEST_UNSET_KEY_0002"), None);
    }
}
