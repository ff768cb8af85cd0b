//! Cache path utilities - uses ~/.cache/agroscout/ instead of a dotdir in cwd

use std::path::PathBuf;

/// Get the base cache directory.
/// Uses ~/.cache/agroscout/ on Unix, %LOCALAPPDATA%/agroscout/ on Windows.
pub fn cache_dir() -> PathBuf {
    let base = if cfg!(windows) {
        std::env::var("LOCALAPPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".")))
    } else {
        dirs::cache_dir().unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".cache"))
                .unwrap_or_else(|| PathBuf::from("."))
        })
    };

    base.join("agroscout")
}

/// File path of the persistent cache tier.
pub fn slow_tier_path() -> PathBuf {
    cache_dir().join("dossier_cache.redb")
}

/// Ensure the cache directory exists.
pub fn ensure_cache_dir() -> std::io::Result<PathBuf> {
    let dir = cache_dir();
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_dir_is_namespaced() {
        let dir = cache_dir();
        assert!(dir.to_string_lossy().contains("agroscout"));
    }

    #[test]
    fn test_slow_tier_is_a_file_inside_cache_dir() {
        let path = slow_tier_path();
        assert!(path.starts_with(cache_dir()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("redb"));
    }
}
