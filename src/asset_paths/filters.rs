use std::sync::OnceLock;

use regex::Regex;

/// Matches the scheme of a reference that names no file on disk.
///
/// Network and resolver schemes (`https://`, `s3://`, `omniverse://`) need at least two
/// letters so `C://scenes` stays a drive path. Inline `data:` payloads and `mailto:`
/// contacts carry no `//`.
fn remote_scheme() -> &'static Regex {
    static SCHEME: OnceLock<Regex> = OnceLock::new();
    SCHEME.get_or_init(|| {
        Regex::new(r"(?i)^(?:(?P<network>[a-z][a-z0-9+.-]+)://|(?P<inline>data|mailto):)")
            .expect("invalid remote scheme regex")
    })
}

/// Scheme of `asset_path` when it points somewhere a localized tree cannot hold.
pub fn remote_scheme_of(asset_path: &str) -> Option<&str> {
    let captures = remote_scheme().captures(asset_path.trim_start())?;
    captures
        .name("network")
        .or_else(|| captures.name("inline"))
        .map(|scheme| scheme.as_str())
}

/// Returns `true` when `asset_path` is a URL or inline payload rather than a file.
///
/// Such references are still offered to the dependency processor but are never placed
/// or copied.
pub fn should_skip_asset_path(asset_path: &str) -> bool {
    remote_scheme_of(asset_path).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_schemes_are_remote() {
        assert_eq!(remote_scheme_of("https://example.com/scene.json"), Some("https"));
        assert_eq!(remote_scheme_of("HTTP://example.com"), Some("HTTP"));
        assert_eq!(remote_scheme_of("s3+cache://bucket/key.json"), Some("s3+cache"));
        assert_eq!(remote_scheme_of("omniverse://farm/set.json"), Some("omniverse"));
    }

    #[test]
    fn inline_payloads_are_remote() {
        assert_eq!(remote_scheme_of("data:image/png;base64,abc"), Some("data"));
        assert_eq!(remote_scheme_of("mailto:lighting@example.com"), Some("mailto"));
    }

    #[test]
    fn file_paths_are_local() {
        assert!(!should_skip_asset_path("textures/albedo.png"));
        assert!(!should_skip_asset_path("/abs/scene.json"));
        assert!(!should_skip_asset_path("C:/scenes/root.json"));
        assert!(!should_skip_asset_path("C://scenes/root.json"));
        assert!(!should_skip_asset_path("pkg.pkgz[a.json]"));
        assert!(!should_skip_asset_path("metadata.json"));
    }
}
