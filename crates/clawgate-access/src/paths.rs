//! Sensitive-path classification and workspace boundaries.
//!
//! Both checks are lexical. Nothing here touches the filesystem: symlinks are
//! not followed and non-existent paths classify the same as existing ones.

use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

/// Paths relative to the home directory that hold credentials.
const HOME_PREFIXES: &[&str] = &[
    ".ssh",
    ".aws",
    ".gnupg",
    ".azure",
    ".kube",
    ".config/gcloud",
    ".docker/config.json",
    ".netrc",
    ".npmrc",
    ".pypirc",
    ".git-credentials",
    ".password-store",
];

/// Substrings that mark a credential location anywhere in a path.
const LITERAL_SUBSTRINGS: &[&str] = &[
    "/.ssh/",
    "/.aws/",
    "/.gnupg/",
    "/etc/shadow",
    "/etc/gshadow",
    "/etc/sudoers",
    "/etc/master.passwd",
    "/.kube/config",
    "/.docker/config.json",
    "/.git-credentials",
];

/// Wildcard patterns matched against the final path component.
const FILE_NAME_PATTERNS: &[&str] = &[
    ".env*",
    "id_rsa*",
    "id_dsa*",
    "id_ecdsa*",
    "id_ed25519*",
    "*.pem",
    "*.key",
    "*.p12",
    "*.pfx",
    "*.jks",
    "*.keystore",
    "*.kdbx",
    "*secret*",
    "*password*",
    "*token*",
    "*credential*",
    "*api?key*",
    "*apikey*",
];

/// Translate a `*`/`?` wildcard into an anchored case-insensitive regex.
fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len().saturating_mul(2).saturating_add(6));
    out.push_str("(?i)^");
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }
    out.push('$');
    out
}

static FILE_NAME_SET: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(FILE_NAME_PATTERNS.iter().map(|p| wildcard_to_regex(p)))
        .expect("invalid sensitive file name pattern")
});

static HOME_DIR: LazyLock<Option<String>> = LazyLock::new(|| {
    directories::BaseDirs::new()
        .and_then(|d| d.home_dir().to_str().map(|s| s.replace('\\', "/")))
        .map(|s| s.trim_end_matches('/').to_string())
});

/// Which registry entry classified a path as sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "pattern", rename_all = "snake_case")]
pub enum SensitiveMatch {
    /// A credential directory or file under the home directory.
    HomePrefix(&'static str),
    /// A credential location recognized anywhere in the path.
    Substring(&'static str),
    /// A file name wildcard such as `*.pem`.
    FileName(&'static str),
}

impl SensitiveMatch {
    /// The registry pattern that matched.
    #[must_use]
    pub fn pattern(&self) -> &'static str {
        match self {
            Self::HomePrefix(p) | Self::Substring(p) | Self::FileName(p) => p,
        }
    }
}

/// Replace backslashes and expand a leading `~`.
fn expand_home(path: &str, home: Option<&str>) -> String {
    let path = path.trim().replace('\\', "/");
    match (home, path.strip_prefix('~')) {
        (Some(home), Some(rest)) if rest.is_empty() || rest.starts_with('/') => {
            format!("{home}{rest}")
        },
        _ => path,
    }
}

fn classify_with_home(path: &str, home: Option<&str>) -> Option<SensitiveMatch> {
    if path.trim().is_empty() {
        return None;
    }
    let expanded = expand_home(path, home);
    let folded = expanded.to_lowercase();

    let home_root = home.unwrap_or("~").to_lowercase();
    for prefix in HOME_PREFIXES {
        let full = format!("{home_root}/{prefix}");
        if folded == full || folded.starts_with(&format!("{full}/")) {
            return Some(SensitiveMatch::HomePrefix(prefix));
        }
    }

    if let Some(sub) = LITERAL_SUBSTRINGS.iter().find(|s| folded.contains(*s)) {
        return Some(SensitiveMatch::Substring(sub));
    }

    let file_name = folded.rsplit('/').next().unwrap_or(&folded);
    FILE_NAME_SET
        .matches(file_name)
        .iter()
        .next()
        .and_then(|idx| FILE_NAME_PATTERNS.get(idx).copied())
        .map(SensitiveMatch::FileName)
}

/// Classify a path against the sensitive-path registry.
///
/// Returns the first registry entry that matches, checking home-relative
/// prefixes, then literal substrings, then file name wildcards.
#[must_use]
pub fn classify_sensitive_path(path: &str) -> Option<SensitiveMatch> {
    classify_with_home(path, HOME_DIR.as_deref())
}

/// Check whether a path points at credentials or other secrets.
#[must_use]
pub fn is_sensitive_path(path: &str) -> bool {
    classify_sensitive_path(path).is_some()
}

/// Lexically normalize a path: drop `.`, fold `..` (never above the root).
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {},
            Component::ParentDir => {
                out.pop();
            },
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Resolve a path to an absolute, normalized form without touching the disk.
///
/// `~` expands to the home directory and relative paths resolve against
/// `base` (or the process working directory when `base` is `None`).
#[must_use]
pub fn resolve_path(path: &str, base: Option<&Path>) -> PathBuf {
    let expanded = PathBuf::from(expand_home(path, HOME_DIR.as_deref()));
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        let base = base.map_or_else(
            || std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")),
            Path::to_path_buf,
        );
        base.join(expanded)
    };
    normalize_lexically(&absolute)
}

/// Check whether `path` falls outside `workspace_dir`.
///
/// Both sides are resolved to absolute normalized form; relative paths are
/// taken relative to the workspace. Containment is component-wise, so
/// `/srv/ws-other` is outside `/srv/ws`.
#[must_use]
pub fn is_outside_workspace(path: &str, workspace_dir: &str) -> bool {
    let workspace = resolve_path(workspace_dir, None);
    let target = resolve_path(path, Some(&workspace));
    !target.starts_with(&workspace)
}
