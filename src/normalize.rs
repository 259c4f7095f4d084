//! Metadata path normalization
//!
//! Model-tracking metadata written on Windows records absolute,
//! drive-letter-rooted artifact paths (`file:///C:/Users/.../mlruns/...`).
//! Inside a container those paths are dead. This module walks a tracking
//! directory and rewrites every such path in `meta.yaml` and `MLmodel`
//! files to the container-local base path, leaving all other content
//! byte-for-byte intact.
//!
//! Substitutions are applied in a fixed order over the full file text:
//!
//! 1. `file:///<DRIVE>:<sep>...<sep>mlruns<sep>?` → target base
//! 2. `<DRIVE>:<sep>...<sep>mlruns<sep>?` → target base
//! 3. `storage_location:` field values, keeping the post-`mlruns` remainder
//! 4. `artifact_path:` field values, same rewrite
//!
//! Drive letters are case-sensitive `A`–`Z`; the path interior is matched
//! non-greedily so the first `mlruns` segment terminates the match.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::warn;
use walkdir::WalkDir;

/// Default replacement base path inside the container
pub const TARGET_BASE: &str = "/app/mlruns";

/// File names that trigger rewriting; everything else is ignored
pub const METADATA_FILENAMES: [&str; 2] = ["meta.yaml", "MLmodel"];

fn uri_path_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"file:///[A-Z]:[/\\].*?[/\\]mlruns[/\\]?").expect("regex must compile")
    })
}

fn bare_path_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Z]:[/\\].*?[/\\]mlruns[/\\]?").expect("regex must compile"))
}

fn storage_location_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"storage_location:\s*(file:///)?[A-Z]:[/\\].*?[/\\]mlruns[/\\](.*)")
            .expect("regex must compile")
    })
}

fn artifact_path_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"artifact_path:\s*(file:///)?[A-Z]:[/\\].*?[/\\]mlruns[/\\](.*)")
            .expect("regex must compile")
    })
}

/// Apply the substitution chain to one metadata text
///
/// Pure text transform; returns the rewritten content. Callers compare with
/// the original to decide whether the file changed.
#[must_use]
pub fn rewrite_metadata(content: &str, target_base: &str) -> String {
    let mut text = uri_path_pattern()
        .replace_all(content, target_base)
        .into_owned();
    text = bare_path_pattern()
        .replace_all(&text, target_base)
        .into_owned();

    if text.contains("storage_location:") {
        text = storage_location_pattern()
            .replace_all(&text, |caps: &Captures| {
                let rest = caps.get(2).map_or("", |m| m.as_str());
                format!("storage_location: {target_base}/{rest}")
            })
            .into_owned();
    }

    if text.contains("artifact_path:") {
        text = artifact_path_pattern()
            .replace_all(&text, |caps: &Captures| {
                let rest = caps.get(2).map_or("", |m| m.as_str());
                format!("artifact_path: {target_base}/{rest}")
            })
            .into_owned();
    }

    text
}

/// Walk `root` and rewrite Windows-absolute paths in all metadata files
///
/// Returns the number of files actually rewritten. A read or write error on
/// one file is logged and skipped; it never aborts the walk. Files with no
/// matching pattern are left untouched and not counted.
pub fn fix_windows_paths(root: &Path, target_base: &str) -> usize {
    let mut fixed = 0;
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !METADATA_FILENAMES.contains(&name.as_ref()) {
            continue;
        }
        let path = entry.path();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read metadata file");
                continue;
            }
        };
        let rewritten = rewrite_metadata(&content, target_base);
        if rewritten == content {
            continue;
        }
        if let Err(err) = fs::write(path, &rewritten) {
            warn!(path = %path.display(), error = %err, "failed to write metadata file");
            continue;
        }
        fixed += 1;
        println!("[OK] Fixed: {}", path.display());
    }
    fixed
}
