//! Local path to remote key mapping.

use std::path::MAIN_SEPARATOR;

use s3_backup_models::PathMapping;

/// Derives the remote key for `local_path`.
///
/// * `strip_count = None` keeps the local path as the key.
/// * `strip_count = Some(n)` drops the first `n` directories of the path.
///   The empty segment before an absolute path's leading separator counts
///   as one more, so `n + 1` segments are dropped from the directory part.
///   Stripping more directories than exist leaves `"/" + base_name`.
/// * A non-empty `prepend` is concatenated verbatim in front of the key.
///
/// Never fails; degenerate inputs still produce a mapping.
#[must_use]
pub fn resolve(local_path: &str, strip_count: Option<usize>, prepend: Option<&str>) -> PathMapping {
    let mut output_key =
        strip_count.map_or_else(|| local_path.to_string(), |n| strip_path(local_path, n));

    if let Some(prefix) = prepend.filter(|p| !p.is_empty()) {
        output_key.insert_str(0, prefix);
    }

    PathMapping {
        input_path: local_path.to_string(),
        output_key,
    }
}

/// Parses a strip count given on the command line.
///
/// Anything that is not a non-negative integer is treated as "no strip
/// count" rather than rejected.
#[must_use]
pub fn parse_strip_count(raw: &str) -> Option<usize> {
    match raw.trim().parse::<usize>() {
        Ok(n) => Some(n),
        Err(e) => {
            log::warn!("Ignoring strip count {raw:?} ({e}); using the full path as the key");
            None
        }
    }
}

fn strip_path(path: &str, strip: usize) -> String {
    let (dir, base_name) = path.rsplit_once(MAIN_SEPARATOR).unwrap_or((".", path));

    let mut key = String::with_capacity(path.len() + 1);
    key.push(MAIN_SEPARATOR);
    for segment in dir.split(MAIN_SEPARATOR).skip(strip.saturating_add(1)) {
        key.push_str(segment);
        key.push(MAIN_SEPARATOR);
    }
    key.push_str(base_name);
    key
}
