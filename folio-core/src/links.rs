//! URL helpers shared by the renderer and the output writer.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::{ParseError, Url};

/// Characters left as-is in a path segment. `:` is escaped too so the
/// segment is also a valid file name on every platform.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'=')
    .remove(b'@');

/// Resolve `path` against `base`.
///
/// A root-relative base such as `/site/` is joined like an absolute one.
/// Falls back to `path` itself when `base` is empty or cannot be parsed, so a
/// bad base URL only turns links into site-relative ones.
pub fn abs_url(base: &str, path: &str) -> String {
    if base.is_empty() {
        return path.to_string();
    }

    match join_path(base, path) {
        Ok(url) => url,
        Err(e) => {
            log::debug!("Keeping `{}` relative, base URL `{}` is invalid: {}", path, base, e);
            path.to_string()
        }
    }
}

/// Append `path` to the path of `base`.
///
/// Unlike [`Url::join`] this never drops the last segment of the base path:
/// `https://example.com/site` + `img/a.jpg` is `https://example.com/site/img/a.jpg`.
pub fn join_path(base: &str, path: &str) -> Result<String, ParseError> {
    let mut url = match Url::parse(base) {
        Ok(url) => url,
        Err(ParseError::RelativeUrlWithoutBase) => return join_relative(base, path),
        Err(e) => return Err(e),
    };
    if url.cannot_be_a_base() {
        return Err(ParseError::RelativeUrlWithCannotBeABaseBase);
    }

    let joined = clean_join(url.path(), path);
    url.set_path(&joined);

    Ok(url.into())
}

// Bases without a scheme: `/site/`, `site/` or `//cdn.example.com/site/`.
fn join_relative(base: &str, path: &str) -> Result<String, ParseError> {
    if base.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ParseError::RelativeUrlWithoutBase);
    }

    if base.starts_with("//") {
        let joined = join_path(&format!("http:{base}"), path)?;
        return Ok(joined.trim_start_matches("http:").to_string());
    }

    let split = base.find(['?', '#']).unwrap_or(base.len());
    let (base_path, suffix) = base.split_at(split);

    let joined = clean_join(base_path, path);
    let joined = if base_path.starts_with('/') {
        joined.as_str()
    } else {
        joined.trim_start_matches('/')
    };

    Ok(format!("{joined}{suffix}"))
}

/// Percent-escape `segment` so it stays a single path segment, both in a URL
/// and on disk.
pub fn escape_segment(segment: &str) -> String {
    match segment {
        "." => "%2E".to_string(),
        ".." => "%2E%2E".to_string(),
        _ => utf8_percent_encode(segment, SEGMENT).to_string(),
    }
}

fn clean_join(base_path: &str, path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in base_path.split('/').chain(path.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut joined = format!("/{}", segments.join("/"));

    let last = if path.is_empty() { base_path } else { path };
    if last.ends_with('/') && !joined.ends_with('/') {
        joined.push('/');
    }

    joined
}
