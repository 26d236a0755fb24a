//! Link injection for index documents. A minimal streaming tag scanner
//! removes any previously injected `<link>` carrying the fixed id, then a
//! fresh tag is inserted immediately before the first closing head tag.
//! No full HTML parse; only tags and comments are recognized.

use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{BuildError, Result};
use crate::manager::Manager;

/// Fixed id carried by the injected link element. At most one element with
/// this id exists per document after injection.
pub const CSS_LINK_ID: &str = "litecss-custom-css";

/// Number of hash characters used in the cache-busting query token.
pub const TOKEN_LEN: usize = 8;

/// SHA-256 over a file's raw bytes, as lowercase hex.
pub fn file_hash(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| BuildError::read(path, e))?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{digest:x}"))
}

/// Inject (or refresh) the stylesheet link in one index document.
///
/// Documents without a closing head tag are skipped with a warning.
/// Idempotent: any existing tagged link is removed first.
pub fn inject_css_link(manager: &Manager, index_file: &Path, css_dest: &Path) -> Result<()> {
    let content =
        fs::read_to_string(index_file).map_err(|e| BuildError::read(index_file, e))?;

    if find_head_close(&content).is_none() {
        warn!("no </head> found in {}, skipping", index_file.display());
        return Ok(());
    }

    let hash = file_hash(css_dest)?;
    let rel = relative_css_path(&manager.output_dir, index_file, css_dest);
    let link_tag = format!(
        "    <link id=\"{CSS_LINK_ID}\" rel=\"stylesheet\" href=\"{rel}?_={token}\">\n  ",
        token = &hash[..TOKEN_LEN]
    );

    let stripped = strip_tagged_links(&content, CSS_LINK_ID);
    let head_at = match find_head_close(&stripped) {
        Some(at) => at,
        None => {
            warn!("no </head> found in {}, skipping", index_file.display());
            return Ok(());
        }
    };

    let mut updated = String::with_capacity(stripped.len() + link_tag.len());
    updated.push_str(&stripped[..head_at]);
    updated.push_str(&link_tag);
    updated.push_str(&stripped[head_at..]);

    fs::write(index_file, updated).map_err(|e| BuildError::write(index_file, e))?;
    manager.maybe_timestamp(index_file)?;
    debug!("injected custom.css link into {}", index_file.display());
    Ok(())
}

/// Relative posix-style path from an index document's directory to the
/// stylesheet destination. `./`-prefixed when no parent traversal is
/// needed, `../` segments otherwise.
pub fn relative_css_path(output_dir: &Path, index_file: &Path, css_dest: &Path) -> String {
    let from = index_file
        .parent()
        .and_then(|p| p.strip_prefix(output_dir).ok())
        .map(posix_components)
        .unwrap_or_default();
    let to = css_dest
        .strip_prefix(output_dir)
        .map(posix_components)
        .unwrap_or_else(|_| posix_components(css_dest));

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let ups = from.len() - common;

    let mut parts: Vec<String> = Vec::new();
    if ups == 0 {
        parts.push(".".to_string());
    } else {
        parts.extend(std::iter::repeat("..".to_string()).take(ups));
    }
    parts.extend(to[common..].iter().cloned());
    parts.join("/")
}

fn posix_components(path: &Path) -> Vec<String> {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect()
}

/// Byte offset of the first real case-insensitive closing head tag.
/// Walks the document tag by tag, so a `</head>` sitting inside a comment
/// or a quoted attribute value is not an injection point.
pub fn find_head_close(html: &str) -> Option<usize> {
    let bytes = html.as_bytes();
    let mut i = 0;

    while i < html.len() {
        let rel = html[i..].find('<')?;
        i += rel;

        if html[i..].starts_with("<!--") {
            i = i + html[i..].find("-->")? + 3;
            continue;
        }
        if is_head_close(&html[i..]) {
            return Some(i);
        }
        match bytes.get(i + 1) {
            // A tag; step over it, honoring quoted attribute values.
            Some(b) if b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?') => {
                i = tag_end(html, i)?;
            }
            // A bare '<' in text.
            _ => i += 1,
        }
    }
    None
}

/// Whether `rest` starts with a closing head tag (`</head>`, any case,
/// optional whitespace before the `>`).
fn is_head_close(rest: &str) -> bool {
    let Some(rest) = rest.strip_prefix("</") else {
        return false;
    };
    let bytes = rest.as_bytes();
    if bytes.len() < 4 || !bytes[..4].eq_ignore_ascii_case(b"head") {
        return false;
    }
    rest[4..].trim_start().starts_with('>')
}

/// Remove every `<link>` element whose id attribute equals `id`, leaving
/// the rest of the document untouched. Attribute order and attribute-name
/// case do not matter; self-closing forms are handled. When a removed tag
/// occupied its own line, the surrounding padding is swallowed with it so
/// repeated injection converges.
pub fn strip_tagged_links(html: &str, id: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut i = 0;

    while i < html.len() {
        let Some(rel) = html[i..].find('<') else {
            out.push_str(&html[i..]);
            break;
        };
        out.push_str(&html[i..i + rel]);
        i += rel;

        if html[i..].starts_with("<!--") {
            let end = html[i..]
                .find("-->")
                .map(|j| i + j + 3)
                .unwrap_or(html.len());
            out.push_str(&html[i..end]);
            i = end;
            continue;
        }

        let Some(end) = tag_end(html, i) else {
            // Unterminated tag; pass the rest through untouched.
            out.push_str(&html[i..]);
            break;
        };

        if is_tagged_link(&html[i..end], id) {
            if sits_on_own_line(&out, &html[end..]) {
                trim_trailing_indent(&mut out);
                i = skip_padding(html, end);
            } else {
                i = end;
            }
        } else {
            out.push_str(&html[i..end]);
            i = end;
        }
    }

    out
}

/// Index just past the `>` closing the tag opened at `start`, honoring
/// quoted attribute values.
fn tag_end(html: &str, start: usize) -> Option<usize> {
    let bytes = html.as_bytes();
    let mut quote: Option<u8> = None;
    for (j, &b) in bytes.iter().enumerate().skip(start + 1) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => return Some(j + 1),
                _ => {}
            },
        }
    }
    None
}

/// Whether `tag` (including angle brackets) is a link element carrying the
/// given id attribute value.
fn is_tagged_link(tag: &str, id: &str) -> bool {
    let inner = tag
        .strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or(tag);
    let inner = inner.strip_suffix('/').unwrap_or(inner);

    let name_end = inner
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(inner.len());
    let (name, attrs) = inner.split_at(name_end);
    if !name.eq_ignore_ascii_case("link") {
        return false;
    }
    attr_value(attrs, "id").map(|v| v == id).unwrap_or(false)
}

/// Value of the named attribute within a tag's attribute text, if present.
/// Attribute names compare case-insensitively; values may be quoted with
/// either quote style or bare; a valueless attribute yields "".
fn attr_value<'a>(attrs: &'a str, wanted: &str) -> Option<&'a str> {
    let bytes = attrs.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }

        let name_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' {
            i += 1;
        }
        let name = &attrs[name_start..i];

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        if i >= bytes.len() || bytes[i] != b'=' {
            if name.eq_ignore_ascii_case(wanted) {
                return Some("");
            }
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let value = if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
            let q = bytes[i];
            i += 1;
            let v_start = i;
            while i < bytes.len() && bytes[i] != q {
                i += 1;
            }
            let v = &attrs[v_start..i];
            if i < bytes.len() {
                i += 1;
            }
            v
        } else {
            let v_start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'/' {
                i += 1;
            }
            &attrs[v_start..i]
        };

        if name.eq_ignore_ascii_case(wanted) {
            return Some(value);
        }
    }

    None
}

/// Whether a removed tag occupied its own line: nothing but spaces/tabs
/// between it and the surrounding newlines (or document edges). Padding
/// is only swallowed in that case, so removing a mid-line tag never fuses
/// its neighbors.
fn sits_on_own_line(out: &str, rest: &str) -> bool {
    let before = out.trim_end_matches([' ', '\t']);
    if !(before.is_empty() || before.ends_with('\n')) {
        return false;
    }
    let after = rest.trim_start_matches([' ', '\t']);
    after.is_empty() || after.starts_with('\n')
}

/// Drop spaces/tabs at the end of `out`, back to the last newline.
fn trim_trailing_indent(out: &mut String) {
    while out.ends_with(' ') || out.ends_with('\t') {
        out.pop();
    }
}

/// Skip the padding an earlier injection left after its tag: spaces/tabs,
/// at most one newline, then the next line's indentation.
fn skip_padding(html: &str, mut i: usize) -> usize {
    let bytes = html.as_bytes();
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'\n' {
        i += 1;
        while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
            i += 1;
        }
    }
    i
}
