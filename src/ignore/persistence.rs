//! Ignore list persistence.
//!
//! One rule per line, `server;channel;mask`, in list order. `*` stands for
//! "any" in the first two fields. The mask is the rest of the line and may
//! itself contain `;`.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use super::IgnoreList;
use crate::error::IgnoreError;

/// One parsed line: `(server, channel, mask)`.
pub type IgnoreLine<'a> = (&'a str, &'a str, &'a str);

/// Parse one line. `line_no` is 1-based and only used for errors.
pub fn parse_line(line: &str, line_no: usize) -> Result<IgnoreLine<'_>, IgnoreError> {
    let mut parts = line.splitn(3, ';');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(server), Some(channel), Some(mask)) => Ok((server, channel, mask)),
        _ => Err(IgnoreError::MalformedLine {
            line: line_no,
            content: line.to_string(),
        }),
    }
}

/// Render every rule in list order.
pub fn to_lines(list: &IgnoreList) -> Vec<String> {
    list.iter()
        .map(|rule| format!("{};{};{}", rule.server(), rule.channel(), rule.mask()))
        .collect()
}

/// Replace the rules of `list` with those in `content`.
///
/// Existing rules are dropped without notifying observers. Lines that do
/// not parse or whose mask does not compile are skipped with a warning.
/// Returns the number of rules loaded.
pub fn load_str(list: &mut IgnoreList, content: &str) -> usize {
    list.clear_silently();
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let result = parse_line(line, index + 1)
            .and_then(|(server, channel, mask)| {
                list.add(mask, Some(server), Some(channel)).map(|_| ())
            });
        if let Err(e) = result {
            warn!(line = index + 1, error = %e, "Skipping ignore entry");
        }
    }
    list.len()
}

/// Load rules from a file, replacing the current ones.
pub fn load_file<P: AsRef<Path>>(list: &mut IgnoreList, path: P) -> Result<usize, IgnoreError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let count = load_str(list, &content);
    info!(path = %path.display(), count, "Loaded ignore list");
    Ok(count)
}

/// Write every rule to a file, replacing its content.
pub fn save_file<P: AsRef<Path>>(list: &IgnoreList, path: P) -> Result<(), IgnoreError> {
    let path = path.as_ref();
    let mut content = to_lines(list).join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    fs::write(path, content)?;
    info!(path = %path.display(), count = list.len(), "Saved ignore list");
    Ok(())
}
