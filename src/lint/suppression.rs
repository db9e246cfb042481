//! Parses the three suppression-comment forms out of raw source text (not
//! the AST — suppression is a lexical concern, so it applies even to a file
//! the parser currently rejects).

use std::collections::{HashMap, HashSet};

use regex::Regex;

#[derive(Debug, Default)]
pub struct SuppressionMap {
    file_wide: HashSet<String>,
    per_line: HashMap<usize, HashSet<String>>,
}

impl SuppressionMap {
    pub fn is_suppressed(&self, rule: &str, line: usize) -> bool {
        self.file_wide.contains(rule)
            || self
                .per_line
                .get(&line)
                .map(|set| set.contains(rule))
                .unwrap_or(false)
    }
}

pub fn parse_suppressions(source: &str) -> SuppressionMap {
    let pattern = Regex::new(r"#\s*adl-disable(-line|-next-line)?\s+([A-Za-z0-9_-]+)")
        .expect("static pattern");
    let lines: Vec<&str> = source.lines().collect();
    let mut map = SuppressionMap::default();

    for (idx, line) in lines.iter().enumerate() {
        let line_number = idx + 1;
        for capture in pattern.captures_iter(line) {
            let rule = capture[2].to_string();
            match capture.get(1).map(|m| m.as_str()) {
                Some("-line") => {
                    map.per_line.entry(line_number).or_default().insert(rule);
                }
                Some("-next-line") => {
                    if let Some(target) = next_non_comment_line(&lines, idx) {
                        map.per_line.entry(target).or_default().insert(rule);
                    }
                }
                _ => {
                    map.file_wide.insert(rule);
                }
            }
        }
    }

    map
}

/// The 1-based line number of the next line after `after_idx` (0-based)
/// that isn't blank or a pure comment line.
fn next_non_comment_line(lines: &[&str], after_idx: usize) -> Option<usize> {
    for (offset, line) in lines.iter().enumerate().skip(after_idx + 1) {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        return Some(offset + 1);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disable_line_scopes_to_the_comment_line() {
        let source = "agent A {\n  name: string # adl-disable-line field-name-snake-case\n}\n";
        let map = parse_suppressions(source);
        assert!(map.is_suppressed("field-name-snake-case", 2));
        assert!(!map.is_suppressed("field-name-snake-case", 1));
    }

    #[test]
    fn disable_next_line_skips_comment_lines() {
        let source = "# adl-disable-next-line max-line-length\n# a plain comment\nagent A { name: string }\n";
        let map = parse_suppressions(source);
        assert!(map.is_suppressed("max-line-length", 3));
    }

    #[test]
    fn disable_applies_file_wide() {
        let source = "# adl-disable tab-character\nagent A { name: string }\n";
        let map = parse_suppressions(source);
        assert!(map.is_suppressed("tab-character", 1));
        assert!(map.is_suppressed("tab-character", 500));
    }
}
