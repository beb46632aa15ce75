//! Ignore pattern matching (spec §4.7).
//!
//! Two independent scopes feed into a match decision:
//!
//! - *scoped*: one rule-list per directory, keyed by the directory's
//!   repo-relative path (`""` for the root). A `.gitignore` blob contributes
//!   its own directory's list.
//! - *absolute*: an ordered sequence of rule-lists (global config excludes
//!   file first, then the repo-local `info/exclude`), checked only when the
//!   scoped pass has no opinion.
//!
//! Within any single list, the last matching rule wins; `!`-prefixed rules
//! flip the polarity to re-include.

use std::path::Path;

use bstr::{BStr, BString, ByteSlice};
use rgit_utils::path::GitPath;
use rgit_utils::wildmatch::{WildmatchFlags, WildmatchPattern};

use crate::IndexError;

/// A single `(pattern, polarity)` ignore rule.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pattern: WildmatchPattern,
    /// `true` = ignore, `false` = re-include (a `!`-prefixed rule).
    polarity: bool,
    directory_only: bool,
    anchored: bool,
}

/// Parse one `.gitignore`-style line, or `None` for blank lines and comments.
fn parse_ignore_line(line: &[u8]) -> Option<IgnoreRule> {
    let mut line = line;

    if line.is_empty() || line[0] == b'#' {
        return None;
    }

    while line.len() > 1 && line.last() == Some(&b' ') && line[line.len() - 2] != b'\\' {
        line = &line[..line.len() - 1];
    }
    if line.is_empty() {
        return None;
    }

    let polarity_ignore = line[0] != b'!';
    if line[0] == b'!' {
        line = &line[1..];
        if line.is_empty() {
            return None;
        }
    }

    if line[0] == b'\\' && line.len() > 1 && (line[1] == b'#' || line[1] == b'!') {
        line = &line[1..];
    }

    let directory_only = line.last() == Some(&b'/');
    let line = if directory_only {
        &line[..line.len() - 1]
    } else {
        line
    };
    if line.is_empty() {
        return None;
    }

    let anchored = line.contains(&b'/');
    let pattern_str = if line[0] == b'/' { &line[1..] } else { line };

    let pattern = WildmatchPattern::new(BStr::new(pattern_str), WildmatchFlags::PATHNAME);

    Some(IgnoreRule {
        pattern,
        polarity: polarity_ignore,
        directory_only,
        anchored,
    })
}

/// Parse every line of a `.gitignore`-style blob into its rule-list.
pub fn parse_ignore_rules(content: &[u8]) -> Vec<IgnoreRule> {
    content.lines().filter_map(parse_ignore_line).collect()
}

fn pattern_matches(rule: &IgnoreRule, path: &BStr) -> bool {
    if rule.anchored {
        rule.pattern.matches(path)
    } else if rule.pattern.matches(path) {
        true
    } else if let Some(slash_pos) = path.rfind_byte(b'/') {
        rule.pattern.matches(BStr::new(&path[slash_pos + 1..]))
    } else {
        false
    }
}

/// Last matching rule in `rules` against `path`, if any.
fn last_match(rules: &[IgnoreRule], path: &BStr, is_dir: bool) -> Option<bool> {
    let mut result = None;
    for rule in rules {
        if rule.directory_only && !is_dir {
            continue;
        }
        if pattern_matches(rule, path) {
            result = Some(rule.polarity);
        }
    }
    result
}

/// The two-scope ignore engine described in spec §4.7.
#[derive(Debug, Clone, Default)]
pub struct IgnoreEngine {
    /// Rule-lists in load order: global config excludes file, then repo-local `info/exclude`.
    absolute: Vec<Vec<IgnoreRule>>,
    /// Per-directory `.gitignore` rule-lists, keyed by repo-relative directory path (`""` = root).
    scoped: std::collections::HashMap<BString, Vec<IgnoreRule>>,
}

impl IgnoreEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an absolute rule-list (in load order: global first, then repo-local).
    pub fn add_absolute_rules(&mut self, rules: Vec<IgnoreRule>) {
        self.absolute.push(rules);
    }

    /// Load and append an absolute rule-list from a file. A missing file
    /// contributes an empty list rather than an error (spec §7).
    pub fn add_absolute_file(&mut self, path: &Path) -> Result<(), IndexError> {
        let content = match std::fs::read(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(IndexError::Io(e)),
        };
        self.add_absolute_rules(parse_ignore_rules(&content));
        Ok(())
    }

    /// Register the rule-list parsed from the `.gitignore` blob that lives
    /// in `dir` (repo-relative, `""` for the root).
    pub fn add_scoped_rules(&mut self, dir: impl Into<BString>, rules: Vec<IgnoreRule>) {
        self.scoped.insert(dir.into(), rules);
    }

    /// Whether `path` (repo-relative, no leading `/`) is ignored.
    pub fn is_ignored(&self, path: &BStr, is_dir: bool) -> bool {
        if let Some(polarity) = self.match_scoped(path, is_dir) {
            return polarity;
        }
        self.match_absolute(path, is_dir).unwrap_or(false)
    }

    fn match_scoped(&self, path: &BStr, is_dir: bool) -> Option<bool> {
        let full = GitPath::new(path.as_bytes());
        let mut dir = full.dirname().to_owned();
        loop {
            let key = if dir.as_bytes() == b"." {
                BString::from("")
            } else {
                BString::from(dir.as_bytes())
            };
            if let Some(rules) = self.scoped.get(&key) {
                if let Some(polarity) = last_match(rules, path, is_dir) {
                    return Some(polarity);
                }
            }
            if key.is_empty() {
                return None;
            }
            dir = GitPath::new(dir.as_bytes()).dirname().to_owned();
        }
    }

    fn match_absolute(&self, path: &BStr, is_dir: bool) -> Option<bool> {
        let mut result = None;
        for list in &self.absolute {
            if let Some(polarity) = last_match(list, path, is_dir) {
                result = Some(polarity);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_pass_last_match_across_lists() {
        let mut engine = IgnoreEngine::new();
        engine.add_absolute_rules(parse_ignore_rules(b"*.log\n"));
        engine.add_absolute_rules(parse_ignore_rules(b"!keep.log\n"));

        assert!(engine.is_ignored(BStr::new(b"x.log"), false));
        assert!(!engine.is_ignored(BStr::new(b"keep.log"), false));
    }

    #[test]
    fn scoped_pass_walks_upward() {
        let mut engine = IgnoreEngine::new();
        engine.add_scoped_rules("", parse_ignore_rules(b"*.o\n"));
        engine.add_scoped_rules("src", parse_ignore_rules(b"!keep.o\n"));

        assert!(engine.is_ignored(BStr::new(b"a.o"), false));
        assert!(engine.is_ignored(BStr::new(b"src/a.o"), false));
        assert!(!engine.is_ignored(BStr::new(b"src/keep.o"), false));
    }

    #[test]
    fn scoped_pass_takes_priority_over_absolute() {
        let mut engine = IgnoreEngine::new();
        engine.add_absolute_rules(parse_ignore_rules(b"*.log\n"));
        engine.add_scoped_rules("", parse_ignore_rules(b"!x.log\n"));

        assert!(!engine.is_ignored(BStr::new(b"x.log"), false));
    }

    #[test]
    fn directory_only_pattern_requires_is_dir() {
        let mut engine = IgnoreEngine::new();
        engine.add_absolute_rules(parse_ignore_rules(b"build/\n"));

        assert!(engine.is_ignored(BStr::new(b"build"), true));
        assert!(!engine.is_ignored(BStr::new(b"build"), false));
    }

    #[test]
    fn comments_and_blank_lines_skipped() {
        let rules = parse_ignore_rules(b"# comment\n\n*.o\n");
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn escaped_leading_bang_is_literal() {
        let rules = parse_ignore_rules(b"\\!important\n");
        assert_eq!(rules.len(), 1);
        assert!(rules[0].polarity);
    }
}
