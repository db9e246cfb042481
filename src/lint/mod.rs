//! Linter (C11): a registry of independent `Rule`s, each
//! either AST-aware or a plain per-line check, filtered by severity and
//! suppression comments, with an optional monotone autofix pass.

mod rules;
mod suppression;

pub use rules::{default_rules, Rule};
pub use suppression::{parse_suppressions, SuppressionMap};

use crate::ast::Program;
use crate::location::SourceLocation;
use crate::parser::parse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LintIssue {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    pub location: SourceLocation,
}

impl LintIssue {
    pub fn new(
        rule: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self {
            rule: rule.into(),
            severity,
            message: message.into(),
            location,
        }
    }
}

/// What a `Rule`'s `check` function sees: the raw text, split into lines for
/// the per-line checks, and the parsed `Program` when the source parses
/// (AST-aware rules return nothing when it doesn't; syntax errors don't
/// block the per-line rules from running).
pub struct LintContext<'a> {
    pub source: &'a str,
    pub lines: Vec<&'a str>,
    pub program: Option<&'a Program>,
    pub max_line_length: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LintOptions {
    pub min_severity: Severity,
    pub max_line_length: usize,
    pub disabled_rules: Vec<String>,
}

impl Default for LintOptions {
    fn default() -> Self {
        Self {
            min_severity: Severity::Info,
            max_line_length: 100,
            disabled_rules: Vec::new(),
        }
    }
}

pub fn lint_source(source: &str, options: &LintOptions) -> Vec<LintIssue> {
    lint_with_rules(source, options, &default_rules())
}

fn lint_with_rules(source: &str, options: &LintOptions, rules: &[Rule]) -> Vec<LintIssue> {
    let parsed = parse(source).ok();
    let ctx = LintContext {
        source,
        lines: source.lines().collect(),
        program: parsed.as_ref(),
        max_line_length: options.max_line_length,
    };
    let suppressions = parse_suppressions(source);

    let mut issues = Vec::new();
    for rule in rules {
        if rule.severity < options.min_severity {
            continue;
        }
        if options.disabled_rules.iter().any(|r| r == rule.name) {
            continue;
        }
        for issue in (rule.check)(&ctx) {
            if !suppressions.is_suppressed(&issue.rule, issue.location.line) {
                issues.push(issue);
            }
        }
    }
    issues.sort_by(|a, b| a.location.cmp(&b.location).then_with(|| a.rule.cmp(&b.rule)));
    issues
}

/// Applies every fixable rule's `fix` once per pass, repeating until a pass
/// makes no change (bounded to avoid a pathological fix/unfix cycle). Each
/// pass strictly shrinks the set of issues those rules report: a fix never
/// reintroduces the condition it just corrected.
pub fn fix_source(source: &str, options: &LintOptions) -> String {
    let mut current = source.to_string();
    let fixable: Vec<&Rule> = default_rules_fixable(options);

    for _ in 0..8 {
        let mut changed = false;
        for rule in &fixable {
            if let Some(fix) = rule.fix {
                let next = fix(&current);
                if next != current {
                    current = next;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    current
}

fn default_rules_fixable(options: &LintOptions) -> Vec<&'static Rule> {
    static RULES: std::sync::OnceLock<Vec<Rule>> = std::sync::OnceLock::new();
    let all = RULES.get_or_init(default_rules);
    all.iter()
        .filter(|r| r.fix.is_some() && r.severity >= options.min_severity)
        .filter(|r| !options.disabled_rules.iter().any(|name| name == r.name))
        .collect()
}
