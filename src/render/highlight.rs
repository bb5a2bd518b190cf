use crate::error::ConfigError;
use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer};

/// A compiled, case-sensitive pattern used by a highlight rule.
///
/// Patterns built from strings replace every occurrence. A pattern can be
/// narrowed to its first occurrence with [`Matcher::first_only`].
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Regex,
    global: bool,
}

impl Matcher {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|error| ConfigError::InvalidMatcher {
            pattern: pattern.to_string(),
            error,
        })?;
        Ok(Self::from_regex(regex))
    }

    pub fn from_regex(regex: Regex) -> Self {
        Self {
            regex,
            global: true,
        }
    }

    pub fn first_only(mut self) -> Self {
        self.global = false;
        self
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_global(&self) -> bool {
        self.global
    }
}

impl PartialEq for Matcher {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str() && self.global == other.global
    }
}

impl<'de> Deserialize<'de> for Matcher {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let pattern = String::deserialize(deserializer)?;
        Matcher::new(&pattern).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HighlightRule {
    pub css_class: String,
    pub matcher: Matcher,
}

impl HighlightRule {
    pub fn new(css_class: impl Into<String>, pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            css_class: css_class.into(),
            matcher: Matcher::new(pattern)?,
        })
    }

    pub fn with_matcher(css_class: impl Into<String>, matcher: Matcher) -> Self {
        Self {
            css_class: css_class.into(),
            matcher,
        }
    }

    /// Wraps the matches of this rule in `markup`, scanning it exactly once.
    pub fn apply(&self, markup: &str) -> String {
        let limit = if self.matcher.global { 0 } else { 1 };
        self.matcher
            .regex
            .replacen(markup, limit, |caps: &Captures| {
                highlight_span(&self.css_class, &caps[0])
            })
            .into_owned()
    }
}

/// The error, success and warn rules every widget starts with.
pub fn default_rules() -> Vec<HighlightRule> {
    [("error", "ERROR"), ("success", "SUCCESS"), ("warn", "WARN")]
        .into_iter()
        .filter_map(|(css_class, literal)| HighlightRule::new(css_class, literal).ok())
        .collect()
}

pub fn highlight_span(css_class: &str, matched: &str) -> String {
    format!("<span class=\"highlight {}\">{}</span>", css_class, matched)
}

/// Applies `rules` last-to-first, each against the output of the previous one.
///
/// Rules declared earlier run later, so where their pattern covers a span
/// produced by a later rule they end up as the outer element.
pub fn highlight(rules: &[HighlightRule], text: &str) -> String {
    rules
        .iter()
        .rev()
        .fold(text.to_string(), |markup, rule| rule.apply(&markup))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_untouched() {
        let out = highlight(&default_rules(), "all quiet on the console");
        assert_eq!(out, "all quiet on the console");
        assert!(!out.contains("<span"));
    }

    #[test]
    fn test_single_error_match() {
        let out = highlight(&default_rules(), "ERROR: disk full");
        assert_eq!(out, "<span class=\"highlight error\">ERROR</span>: disk full");
        assert_eq!(out.matches("<span").count(), 1);
    }

    #[test]
    fn test_every_occurrence_is_wrapped() {
        let out = highlight(&default_rules(), "WARN then WARN");
        assert_eq!(
            out,
            "<span class=\"highlight warn\">WARN</span> then <span class=\"highlight warn\">WARN</span>"
        );
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let out = highlight(&default_rules(), "error: lowercase");
        assert_eq!(out, "error: lowercase");
    }

    #[test]
    fn test_earlier_rule_wraps_outermost_when_it_spans() {
        let rules = vec![
            HighlightRule::new("line", "^.*ERROR.*$").unwrap(),
            HighlightRule::new("error", "ERROR").unwrap(),
        ];
        let out = highlight(&rules, "ERROR: disk full");
        assert_eq!(
            out,
            "<span class=\"highlight line\"><span class=\"highlight error\">ERROR</span>: disk full</span>"
        );
    }

    #[test]
    fn test_earlier_rule_runs_last() {
        let rules = vec![
            HighlightRule::new("inner", "RR").unwrap(),
            HighlightRule::new("error", "ERROR").unwrap(),
        ];
        let out = highlight(&rules, "ERROR");
        assert_eq!(
            out,
            "<span class=\"highlight error\">E<span class=\"highlight inner\">RR</span>OR</span>"
        );
    }

    #[test]
    fn test_rule_is_applied_once() {
        let rules = vec![HighlightRule::new("highlight", "highlight").unwrap()];
        let out = highlight(&rules, "highlight me");
        assert_eq!(
            out,
            "<span class=\"highlight highlight\">highlight</span> me"
        );
    }

    #[test]
    fn test_first_only_matcher() {
        let matcher = Matcher::from_regex(Regex::new("ok").unwrap()).first_only();
        let rules = vec![HighlightRule::with_matcher("success", matcher)];
        let out = highlight(&rules, "ok ok");
        assert_eq!(out, "<span class=\"highlight success\">ok</span> ok");
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = HighlightRule::new("broken", "(unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMatcher { .. }));
    }

    #[test]
    fn test_rule_deserializes_from_json() {
        let rule: HighlightRule =
            serde_json::from_str(r#"{"css_class":"timeout","matcher":"timed? out"}"#).unwrap();
        assert_eq!(rule.css_class, "timeout");
        assert_eq!(rule.matcher.as_str(), "timed? out");
        assert!(rule.matcher.is_global());

        let bad = serde_json::from_str::<HighlightRule>(r#"{"css_class":"x","matcher":"["}"#);
        assert!(bad.is_err());
    }
}
