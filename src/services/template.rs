//! Template evaluation collaborator.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::Result;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{\s*([A-Za-z0-9_.\-]+)\s*\}").expect("valid placeholder regex"))
}

/// Variables visible to template evaluation for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableContext {
    values: HashMap<String, String>,
}

impl VariableContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<HashMap<String, String>> for VariableContext {
    fn from(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

/// Resolves `${variable}`-style placeholders in configuration strings.
pub trait TemplateEvaluator: Send + Sync {
    fn evaluate(&self, input: &str, variables: &VariableContext) -> Result<String>;
}

/// Substitutes `${name}` from the variable context. Unknown names are left as written.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderEvaluator;

impl TemplateEvaluator for PlaceholderEvaluator {
    fn evaluate(&self, input: &str, variables: &VariableContext) -> Result<String> {
        if !input.contains("${") {
            return Ok(input.to_string());
        }
        let replaced = placeholder_regex().replace_all(input, |caps: &Captures<'_>| {
            variables
                .get(&caps[1])
                .map(str::to_string)
                .unwrap_or_else(|| caps[0].to_string())
        });
        Ok(replaced.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitutes_known_variables() {
        let vars = VariableContext::new()
            .with("host", "api.example.com")
            .with("user", "alice");
        let out = PlaceholderEvaluator
            .evaluate("https://${host}/users/${ user }", &vars)
            .unwrap();
        assert_eq!(out, "https://api.example.com/users/alice");
    }

    #[test]
    fn test_unknown_variables_are_kept() {
        let out = PlaceholderEvaluator
            .evaluate("${missing}-x", &VariableContext::new())
            .unwrap();
        assert_eq!(out, "${missing}-x");
    }

    #[test]
    fn test_plain_strings_pass_through() {
        let out = PlaceholderEvaluator
            .evaluate("no placeholders", &VariableContext::new())
            .unwrap();
        assert_eq!(out, "no placeholders");
    }
}
