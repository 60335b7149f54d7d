//! Robots.txt rule parsing
//!
//! The parser keeps the rule list in file order and the matcher applies a
//! first-match policy: the first rule whose path is a prefix of the
//! requested path decides the outcome. This is deliberately simpler than
//! the longest-prefix matching of the full robots.txt specification and is
//! kept for compatibility with the crawl results it was tuned against.

use std::collections::HashMap;

/// A single allow or disallow directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Allow,
    Disallow,
}

/// Parsed robots.txt rules for one origin
///
/// Rules are grouped per user agent, preserving the order they appeared in
/// the file.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: HashMap<String, Vec<(Directive, String)>>,
}

impl RuleSet {
    /// Parses raw robots.txt content into per-agent rule lists
    ///
    /// Directives that appear before any `User-agent` line are attributed
    /// to the wildcard agent. Unknown directives are ignored.
    pub fn parse(content: &str) -> Self {
        let mut rules: HashMap<String, Vec<(Directive, String)>> = HashMap::new();
        let mut current_agent = "*".to_string();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    current_agent = value.to_lowercase();
                    rules.entry(current_agent.clone()).or_default();
                }
                "allow" => {
                    rules
                        .entry(current_agent.clone())
                        .or_default()
                        .push((Directive::Allow, value.to_string()));
                }
                "disallow" => {
                    rules
                        .entry(current_agent.clone())
                        .or_default()
                        .push((Directive::Disallow, value.to_string()));
                }
                _ => {}
            }
        }

        Self { rules }
    }

    /// Checks whether a path is allowed for the given user agent
    ///
    /// Robots groups are keyed on product tokens (`SeoscopeBot`), not on
    /// full versioned user-agent strings, so the group whose token is
    /// contained in the configured user agent is selected
    /// (case-insensitive, most specific token wins), falling back to the
    /// wildcard agent's rules. Within the group, the FIRST rule in file
    /// order whose path is a prefix of the requested path decides. No rule
    /// matching means allowed.
    pub fn is_path_allowed(&self, user_agent: &str, path: &str) -> bool {
        let agent = user_agent.to_lowercase();
        let relevant = self
            .rules
            .keys()
            .filter(|token| token.as_str() != "*" && agent.contains(token.as_str()))
            .max_by_key(|token| token.len())
            .and_then(|token| self.rules.get(token))
            .or_else(|| self.rules.get("*"));

        if let Some(rules) = relevant {
            for (directive, prefix) in rules {
                if path.starts_with(prefix.as_str()) {
                    return *directive == Directive::Allow;
                }
            }
        }

        true
    }

    /// Returns true when no rules were parsed at all
    pub fn is_empty(&self) -> bool {
        self.rules.values().all(|r| r.is_empty())
    }
}
