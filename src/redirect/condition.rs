//! Start/stop/extra condition sets and output command filters.
//!
//! A condition spec is a comma-separated list of `TOKEN` or `TOKEN:N`
//! items, e.g. `"318:1,401:1,461"`. `N` is the position of the argument
//! that must equal the redirect's disambiguator string, when one is set.

use std::fmt;

/// One `(token, argument index)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// Command name or numeric, uppercased.
    pub token: String,
    /// Argument position compared with the disambiguator.
    pub arg_index: Option<usize>,
}

/// An ordered set of conditions keyed by token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionSet {
    conditions: Vec<Condition>,
}

fn split_items(spec: &str) -> impl Iterator<Item = &str> {
    spec.split(',').map(str::trim).filter(|item| !item.is_empty())
}

impl ConditionSet {
    /// Parse a condition spec. A later item for the same token replaces
    /// the earlier one.
    pub fn parse(spec: &str) -> Self {
        let mut conditions: Vec<Condition> = Vec::new();
        for item in split_items(spec) {
            let (token, arg_index) = match item.split_once(':') {
                Some((token, index)) => (token.trim(), index.trim().parse::<usize>().ok()),
                None => (item, None),
            };
            if token.is_empty() {
                continue;
            }
            let token = token.to_ascii_uppercase();
            match conditions.iter_mut().find(|c| c.token == token) {
                Some(existing) => existing.arg_index = arg_index,
                None => conditions.push(Condition { token, arg_index }),
            }
        }
        Self { conditions }
    }

    /// Parse an optional spec; `None` yields an empty set.
    pub fn parse_opt(spec: Option<&str>) -> Self {
        spec.map(Self::parse).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.iter()
    }

    /// Whether a message matches one of the conditions.
    ///
    /// The token must be in the set. When `disambiguator` is non-empty and
    /// the condition carries an index, the argument at that index must
    /// exist and equal the disambiguator (ASCII case-insensitive).
    pub fn matches(&self, command: &str, args: &[&str], disambiguator: Option<&str>) -> bool {
        let Some(condition) = self
            .conditions
            .iter()
            .find(|c| c.token.eq_ignore_ascii_case(command))
        else {
            return false;
        };

        match (disambiguator, condition.arg_index) {
            (Some(wanted), Some(index)) if !wanted.is_empty() => args
                .get(index)
                .is_some_and(|arg| arg.eq_ignore_ascii_case(wanted)),
            _ => true,
        }
    }
}

impl fmt::Display for ConditionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(&condition.token)?;
            if let Some(index) = condition.arg_index {
                write!(f, ":{index}")?;
            }
        }
        Ok(())
    }
}

/// Set of command tokens whose messages are kept in a redirect's output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandFilter {
    tokens: Vec<String>,
}

impl CommandFilter {
    /// Parse a comma-separated token list. Returns `None` when the list
    /// holds no token, which means "keep everything".
    pub fn parse(spec: &str) -> Option<Self> {
        let mut tokens: Vec<String> = Vec::new();
        for item in split_items(spec) {
            let token = item.to_ascii_uppercase();
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        (!tokens.is_empty()).then_some(Self { tokens })
    }

    pub fn allows(&self, command: &str) -> bool {
        self.tokens.iter().any(|t| t.eq_ignore_ascii_case(command))
    }
}

impl fmt::Display for CommandFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(","))
    }
}
