//! The `/ignore` command.
//!
//! ```text
//! /ignore [list]
//! /ignore add <mask> [<server> [<channel>]]
//! /ignore del <number>|-all
//! ```

use super::mask::{display_mask, user_mask_to_stored};
use super::{IgnoreList, IgnoreRule};
use crate::error::{CommandError, IgnoreError};

/// Which rules `del` removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelTarget {
    Number(usize),
    All,
}

/// A parsed `/ignore` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreCommand {
    List,
    Add {
        mask: String,
        server: Option<String>,
        channel: Option<String>,
    },
    Del(DelTarget),
}

impl IgnoreCommand {
    /// Parse the arguments following `/ignore`.
    pub fn parse(args: &str) -> Result<Self, CommandError> {
        let argv: Vec<&str> = args.split_whitespace().collect();
        let Some(subcommand) = argv.first() else {
            return Ok(Self::List);
        };

        if subcommand.eq_ignore_ascii_case("list") {
            return Ok(Self::List);
        }
        if subcommand.eq_ignore_ascii_case("add") {
            let mask = argv.get(1).ok_or(CommandError::NeedMoreParams)?;
            return Ok(Self::Add {
                mask: (*mask).to_string(),
                server: argv.get(2).map(|s| (*s).to_string()),
                channel: argv.get(3).map(|s| (*s).to_string()),
            });
        }
        if subcommand.eq_ignore_ascii_case("del") {
            let target = argv.get(1).ok_or(CommandError::NeedMoreParams)?;
            if target.eq_ignore_ascii_case("-all") {
                return Ok(Self::Del(DelTarget::All));
            }
            return target
                .parse()
                .map(|n| Self::Del(DelTarget::Number(n)))
                .map_err(|_| CommandError::InvalidNumber((*target).to_string()));
        }
        Err(CommandError::UnknownSubcommand((*subcommand).to_string()))
    }

    /// Apply the command, returning the lines to show the user.
    pub fn execute(&self, list: &mut IgnoreList) -> Result<Vec<String>, CommandError> {
        match self {
            Self::List => {
                if list.is_empty() {
                    return Ok(vec!["no ignore in list".to_string()]);
                }
                let mut lines = vec!["ignore list:".to_string()];
                lines.extend(list.iter().map(format_rule));
                Ok(lines)
            }
            Self::Add {
                mask,
                server,
                channel,
            } => {
                let stored = user_mask_to_stored(mask);
                if list
                    .search(&stored, server.as_deref(), channel.as_deref())
                    .is_some()
                {
                    return Err(IgnoreError::AlreadyExists.into());
                }
                let rule = list.add(&stored, server.as_deref(), channel.as_deref())?;
                Ok(vec!["ignore added:".to_string(), format_rule(rule)])
            }
            Self::Del(DelTarget::All) => {
                if list.is_empty() {
                    return Ok(vec!["no ignore in list".to_string()]);
                }
                list.remove_all();
                Ok(vec!["all ignores deleted".to_string()])
            }
            Self::Del(DelTarget::Number(number)) => {
                let removed = list.remove(*number)?;
                Ok(vec![format!(
                    "ignore \"{}\" deleted",
                    display_mask(removed.mask())
                )])
            }
        }
    }
}

/// `  [1] mask: bob.* / server: * / channel: *`
pub fn format_rule(rule: &IgnoreRule) -> String {
    format!(
        "  [{}] mask: {} / server: {} / channel: {}",
        rule.number(),
        display_mask(rule.mask()),
        rule.server(),
        rule.channel()
    )
}
