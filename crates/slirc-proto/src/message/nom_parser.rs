//! Nom-based IRC message parser.
//!
//! Parses a line into borrowed slices of the original input. Besides the
//! RFC parameter list, it keeps the raw argument text following the
//! command, which callers tokenize on whitespace when they need
//! positional words that ignore the trailing-parameter boundary.

use nom::{
    bytes::complete::{take_until, take_while1},
    character::complete::{char, space0},
    combinator::opt,
    error::ErrorKind,
    sequence::preceded,
    IResult,
};
use smallvec::SmallVec;

/// Parse IRCv3 message tags (the part after `@` and before the first space).
fn parse_tags(input: &str) -> IResult<&str, &str> {
    preceded(char('@'), take_until(" "))(input)
}

/// Parse message prefix (the part after `:` and before the first space).
fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

/// Parse the command name (1*letter or 3digit).
fn parse_command(input: &str) -> IResult<&str, &str> {
    let (rest, cmd) = take_while1(|c: char| c.is_alphanumeric())(input)?;

    let is_all_letters = cmd.chars().all(|c| c.is_ascii_alphabetic());
    let is_three_digits = cmd.len() == 3 && cmd.chars().all(|c| c.is_ascii_digit());

    if is_all_letters || is_three_digits {
        Ok((rest, cmd))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::AlphaNumeric,
        )))
    }
}

/// Parse parameters after the command.
///
/// Multiple consecutive spaces are treated as a single separator. At most
/// 15 parameters are kept (RFC 2812).
fn parse_params(input: &str) -> SmallVec<[&str; 15]> {
    let mut params: SmallVec<[&str; 15]> = SmallVec::new();
    let mut rest = input;

    while let Some(b' ') = rest.as_bytes().first().copied() {
        if params.len() >= 15 {
            break;
        }

        while rest.as_bytes().first() == Some(&b' ') {
            rest = &rest[1..];
        }

        if rest.is_empty() {
            break;
        }

        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing);
            break;
        }

        let end = rest.find(' ').unwrap_or(rest.len());
        params.push(&rest[..end]);
        rest = &rest[end..];
    }

    params
}

/// Parse everything up to and including the command.
fn parse_head(input: &str) -> IResult<&str, (Option<&str>, Option<&str>, &str)> {
    let (input, tags) = opt(parse_tags)(input)?;
    let (input, _) = space0(input)?;
    let (input, prefix) = opt(parse_prefix)(input)?;
    let (input, _) = space0(input)?;
    let (input, command) = parse_command(input)?;
    Ok((input, (tags, prefix, command)))
}

/// A parsed IRC message with borrowed string slices.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedMessage<'a> {
    /// Raw tags string (without the leading `@`), if present.
    pub tags: Option<&'a str>,
    /// Raw prefix string (without the leading `:`), if present.
    pub prefix: Option<&'a str>,
    /// The command name, as received.
    pub command: &'a str,
    /// Command parameters, including trailing.
    pub params: SmallVec<[&'a str; 15]>,
    /// Everything after the command, leading spaces removed.
    pub arguments: &'a str,
}

impl<'a> ParsedMessage<'a> {
    /// Parse a line. `input` must already be stripped of CR/LF.
    ///
    /// On failure returns the character position where parsing stopped.
    pub fn parse(input: &'a str) -> Result<Self, usize> {
        let result = parse_head(input);

        match result {
            Ok((rest, (tags, prefix, command))) => Ok(ParsedMessage {
                tags,
                prefix,
                command,
                params: parse_params(rest),
                arguments: rest.trim_start_matches(' '),
            }),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                Err(input.len() - e.input.len())
            }
            Err(nom::Err::Incomplete(_)) => Err(input.len()),
        }
    }
}
