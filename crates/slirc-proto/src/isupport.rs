//! ISUPPORT (`RPL_ISUPPORT`, 005) token extraction.
//!
//! Only the tokens a client needs to compare names correctly are exposed
//! as accessors; everything else is reachable through [`Isupport::get`].

/// A single ISUPPORT key-value entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IsupportEntry<'a> {
    /// The token key (e.g., `NETWORK`, `CHANTYPES`).
    pub key: &'a str,
    /// The optional value (e.g., `Libera.Chat` for `NETWORK=Libera.Chat`).
    pub value: Option<&'a str>,
}

/// Parsed ISUPPORT tokens from one `RPL_ISUPPORT` line.
///
/// # Example
///
/// ```
/// use slirc_proto::isupport::Isupport;
///
/// let args = ["me", "CHANTYPES=#&", "CASEMAPPING=ascii", "are supported by this server"];
/// let isupport = Isupport::from_response_args(&args).unwrap();
///
/// assert_eq!(isupport.chantypes(), Some("#&"));
/// assert_eq!(isupport.casemapping(), Some("ascii"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Isupport<'a> {
    entries: Vec<IsupportEntry<'a>>,
}

impl<'a> Isupport<'a> {
    /// Parse ISUPPORT from raw `RPL_ISUPPORT` parameters.
    ///
    /// Skips the first argument (target nickname) and the trailing text.
    pub fn from_response_args<S: AsRef<str>>(args: &'a [S]) -> Option<Self> {
        if args.is_empty() {
            return None;
        }

        let mut tokens = &args[1..];
        if let Some(last) = tokens.last() {
            if last.as_ref().contains(' ') {
                tokens = &tokens[..tokens.len() - 1];
            }
        }

        let entries = tokens
            .iter()
            .map(|token| {
                let token = token.as_ref();
                match token.split_once('=') {
                    Some((key, value)) => IsupportEntry {
                        key,
                        value: Some(value),
                    },
                    None => IsupportEntry {
                        key: token,
                        value: None,
                    },
                }
            })
            .collect();

        Some(Self { entries })
    }

    /// Iterate over all parsed entries.
    pub fn iter(&self) -> impl Iterator<Item = &IsupportEntry<'a>> {
        self.entries.iter()
    }

    /// Get the value for a key.
    ///
    /// Returns `Some(Some(value))` if the key has a value, `Some(None)` if
    /// the key exists without a value, or `None` if it is not present.
    pub fn get(&self, key: &str) -> Option<Option<&'a str>> {
        self.entries
            .iter()
            .rfind(|e| e.key.eq_ignore_ascii_case(key))
            .map(|e| e.value)
    }

    /// Get the `CASEMAPPING` value (e.g., `rfc1459`, `ascii`).
    pub fn casemapping(&self) -> Option<&'a str> {
        self.get("CASEMAPPING").flatten()
    }

    /// Get the `CHANTYPES` value (e.g., `#&`).
    pub fn chantypes(&self) -> Option<&'a str> {
        self.get("CHANTYPES").flatten()
    }

    /// Get the `NETWORK` name.
    pub fn network(&self) -> Option<&'a str> {
        self.get("NETWORK").flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owned_params() {
        let args: Vec<String> = ["me", "NETWORK=TestNet", "EXCEPTS", "are supported"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let isupport = Isupport::from_response_args(&args).unwrap();
        assert_eq!(isupport.network(), Some("TestNet"));
        assert_eq!(isupport.get("EXCEPTS"), Some(None));
        assert_eq!(isupport.get("MISSING"), None);
    }

    #[test]
    fn last_occurrence_wins() {
        let args = ["me", "CHANTYPES=#", "CHANTYPES=#&+"];
        let isupport = Isupport::from_response_args(&args).unwrap();
        assert_eq!(isupport.chantypes(), Some("#&+"));
    }

    #[test]
    fn empty_args_yield_none() {
        let args: [&str; 0] = [];
        assert!(Isupport::from_response_args(&args).is_none());
    }
}
