//! Stateless resolution of abbreviated long-option names.

use std::collections::HashMap;

use optargs_core::ParseError;

/// Resolve `s` against the table of known long option strings.
///
/// An exact match wins immediately. Otherwise every known string with `s`
/// as a prefix is collected: exactly one candidate is the match, zero fails
/// as an unknown option, and two or more fail as ambiguous with the sorted
/// possibilities for display. The resolver keeps no state across calls; it
/// is re-run independently for every long-option token.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use optargs_parser::match_abbrev;
///
/// let mut known = HashMap::new();
/// known.insert("--verbose".to_string(), 0);
/// known.insert("--version".to_string(), 1);
///
/// assert_eq!(match_abbrev("--verb", &known).unwrap(), "--verbose");
/// assert!(match_abbrev("--ver", &known).is_err());
/// ```
pub fn match_abbrev<V>(s: &str, wordmap: &HashMap<String, V>) -> Result<String, ParseError> {
    if wordmap.contains_key(s) {
        return Ok(s.to_string());
    }
    let mut possibilities: Vec<&String> = wordmap.keys().filter(|word| word.starts_with(s)).collect();
    match possibilities.len() {
        1 => Ok(possibilities[0].clone()),
        0 => Err(ParseError::BadOption(s.to_string())),
        _ => {
            possibilities.sort();
            Err(ParseError::Ambiguous {
                option: s.to_string(),
                possibilities: possibilities.into_iter().cloned().collect(),
            })
        }
    }
}
