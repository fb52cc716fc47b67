// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

//! Parsing strings into key-value mappings using regular expressions
//! with named capture groups.  All the format grammars in [crate::rxp]
//! are declarative instances of this parser; nothing here needs any
//! regex feature beyond "match and read the named groups".

use std::collections::HashMap;

use regex::Regex;
use snafu::{ensure, ResultExt, Snafu};

#[derive(Debug, Snafu)]
pub enum Error {
  #[snafu(display(
    "unable to compile pattern {:?}: {}",
    pattern, source
  ))]
  BadPattern {
    pattern: String,
    source: regex::Error
  },

  #[snafu(display(
    "pattern {:?} has no named subexpressions",
    pattern
  ))]
  NoSubexpressions {
    pattern: String
  }
}

/// Parses strings into key-value pair mappings using a regular
/// expression with named capture groups.
#[derive(Debug)]
pub struct RegexParser {
  rx: Regex
}

impl RegexParser {
  /// Compiles a pattern into a RegexParser.  Fails if the pattern
  /// doesn't compile or has no named capture groups (a parser that
  /// can never produce a field isn't a parser).
  pub fn compile(pattern: &str) -> Result<RegexParser, Error> {
    let rx = Regex::new(pattern).context(BadPattern { pattern })?;

    ensure!(
      rx.capture_names().flatten().next().is_some(),
      NoSubexpressions { pattern }
    );

    Ok(RegexParser { rx })
  }

  /// Returns a mapping of all named subexpression matches found in
  /// the given string.  `None` means the string didn't match at all.
  /// Groups that matched empty text are omitted from the mapping,
  /// distinguishing "field absent" from "field present but empty".
  pub fn parse(&self, s: &str) -> Option<HashMap<String, String>> {
    let caps = self.rx.captures(s)?;

    let mut fields = HashMap::new();
    for name in self.rx.capture_names().flatten() {
      if let Some(m) = caps.name(name) {
        if m.as_str().is_empty() {
          continue; // no empties
        }

        fields.insert(name.to_string(), m.as_str().to_string());
      }
    }

    Some(fields)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use spectral::prelude::*;

  #[test]
  fn test_compile_no_subexpressions() {
    assert_that!(RegexParser::compile(r"^\d+$")).is_err();
    assert_that!(RegexParser::compile(r"^(\d+)$")).is_err();
  }

  #[test]
  fn test_compile_bad_pattern() {
    assert_that!(RegexParser::compile(r"(?P<oops>[")).is_err();
  }

  #[test]
  fn test_no_match() {
    let p = RegexParser::compile(r"^(?P<a>\d+)$").unwrap();

    assert_that!(p.parse("nope")).is_none();
  }

  #[test]
  fn test_basic() {
    let p = RegexParser::compile(r"^(?P<a>\S+) (?P<b>\S+)$").unwrap();

    assert_eq!(p.parse("foo bar").unwrap(), hashmap!{
      "a".to_string() => "foo".to_string(),
      "b".to_string() => "bar".to_string()
    });
  }

  #[test]
  fn test_empty_captures_omitted() {
    let p = RegexParser::compile(r"^(?P<a>\d*)x(?P<b>\d*)$").unwrap();

    // matched, but "a" captured nothing: present-but-empty is absent
    assert_eq!(p.parse("x123").unwrap(), hashmap!{
      "b".to_string() => "123".to_string()
    });

    // matched with zero named fields is not the same as no match
    assert_eq!(p.parse("x").unwrap(), hashmap!{});
  }

  #[test]
  fn test_optional_group_omitted() {
    let p = RegexParser::compile(r"^(?P<a>\d+)(?:-(?P<b>\d+))?$").unwrap();

    assert_eq!(p.parse("1-2").unwrap(), hashmap!{
      "a".to_string() => "1".to_string(),
      "b".to_string() => "2".to_string()
    });

    assert_eq!(p.parse("1").unwrap(), hashmap!{
      "a".to_string() => "1".to_string()
    });
  }

  #[test]
  fn test_unnamed_groups_ignored() {
    let p = RegexParser::compile(r"^(\d+) (?P<b>\d+)$").unwrap();

    assert_eq!(p.parse("1 2").unwrap(), hashmap!{
      "b".to_string() => "2".to_string()
    });
  }
}
