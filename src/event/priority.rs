// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use std::fmt;

use serde::{Serialize, Deserialize};

/// The RFC 5424 syslog severity level of an event.  Lower values are
/// more severe.
#[derive(
  Serialize, Deserialize, Ord, PartialOrd, Eq, PartialEq, Debug, Clone, Copy, Hash
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  Emerg,
  Alert,
  Crit,
  Err,
  Warning,
  Notice,
  Info,
  Debug
}

impl Priority {
  /// Priority to assign to events with missing or invalid priority
  /// values.  Notice ("events that are unusual, but not error
  /// conditions") seems about right.
  pub const UNKNOWN: Priority = Priority::Notice;

  /// Converts a numeric syslog severity into a Priority, if it's in
  /// range.
  pub fn from_syslog(v: i64) -> Option<Priority> {
    match v {
      0 => Some(Priority::Emerg),
      1 => Some(Priority::Alert),
      2 => Some(Priority::Crit),
      3 => Some(Priority::Err),
      4 => Some(Priority::Warning),
      5 => Some(Priority::Notice),
      6 => Some(Priority::Info),
      7 => Some(Priority::Debug),
      _ => None
    }
  }
}

impl fmt::Display for Priority {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

/// A lookup from source-specific severity tokens to syslog severity
/// levels.  Each structured log source carries its own vocabulary;
/// adding a new source only means writing a new token table.
pub struct PriorityMap {
  entries: &'static [(&'static str, Priority)]
}

impl PriorityMap {
  pub const fn new(entries: &'static [(&'static str, Priority)]) -> PriorityMap {
    PriorityMap { entries }
  }

  /// Returns the syslog severity for a source-specific token, or
  /// [Priority::UNKNOWN] for anything unrecognized.
  pub fn get(&self, token: &str) -> Priority {
    for (k, p) in self.entries {
      if *k == token {
        return *p;
      }
    }

    Priority::UNKNOWN
  }
}

/// Derives a syslog severity from an HTTP status code.  Codes outside
/// 100-599 can't have come from a well-behaved server, so they map to
/// [Priority::Err].
pub fn priority_from_http_status(status: i64) -> Priority {
  match status {
    100..=499 => Priority::Info,
    500..=599 => Priority::Warning,
    _ => Priority::Err
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  static TEST_MAP: PriorityMap = PriorityMap::new(&[
    ("ok", Priority::Info),
    ("bad", Priority::Err)
  ]);

  #[test]
  fn test_get() {
    assert_eq!(TEST_MAP.get("ok"), Priority::Info);
    assert_eq!(TEST_MAP.get("bad"), Priority::Err);
  }

  #[test]
  fn test_get_unknown() {
    // unrecognized tokens degrade to Notice, they never error
    assert_eq!(TEST_MAP.get("meh"), Priority::UNKNOWN);
    assert_eq!(TEST_MAP.get(""), Priority::Notice);
  }

  #[test]
  fn test_from_syslog() {
    assert_eq!(Priority::from_syslog(0), Some(Priority::Emerg));
    assert_eq!(Priority::from_syslog(7), Some(Priority::Debug));
    assert_eq!(Priority::from_syslog(8), None);
    assert_eq!(Priority::from_syslog(-1), None);
  }

  #[test]
  fn test_http_status_boundaries() {
    assert_eq!(priority_from_http_status(99), Priority::Err);
    assert_eq!(priority_from_http_status(100), Priority::Info);
    assert_eq!(priority_from_http_status(200), Priority::Info);
    assert_eq!(priority_from_http_status(499), Priority::Info);
    assert_eq!(priority_from_http_status(500), Priority::Warning);
    assert_eq!(priority_from_http_status(599), Priority::Warning);
    assert_eq!(priority_from_http_status(600), Priority::Err);
    assert_eq!(priority_from_http_status(0), Priority::Err);
  }

  #[test]
  fn test_ordering() {
    // severity increases as the numeric value decreases
    assert!(Priority::Emerg < Priority::Debug);
    assert!(Priority::Err < Priority::Warning);
  }
}
