// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

mod priority;

use std::fmt;

use chrono::DateTime;
use chrono::offset::Utc;
use serde_json::{Map, Value};

pub use priority::{priority_from_http_status, Priority, PriorityMap};

/// A field that structured log entries may carry to tell parsers how
/// they should be parsed, so nothing has to guess.  Hive-managed
/// containers and services inject this into everything they log.
pub const LOGGER_TAG_FIELD: &str = "hive_logger";

/// A single logged event.
///
/// The base implementation is a [journal entry](crate::JournalEntry);
/// format wrappers layer more specific behavior on top of it without
/// changing what the contract looks like from the outside.
pub trait Event: Send + Sync {
  /// Returns the name of the originating process.  Generally this is
  /// the name you would see in top, so mostly lowercase alphanumerics
  /// with hyphens or underscores, but be prepared for the occasional
  /// random one with brackets or parentheses.
  fn command(&self) -> &str;

  /// Returns the name of the container the originating process is
  /// running in.  Empty if the originating process isn't in a
  /// container, or if it's in a container managed by an engine we
  /// don't yet handle.
  fn container_name(&self) -> &str;

  /// Returns the name of the originating host.
  fn hostname(&self) -> &str;

  /// Returns the identity of this event, used for deduplication and
  /// acknowledgement correlation.  This is the content digest the
  /// event travelled the bus under.
  fn id(&self) -> &str;

  /// Returns the concrete classification of this event.  Unclassified
  /// events report [EventKind::Journal].
  fn kind(&self) -> EventKind;

  /// Returns the primary content of this logged event.
  fn message(&self) -> &dyn Message;

  /// Returns the RFC 5424 syslog severity level of this event, as
  /// reported by the originating process.
  fn priority(&self) -> Priority;

  /// Returns the wallclock time of the originating host when the
  /// event was logged.
  fn time(&self) -> DateTime<Utc>;
}

/// The primary content of a logged event.
pub trait Message {
  /// Returns the message as text intended to be shown to the user.
  /// In most cases this is the raw text supplied by the originating
  /// process, though this isn't enforced.  Note that newline
  /// characters are permitted, and ANSI control sequences are not
  /// unexpected.
  fn text(&self) -> &str;

  /// Returns the message as key-value pairs, if available.  This is
  /// an unfiltered, unsorted view of the message for programmatic
  /// access; see [pairs](Message::pairs) for an ordered, filtered
  /// sequence intended for message construction.  Returns `None` if
  /// the message is unstructured.
  fn fields(&self) -> Option<&Map<String, Value>>;

  /// Returns the message as a sequence of key-value pairs suitable
  /// for constructing messages for display.  Don't use it to access
  /// data, use [fields](Message::fields) for that.  Returns an empty
  /// sequence if the message is unstructured.
  fn pairs(&self) -> Vec<(String, Value)>;
}

/// An owned, type-erased [Event].
pub type BoxedEvent = Box<dyn Event>;

/// The concrete classification of an event, one variant per format
/// wrapper.  Collaborators use this where a dynamic language would
/// reach for reflection, e.g. to build per-type histograms.
#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Copy, Clone, Hash)]
pub enum EventKind {
  Journal,
  Json,
  NginxError,
  NginxAccess,
  PhpFpmAccess,
  RabbitMq,
  MongoDb,
  HiveGoService,
  HivePyService
}

impl fmt::Display for EventKind {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

/// Returns the value of a field in a structured event's message.
pub fn field<'a>(e: &'a dyn Event, k: &str) -> Option<&'a Value> {
  e.message().fields()?.get(k)
}

/// Returns the string value of a field in a structured event's
/// message, or the empty string if the field is absent or not a
/// string.
pub fn string_field<'a>(e: &'a dyn Event, k: &str) -> &'a str {
  field(e, k).and_then(Value::as_str).unwrap_or("")
}

/// Returns the value of the logger tag field of a structured event's
/// message.
pub fn logger_tag(e: &dyn Event) -> &str {
  string_field(e, LOGGER_TAG_FIELD)
}

#[cfg(test)]
mod tests {
  use super::*;

  use spectral::prelude::*;

  use crate::testevents::entry_for_message;

  #[test]
  fn test_unstructured_fields() {
    let entry = entry_for_message("hello world");

    let e: &dyn Event = &entry;
    assert_that!(e.message().fields()).is_none();
    assert!(e.message().pairs().is_empty());
    assert_eq!(e.message().text(), "hello world");
  }

  #[test]
  fn test_string_field_unstructured() {
    let entry = entry_for_message("hello world");

    // unstructured messages have no fields at all
    assert_eq!(string_field(&entry, "message"), "");
    assert_eq!(logger_tag(&entry), "");
  }

  #[test]
  fn test_kind_display() {
    assert_eq!(EventKind::NginxError.to_string(), "NginxError");
    assert_eq!(EventKind::Journal.to_string(), "Journal");
  }
}
