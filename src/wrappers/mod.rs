// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

//! Format-specific event wrappers.  Each one detects a structured
//! format by shape, extracts its fields eagerly at wrap time, and
//! layers format-appropriate priorities and display ordering over the
//! event it wraps.

mod hive_service;
mod json;
mod mongodb;
mod nginx_access;
mod nginx_error;
mod php_fpm;
mod rabbitmq;

use chrono::DateTime;
use chrono::offset::Utc;
use serde_json::{Map, Value};

use crate::event::{string_field, BoxedEvent, Event, EventKind, Message, Priority};

pub use hive_service::{maybe_wrap_hive_service, HiveServiceEvent};
pub use json::{maybe_wrap_json, JsonEvent};
pub use mongodb::{maybe_wrap_mongodb, MongoDbEvent};
pub use nginx_access::{maybe_wrap_nginx_access, NginxAccessEvent};
pub use nginx_error::{maybe_wrap_nginx_error, NginxErrorEvent};
pub use php_fpm::{maybe_wrap_php_fpm_access, PhpFpmAccessEvent};
pub use rabbitmq::{maybe_wrap_rabbitmq, RabbitMqEvent};

/// A composition base with every [Event] and [Message] member defined
/// as a pass-through to the wrapped event.  Wrappers embed one of
/// these and override only the members they change, so a single type
/// satisfies both capability sets without paired sibling types.
pub struct WrappedEvent {
  inner: BoxedEvent
}

impl WrappedEvent {
  pub fn wrap(inner: BoxedEvent) -> WrappedEvent {
    WrappedEvent { inner }
  }

  /// The event this wrapper wraps.
  pub fn inner(&self) -> &dyn Event {
    &*self.inner
  }
}

impl Event for WrappedEvent {
  fn command(&self) -> &str {
    self.inner.command()
  }

  fn container_name(&self) -> &str {
    self.inner.container_name()
  }

  fn hostname(&self) -> &str {
    self.inner.hostname()
  }

  fn id(&self) -> &str {
    self.inner.id()
  }

  fn kind(&self) -> EventKind {
    self.inner.kind()
  }

  fn message(&self) -> &dyn Message {
    self.inner.message()
  }

  fn priority(&self) -> Priority {
    self.inner.priority()
  }

  fn time(&self) -> DateTime<Utc> {
    self.inner.time()
  }
}

// Message members too: having these means a wrapper's overrides can
// lean on the base for everything they don't redefine.

impl Message for WrappedEvent {
  fn text(&self) -> &str {
    self.inner.message().text()
  }

  fn fields(&self) -> Option<&Map<String, Value>> {
    self.inner.message().fields()
  }

  fn pairs(&self) -> Vec<(String, Value)> {
    self.inner.message().pairs()
  }
}

/// Returns an event's fields with any non-empty `message` or `msg`
/// component hoisted first and everything else sorted lexically by
/// name afterwards.
pub fn sorted_pairs(e: &dyn Event) -> Vec<(String, Value)> {
  let fields = match e.message().fields() {
    Some(fields) => fields,
    None => return Vec::new()
  };

  let mut pairs = Vec::with_capacity(fields.len());

  let mut hoisted = "";
  for &k in &["message", "msg"] {
    let v = string_field(e, k);
    if v.is_empty() {
      continue;
    }

    pairs.push((k.to_string(), Value::String(v.to_string())));
    hoisted = k;
    break;
  }

  let mut entries: Vec<(&String, &Value)> = fields.iter().collect();
  entries.sort_by(|a, b| a.0.cmp(b.0));

  for (k, v) in entries {
    if k.as_str() == hoisted {
      continue;
    }

    pairs.push((k.clone(), v.clone()));
  }

  pairs
}

/// Removes the named keys from a pairs sequence.
pub fn omit_pairs(
  pairs: Vec<(String, Value)>, omit: &[&str]
) -> Vec<(String, Value)> {
  pairs.into_iter()
    .filter(|(k, _)| !omit.contains(&k.as_str()))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  use serde_json::json;

  use crate::modifiers::Registry;
  use crate::testevents::envelope_for_message;
  use crate::unmarshal_event;

  #[test]
  fn test_sorted_pairs_hoists_message() {
    let envelope = envelope_for_message(
      "{\"zebra\": 1, \"message\": \"hello\", \"apple\": 2}"
    );
    let e = unmarshal_event(&envelope, &Registry::with_defaults()).unwrap();

    let pairs = sorted_pairs(&*e);
    assert_eq!(pairs, vec![
      ("message".to_string(), json!("hello")),
      ("apple".to_string(), json!(2)),
      ("zebra".to_string(), json!(1))
    ]);
  }

  #[test]
  fn test_sorted_pairs_msg_fallback() {
    let envelope = envelope_for_message(
      "{\"msg\": \"hi\", \"level\": \"info\"}"
    );
    let e = unmarshal_event(&envelope, &Registry::with_defaults()).unwrap();

    let pairs = sorted_pairs(&*e);
    assert_eq!(pairs[0], ("msg".to_string(), json!("hi")));
  }

  #[test]
  fn test_omit_pairs() {
    let pairs = vec![
      ("a".to_string(), json!(1)),
      ("b".to_string(), json!(2)),
      ("c".to_string(), json!(3))
    ];

    assert_eq!(omit_pairs(pairs, &["a", "c"]), vec![
      ("b".to_string(), json!(2))
    ]);
  }

  #[test]
  fn test_wrapper_delegates_event_members() {
    let envelope = envelope_for_message("{\"pid\": \"<0.223.0>\"}");
    let e = unmarshal_event(&envelope, &Registry::with_defaults()).unwrap();

    // everything not overridden passes through to the journal entry
    assert_eq!(e.hostname(), "box1");
    assert_eq!(e.command(), "dockerd");
    assert_eq!(e.container_name(), "hive-nginx-ingress-1");
    assert!(!e.id().is_empty());
  }
}
