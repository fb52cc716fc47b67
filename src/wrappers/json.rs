// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use chrono::DateTime;
use chrono::offset::Utc;
use serde_json::{Map, Value};

use crate::event::{BoxedEvent, Event, EventKind, Message, Priority};
use crate::modifiers::Modified;
use super::{sorted_pairs, WrappedEvent};

/// A logged event whose message is a JSON-encoded dictionary.  The
/// generic fallback structure: more specific detectors build on top
/// of this one.
pub struct JsonEvent {
  wrapped: WrappedEvent,
  fields: Map<String, Value>
}

/// Returns a new [JsonEvent] if the given event's message is a
/// JSON-encoded dictionary.  The event is returned unchanged in all
/// other cases.
pub fn maybe_wrap_json(e: BoxedEvent) -> Modified {
  if e.message().fields().is_some() {
    return Modified::Unchanged(e); // already structured
  }

  // quickly bail if the message can't be a JSON dict
  let s = e.message().text();
  if s.len() < 3 || !s.starts_with('{') || !s.ends_with('}') {
    return Modified::Unchanged(e);
  }

  let fields: Map<String, Value> = match serde_json::from_str(s) {
    Ok(fields) => fields,
    Err(_) => return Modified::Unchanged(e)
  };
  if fields.is_empty() {
    return Modified::Unchanged(e);
  }

  Modified::Wrapped(Box::new(JsonEvent {
    wrapped: WrappedEvent::wrap(e),
    fields
  }))
}

impl Event for JsonEvent {
  fn command(&self) -> &str {
    self.wrapped.command()
  }

  fn container_name(&self) -> &str {
    self.wrapped.container_name()
  }

  fn hostname(&self) -> &str {
    self.wrapped.hostname()
  }

  fn id(&self) -> &str {
    self.wrapped.id()
  }

  fn kind(&self) -> EventKind {
    EventKind::Json
  }

  fn message(&self) -> &dyn Message {
    self
  }

  fn priority(&self) -> Priority {
    self.wrapped.priority()
  }

  fn time(&self) -> DateTime<Utc> {
    self.wrapped.time()
  }
}

impl Message for JsonEvent {
  fn text(&self) -> &str {
    self.wrapped.text()
  }

  fn fields(&self) -> Option<&Map<String, Value>> {
    Some(&self.fields)
  }

  fn pairs(&self) -> Vec<(String, Value)> {
    sorted_pairs(self)
  }
}
