// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use chrono::DateTime;
use chrono::offset::Utc;
use serde_json::{Map, Value};

use crate::event::{
  string_field, BoxedEvent, Event, EventKind, Message, Priority, PriorityMap,
  LOGGER_TAG_FIELD
};
use crate::modifiers::Modified;
use super::{omit_pairs, WrappedEvent};

/// A JSON-formatted event logged by MongoDB.
pub struct MongoDbEvent {
  wrapped: WrappedEvent
}

/// The fields we require to be present to consider a JSON-formatted
/// log event to be from MongoDB, except "t" which is checked
/// separately.
static MONGODB_EXPECT_FIELDS: &[&str] = &["s", "c", "id", "ctx", "msg"];

/// Maps MongoDB severity levels to syslog severity levels.
/// https://www.mongodb.com/docs/manual/reference/log-messages/#severity
static MONGODB_PRIORITIES: PriorityMap = PriorityMap::new(&[
  ("D5", Priority::Debug),
  ("D4", Priority::Debug),
  ("D3", Priority::Debug),
  ("D2", Priority::Debug),
  ("D1", Priority::Debug),
  ("I", Priority::Info),
  ("W", Priority::Warning),
  ("E", Priority::Err),
  ("F", Priority::Crit)
]);

/// Returns a new [MongoDbEvent] if the given event represents a
/// JSON-formatted log event logged by MongoDB.  The event is returned
/// unmodified in all other cases.
pub fn maybe_wrap_mongodb(e: BoxedEvent) -> Modified {
  if !looks_like_mongodb(&*e) {
    return Modified::Unchanged(e);
  }

  Modified::Wrapped(Box::new(MongoDbEvent {
    wrapped: WrappedEvent::wrap(e)
  }))
}

fn looks_like_mongodb(e: &dyn Event) -> bool {
  let fields = match e.message().fields() {
    Some(fields) => fields,
    None => return false
  };

  // "Each log entry is output as a self-contained JSON object which
  // follows the Relaxed Extended JSON v2.0 specification, and has the
  // following layout and field order:
  //
  // {
  //   "t": <Datetime>, // timestamp
  //   "s": <String>, // severity
  //   "c": <String>, // component
  //   "id": <Integer>, // unique identifier
  //   "ctx": <String>, // context
  //   "svc": <String>, // service
  //   "msg": <String>, // message body
  //   ...
  //
  // https://www.mongodb.com/docs/manual/reference/log-messages/
  // #json-log-output-format
  if fields.len() < 6 {
    return false;
  }

  match fields.get("t") {
    Some(Value::Object(t)) if t.contains_key("$date") => {}
    _ => return false
  }

  if !MONGODB_EXPECT_FIELDS.iter().all(|k| fields.contains_key(*k)) {
    return false;
  }

  // final check, since MongoDB won't have set the logger tag on these
  if fields.contains_key(LOGGER_TAG_FIELD) {
    return false;
  }

  true
}

impl Event for MongoDbEvent {
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
    EventKind::MongoDb
  }

  fn message(&self) -> &dyn Message {
    self
  }

  fn priority(&self) -> Priority {
    MONGODB_PRIORITIES.get(string_field(self, "s"))
  }

  fn time(&self) -> DateTime<Utc> {
    self.wrapped.time()
  }
}

impl Message for MongoDbEvent {
  fn text(&self) -> &str {
    self.wrapped.text()
  }

  fn fields(&self) -> Option<&Map<String, Value>> {
    self.wrapped.fields()
  }

  /// Omits "t" and "s": timestamp and severity are first-class
  /// members already.
  fn pairs(&self) -> Vec<(String, Value)> {
    omit_pairs(self.wrapped.pairs(), &["t", "s"])
  }
}
