// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use chrono::DateTime;
use chrono::offset::Utc;
use serde_json::{Map, Value};

use crate::event::{
  logger_tag, string_field, BoxedEvent, Event, EventKind, Message, Priority,
  PriorityMap, LOGGER_TAG_FIELD
};
use crate::modifiers::Modified;
use super::{omit_pairs, WrappedEvent};

/// A JSON-formatted event logged by a Hive service.  The logger tag
/// says which runtime logged it, which decides the level vocabulary
/// used to derive priorities.
pub struct HiveServiceEvent {
  wrapped: WrappedEvent,
  runtime: ServiceRuntime
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum ServiceRuntime {
  Go,
  Python
}

/// Maps the levels of the structured logger Hive's Go services use to
/// syslog severity levels.
static GO_SERVICE_PRIORITIES: PriorityMap = PriorityMap::new(&[
  ("trace", Priority::Debug),
  ("debug", Priority::Debug),
  ("info", Priority::Info),
  ("warn", Priority::Warning),
  ("error", Priority::Err),
  ("fatal", Priority::Crit),
  ("panic", Priority::Crit)
]);

/// Maps standard Python logging level names to syslog severity
/// levels.  https://docs.python.org/3/library/logging.html#levels
static PY_SERVICE_PRIORITIES: PriorityMap = PriorityMap::new(&[
  ("CRITICAL", Priority::Crit),
  ("ERROR", Priority::Err),
  ("WARNING", Priority::Warning),
  ("INFO", Priority::Info),
  ("DEBUG", Priority::Debug)
]);

/// Returns a new [HiveServiceEvent] if the given event represents a
/// JSON-formatted log event logged by a Hive service.  The event is
/// returned unmodified in all other cases.
pub fn maybe_wrap_hive_service(e: BoxedEvent) -> Modified {
  let runtime = match logger_tag(&*e) {
    "hive-service-go" => ServiceRuntime::Go,
    "hive-service-py" => ServiceRuntime::Python,
    _ => return Modified::Unchanged(e) // not a Hive service event
  };

  Modified::Wrapped(Box::new(HiveServiceEvent {
    wrapped: WrappedEvent::wrap(e),
    runtime
  }))
}

impl Event for HiveServiceEvent {
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
    match self.runtime {
      ServiceRuntime::Go => EventKind::HiveGoService,
      ServiceRuntime::Python => EventKind::HivePyService
    }
  }

  fn message(&self) -> &dyn Message {
    self
  }

  fn priority(&self) -> Priority {
    let priorities = match self.runtime {
      ServiceRuntime::Go => &GO_SERVICE_PRIORITIES,
      ServiceRuntime::Python => &PY_SERVICE_PRIORITIES
    };

    priorities.get(string_field(self, "level"))
  }

  fn time(&self) -> DateTime<Utc> {
    self.wrapped.time()
  }
}

impl Message for HiveServiceEvent {
  fn text(&self) -> &str {
    self.wrapped.text()
  }

  fn fields(&self) -> Option<&Map<String, Value>> {
    self.wrapped.fields()
  }

  fn pairs(&self) -> Vec<(String, Value)> {
    omit_pairs(self.wrapped.pairs(), &[LOGGER_TAG_FIELD, "level"])
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use crate::modifiers::Registry;
  use crate::testevents::envelope_for_message;
  use crate::unmarshal_event;

  fn classify(message: &str) -> BoxedEvent {
    let envelope = envelope_for_message(message);
    unmarshal_event(&envelope, &Registry::with_defaults()).unwrap()
  }

  #[test]
  fn test_go_service() {
    let e = classify(
      "{\"hive_logger\": \"hive-service-go\", \"level\": \"warn\", \
        \"message\": \"retrying\", \"attempt\": 3}"
    );

    assert_eq!(e.kind(), EventKind::HiveGoService);
    assert_eq!(e.priority(), Priority::Warning);

    let keys: Vec<String> =
      e.message().pairs().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["message", "attempt"]);
  }

  #[test]
  fn test_py_service() {
    let e = classify(
      "{\"hive_logger\": \"hive-service-py\", \"level\": \"CRITICAL\", \
        \"msg\": \"cannot continue\"}"
    );

    assert_eq!(e.kind(), EventKind::HivePyService);
    assert_eq!(e.priority(), Priority::Crit);
  }

  #[test]
  fn test_vocabularies_are_per_runtime() {
    // Go levels in a Python service event mean nothing, and vice versa
    let e = classify(
      "{\"hive_logger\": \"hive-service-py\", \"level\": \"warn\", \
        \"msg\": \"hm\"}"
    );
    assert_eq!(e.priority(), Priority::UNKNOWN);

    let e = classify(
      "{\"hive_logger\": \"hive-service-go\", \"level\": \"WARNING\", \
        \"msg\": \"hm\"}"
    );
    assert_eq!(e.priority(), Priority::UNKNOWN);
  }

  #[test]
  fn test_unrecognized_tag_falls_through() {
    let e = classify(
      "{\"hive_logger\": \"hive-service-cobol\", \"level\": \"warn\", \
        \"msg\": \"hm\"}"
    );

    assert_eq!(e.kind(), EventKind::Json);
  }

  #[test]
  fn test_panic_is_critical() {
    let e = classify(
      "{\"hive_logger\": \"hive-service-go\", \"level\": \"panic\", \
        \"message\": \"boom\"}"
    );

    assert_eq!(e.priority(), Priority::Crit);
  }
}
