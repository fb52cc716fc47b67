// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use chrono::{DateTime, Duration, NaiveDateTime};
use chrono::offset::{TimeZone, Utc};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

use crate::event::{
  string_field, BoxedEvent, Event, EventKind, Message, Priority, PriorityMap
};
use crate::modifiers::Modified;
use super::{omit_pairs, WrappedEvent};

/// A JSON-formatted event logged by RabbitMQ.
pub struct RabbitMqEvent {
  wrapped: WrappedEvent
}

lazy_static! {
  /// matches the "pid" field of RabbitMQ structured events, an
  /// Erlang process identifier like `<0.123.0>`
  static ref RABBITMQ_PID_RX: Regex =
    Regex::new(r"^<\d+\.\d+\.\d+>$").unwrap();
}

/// Maps RabbitMQ log levels to syslog severity levels.
/// https://www.rabbitmq.com/docs/logging#log-levels
static RABBITMQ_PRIORITIES: PriorityMap = PriorityMap::new(&[
  ("debug", Priority::Debug),
  ("info", Priority::Info),
  ("warning", Priority::Warning),
  ("error", Priority::Err),
  ("critical", Priority::Crit)
]);

/// Returns a new [RabbitMqEvent] if the given event represents a
/// JSON-formatted event logged by RabbitMQ.  The event is returned
/// unmodified in all other cases.
pub fn maybe_wrap_rabbitmq(e: BoxedEvent) -> Modified {
  let pid = string_field(&*e, "pid");
  if pid.len() < 7 || !RABBITMQ_PID_RX.is_match(pid) {
    return Modified::Unchanged(e);
  }

  Modified::Wrapped(Box::new(RabbitMqEvent {
    wrapped: WrappedEvent::wrap(e)
  }))
}

/// Parses a timestamp as RabbitMQ logs them, e.g.
/// `2024-09-02 10:00:31.123456+01:00`.  UTC comes out of RabbitMQ as
/// a literal `Z` rather than `+00:00`.
fn parse_rabbitmq_time(s: &str) -> Option<DateTime<Utc>> {
  if let Ok(t) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
    return Some(t.with_timezone(&Utc));
  }

  let s = s.strip_suffix('Z')?;
  let t = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").ok()?;

  Some(Utc.from_utc_datetime(&t))
}

impl Event for RabbitMqEvent {
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
    EventKind::RabbitMq
  }

  fn message(&self) -> &dyn Message {
    self
  }

  fn priority(&self) -> Priority {
    RABBITMQ_PRIORITIES.get(string_field(self, "level"))
  }

  /// The wallclock timestamp of this event.  Prefers the time
  /// RabbitMQ reported, but only if it parses *and* sits within the
  /// hour before the journal receipt time; a source clock that's
  /// skewed or spouting garbage doesn't get to rewrite history.
  fn time(&self) -> DateTime<Utc> {
    let jtime = self.wrapped.time();

    let s = string_field(self, "time");
    let rtime = match parse_rabbitmq_time(s) {
      Some(rtime) => rtime,
      None => {
        warn!(input = s, "unparseable timestamp");
        return jtime;
      }
    };

    // The time RabbitMQ reported should be slightly older than the
    // time journald recorded, e.g. ~1.4ms on an unloaded rpi4.
    let delta = jtime.signed_duration_since(rtime);
    if delta < Duration::zero() || delta > Duration::hours(1) {
      warn!(
        delta_usec = delta.num_microseconds().unwrap_or(i64::max_value()),
        "unexpected skew"
      );
      return jtime;
    }

    rtime
  }
}

impl Message for RabbitMqEvent {
  fn text(&self) -> &str {
    self.wrapped.text()
  }

  fn fields(&self) -> Option<&Map<String, Value>> {
    self.wrapped.fields()
  }

  fn pairs(&self) -> Vec<(String, Value)> {
    omit_pairs(self.wrapped.pairs(), &["level", "time"])
  }
}
