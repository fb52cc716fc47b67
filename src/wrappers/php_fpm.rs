// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use chrono::DateTime;
use chrono::offset::Utc;
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::event::{
  priority_from_http_status, BoxedEvent, Event, EventKind, Message, Priority
};
use crate::modifiers::Modified;
use crate::rxp;
use crate::rxparser::RegexParser;
use super::WrappedEvent;

/// An access_log event logged by PHP-FPM.
pub struct PhpFpmAccessEvent {
  wrapped: WrappedEvent,

  timestamp: Option<DateTime<Utc>>,
  remote_addr: String,
  remote_user: String,
  method: String,
  request_uri: String,
  status_code: i64
}

lazy_static! {
  /// parses PHP-FPM access log messages
  static ref PHP_FPM_ACCESS_LOG_PARSER: RegexParser =
    RegexParser::compile(&rxp::PHP_FPM_ACCESS_LOG_ENTRY).unwrap();
}

/// The time format used in common/combined format httpd access logs.
const COMMON_LOG_TIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Returns a new [PhpFpmAccessEvent] if the given event represents an
/// access_log event logged by PHP-FPM.  The event is returned
/// unchanged in all other cases.
pub fn maybe_wrap_php_fpm_access(e: BoxedEvent) -> Modified {
  if e.message().fields().is_some() {
    return Modified::Unchanged(e); // already structured
  }

  let mut fields = match PHP_FPM_ACCESS_LOG_PARSER.parse(e.message().text()) {
    Some(fields) => fields,
    None => return Modified::Unchanged(e)
  };

  // none of the groups are optional and none can match empty, so a
  // match means every field is present; oddities from here on are
  // tolerated rather than losing the classification
  let timestamp = match DateTime::parse_from_str(
    &fields["timestamp"], COMMON_LOG_TIME_FORMAT
  ) {
    Ok(timestamp) => Some(timestamp.with_timezone(&Utc)),
    Err(err) => {
      warn!(input = fields["timestamp"].as_str(), "bad timestamp: {}", err);
      None
    }
  };

  let status_code = match fields["status"].parse::<i64>() {
    Ok(status_code) => status_code,
    Err(err) => {
      warn!(input = fields["status"].as_str(), "bad HTTP status code: {}", err);
      0
    }
  };

  Modified::Wrapped(Box::new(PhpFpmAccessEvent {
    timestamp,
    status_code,
    remote_addr: fields.remove("remote_addr").unwrap_or_default(),
    remote_user: fields.remove("remote_user").unwrap_or_default(),
    method: fields.remove("method").unwrap_or_default(),
    request_uri: fields.remove("request_uri").unwrap_or_default(),
    wrapped: WrappedEvent::wrap(e)
  }))
}

impl PhpFpmAccessEvent {
  /// The request timestamp PHP-FPM reported, if it parsed.
  pub fn timestamp(&self) -> Option<DateTime<Utc>> {
    self.timestamp
  }

  /// HTTP status code of the handled request.
  pub fn status_code(&self) -> i64 {
    self.status_code
  }
}

impl Event for PhpFpmAccessEvent {
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
    EventKind::PhpFpmAccess
  }

  fn message(&self) -> &dyn Message {
    self
  }

  fn priority(&self) -> Priority {
    priority_from_http_status(self.status_code)
  }

  fn time(&self) -> DateTime<Utc> {
    self.wrapped.time()
  }
}

impl Message for PhpFpmAccessEvent {
  fn text(&self) -> &str {
    self.wrapped.text()
  }

  fn fields(&self) -> Option<&Map<String, Value>> {
    self.wrapped.fields()
  }

  /// The field names match what Nginx records in its *error* log,
  /// for ease of correlation.
  fn pairs(&self) -> Vec<(String, Value)> {
    let pairs = vec![
      ("client", json!(self.remote_addr)),
      ("user", json!(self.remote_user)),
      ("method", json!(self.method)),
      ("uri", json!(self.request_uri)),
      ("status", json!(self.status_code))
    ];

    pairs.into_iter()
      .filter(|(_, v)| v.as_str().map_or(true, |s| !s.is_empty()))
      .map(|(k, v)| (k.to_string(), v))
      .collect()
  }
}
