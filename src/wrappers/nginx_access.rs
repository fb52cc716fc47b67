// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use chrono::DateTime;
use chrono::offset::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::event::{logger_tag, BoxedEvent, Event, EventKind, Message, Priority};
use crate::modifiers::Modified;
use super::WrappedEvent;

/// A JSON-formatted access_log event logged by Nginx.  This isn't a
/// standard Nginx thing, just how Hive's Nginx containers are
/// configured.
pub struct NginxAccessEvent {
  wrapped: WrappedEvent,
  record: AccessRecord
}

/// The typed form of a Hive Nginx access log record.  Decoded from
/// the already-extracted JSON fields; anything missing is left at its
/// zero value, the same degree of tolerance the JSON decoding of the
/// original record had.
#[derive(Debug, Default, Deserialize)]
struct AccessRecord {
  #[serde(default)]
  remote_addr: String,

  #[serde(default)]
  remote_user: String,

  #[serde(default, rename = "http_host")]
  host: String,

  #[serde(default, rename = "request_method")]
  method: String,

  #[serde(default)]
  request_uri: String,

  #[serde(default, rename = "server_protocol")]
  proto: String,

  #[serde(default, rename = "ssl_protocol")]
  tls_proto: String,

  #[serde(default)]
  status: i64,

  #[serde(default, rename = "body_bytes_sent")]
  response_size: i64,

  #[serde(default, rename = "http_user_agent")]
  user_agent: String,

  #[serde(default, rename = "http_referer")]
  referer: String,

  #[serde(default, rename = "request_length")]
  request_size: i64,

  #[serde(default)]
  timestamp: f64
}

/// Returns a new [NginxAccessEvent] if the given event represents a
/// JSON-formatted access_log event logged by Nginx.  Otherwise, the
/// given event is returned unmodified.
pub fn maybe_wrap_nginx_access(e: BoxedEvent) -> Modified {
  if logger_tag(&*e) != "nginx" {
    return Modified::Unchanged(e); // not a Hive-style Nginx event
  }

  // the tag lives in the fields, so the JSON detector has already run
  let fields = match e.message().fields() {
    Some(fields) => fields.clone(),
    None => return Modified::Unchanged(e)
  };

  let record: AccessRecord = match serde_json::from_value(
    Value::Object(fields)
  ) {
    Ok(record) => record,
    Err(err) => {
      warn!(
        input = e.message().text(),
        "undecodable access record: {}", err
      );
      return Modified::Unchanged(e);
    }
  };

  Modified::Wrapped(Box::new(NginxAccessEvent {
    wrapped: WrappedEvent::wrap(e),
    record
  }))
}

impl NginxAccessEvent {
  /// HTTP status code of the handled request.
  pub fn status_code(&self) -> i64 {
    self.record.status
  }

  /// Bytes sent in the response body.
  pub fn response_size(&self) -> i64 {
    self.record.response_size
  }

  /// Bytes received in the request.
  pub fn request_size(&self) -> i64 {
    self.record.request_size
  }

  /// Seconds since the epoch at the originating server.
  pub fn timestamp(&self) -> f64 {
    self.record.timestamp
  }
}

impl Event for NginxAccessEvent {
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
    EventKind::NginxAccess
  }

  fn message(&self) -> &dyn Message {
    self
  }

  /// Server errors are worth a look; everything else, including
  /// client errors, is routine traffic.
  fn priority(&self) -> Priority {
    if self.record.status > 499 {
      Priority::Notice
    } else {
      Priority::Info
    }
  }

  fn time(&self) -> DateTime<Utc> {
    self.wrapped.time()
  }
}

impl Message for NginxAccessEvent {
  fn text(&self) -> &str {
    self.wrapped.text()
  }

  fn fields(&self) -> Option<&Map<String, Value>> {
    self.wrapped.fields()
  }

  /// Pairs in roughly combined log format ordering, which seems more
  /// natural than lexical sorting for viewing webserver access logs.
  fn pairs(&self) -> Vec<(String, Value)> {
    let r = &self.record;

    let tls = if r.tls_proto.is_empty() { "none" } else { &r.tls_proto };

    let pairs = vec![
      ("client", json!(r.remote_addr)),
      ("user", json!(r.remote_user)),
      ("method", json!(r.method)),
      ("uri", json!(r.request_uri)),
      ("proto", json!(r.proto)),
      ("tls", json!(tls)),
      ("status", json!(r.status)),
      ("referer", json!(r.referer)),
      ("user_agent", json!(r.user_agent)),
      ("host", json!(r.host))
    ];

    pairs.into_iter()
      .filter(|(_, v)| v.as_str().map_or(true, |s| !s.is_empty()))
      .map(|(k, v)| (k.to_string(), v))
      .collect()
  }
}
