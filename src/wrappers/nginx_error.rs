// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use std::collections::HashMap;

use chrono::DateTime;
use chrono::offset::Utc;
use serde_json::{Map, Value};
use snafu::Snafu;
use tracing::warn;

use crate::event::{
  string_field, BoxedEvent, Event, EventKind, Message, Priority, PriorityMap
};
use crate::modifiers::Modified;
use crate::rxp;
use crate::rxparser::RegexParser;
use super::{omit_pairs, sorted_pairs, WrappedEvent};

/// An error_log event logged by Nginx.
pub struct NginxErrorEvent {
  wrapped: WrappedEvent,
  fields: Map<String, Value>
}

lazy_static! {
  /// parses Nginx error log messages
  static ref NGINX_ERROR_LOG_PARSER: RegexParser =
    RegexParser::compile(&rxp::NGINX_ERROR_LOG_ENTRY).unwrap();

  /// parses a trailing field at the end of an Nginx error log message
  static ref NGINX_TRAILING_FIELD_PARSER: RegexParser =
    RegexParser::compile(&rxp::NGINX_TRAILING_FIELD).unwrap();
}

/// Maps Nginx error_log levels to syslog severity levels.
/// https://nginx.org/en/docs/ngx_core_module.html#error_log
static NGINX_ERROR_PRIORITIES: PriorityMap = PriorityMap::new(&[
  ("debug", Priority::Debug),
  ("info", Priority::Info),
  ("notice", Priority::Notice),
  ("warn", Priority::Warning),
  ("error", Priority::Err),
  ("crit", Priority::Crit),
  ("alert", Priority::Alert),
  ("emerg", Priority::Emerg)
]);

#[derive(Debug, Snafu)]
enum TrailersError {
  #[snafu(display("weird trailing field {:?}", value))]
  WeirdTrailingField {
    value: String
  },

  #[snafu(display("{:?} <= {:?} would overwrite {:?}", key, value, orig))]
  WouldOverwrite {
    key: String,
    value: String,
    orig: String
  }
}

/// Returns a new [NginxErrorEvent] if the given event represents an
/// error_log event logged by Nginx.  The event is returned unchanged
/// in all other cases.
pub fn maybe_wrap_nginx_error(e: BoxedEvent) -> Modified {
  if e.message().fields().is_some() {
    return Modified::Unchanged(e); // already structured
  }

  let mut fields = match NGINX_ERROR_LOG_PARSER.parse(e.message().text()) {
    Some(fields) => fields,
    None => return Modified::Unchanged(e)
  };

  // Parse trailing fields from the end of fields["message"] (e.g.
  // `, client: 216.213.58.42, host: "example.net"`).  Note that it's
  // possible to mess with the quoting and get e.g. `host: "exam"ple.net"`
  // through Nginx and into the logs, so this works on a copy and bails
  // at the first sign of weirdness, leaving the message un-split.
  if fields.contains_key("message") {
    let mut tmp = fields.clone();
    match pop_trailers(&mut tmp) {
      Ok(()) => fields = tmp,
      Err(err) => warn!(
        message = fields["message"].as_str(),
        "unexpected trailers: {}", err
      )
    }
  }

  let fields = fields.into_iter()
    .map(|(k, v)| (k, Value::String(v)))
    .collect();

  Modified::Wrapped(Box::new(NginxErrorEvent {
    wrapped: WrappedEvent::wrap(e),
    fields
  }))
}

/// Peels the trailing fields Nginx appends to an error log message
/// (e.g. `client: 216.213.58.42, host: "example.net"`) off into
/// fields of their own.  Fails at *any* weirdness: the caller throws
/// away everything this did unless it returns success.
fn pop_trailers(
  fields: &mut HashMap<String, String>
) -> Result<(), TrailersError> {
  let mut s = fields["message"].clone();

  loop {
    let trailer = match NGINX_TRAILING_FIELD_PARSER.parse(&s) {
      Some(trailer) => trailer,
      None => break
    };

    let (message, key, value) = match (
      trailer.get("message"), trailer.get("key"), trailer.get("value")
    ) {
      (Some(m), Some(k), Some(v)) => (m, k, v),
      _ => break
    };

    let mut value = value.as_str();
    if let Some(unquoted) = value.strip_prefix('"') {
      value = match unquoted.strip_suffix('"') {
        Some(unquoted) => unquoted,
        None => {
          return Err(TrailersError::WeirdTrailingField {
            value: trailer["value"].clone()
          });
        }
      };
    }

    if let Some(orig) = fields.get(key) {
      return Err(TrailersError::WouldOverwrite {
        key: key.clone(),
        value: value.to_string(),
        orig: orig.clone()
      });
    }

    fields.insert(key.clone(), value.to_string());
    s = message.clone();
  }

  fields.insert("message".to_string(), s);

  Ok(())
}

impl Event for NginxErrorEvent {
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
    EventKind::NginxError
  }

  fn message(&self) -> &dyn Message {
    self
  }

  fn priority(&self) -> Priority {
    NGINX_ERROR_PRIORITIES.get(string_field(self, "level"))
  }

  fn time(&self) -> DateTime<Utc> {
    self.wrapped.time()
  }
}

impl Message for NginxErrorEvent {
  fn text(&self) -> &str {
    self.wrapped.text()
  }

  fn fields(&self) -> Option<&Map<String, Value>> {
    Some(&self.fields)
  }

  /// The raw `level` and `time` are hidden: both have been promoted
  /// to first-class members already.
  fn pairs(&self) -> Vec<(String, Value)> {
    omit_pairs(sorted_pairs(self), &["level", "time"])
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use serde_json::json;

  use crate::modifiers::Registry;
  use crate::testevents::envelope_for_message;
  use crate::unmarshal_event;

  fn classify(message: &str) -> BoxedEvent {
    let envelope = envelope_for_message(message);
    unmarshal_event(&envelope, &Registry::with_defaults()).unwrap()
  }

  #[test]
  fn test_basic_notice() {
    let input = "2024/09/02 10:00:31 [notice] 1#1: hello world";
    let e = classify(input);

    assert_eq!(e.kind(), EventKind::NginxError);
    assert_eq!(e.message().text(), input);
    assert_eq!(
      e.message().fields(),
      json!({
        "level": "notice",
        "message": "hello world",
        "pid": "1",
        "tid": "1",
        "time": "2024/09/02 10:00:31"
      }).as_object()
    );
    assert_eq!(e.priority(), Priority::Notice);
  }

  #[test]
  fn test_basic_warning() {
    let msg = "a client request body is buffered to a temporary \
               file /var/cache/nginx/client_temp/0000000001";
    let extra = ", client: 216.213.58.42, server: hive.example.net, \
                 request: \"POST /w/api.php HTTP/2.0\", host: \"hive.example.net\"";
    let input = format!("2024/09/02 10:00:31 [warn] 39#39: *606 {}{}", msg, extra);

    let e = classify(&input);

    assert_eq!(e.kind(), EventKind::NginxError);
    assert_eq!(e.message().text(), input);
    assert_eq!(
      e.message().fields(),
      json!({
        "client": "216.213.58.42",
        "conn": "606",
        "host": "hive.example.net",
        "level": "warn",
        "message": msg,
        "pid": "39",
        "request": "POST /w/api.php HTTP/2.0",
        "server": "hive.example.net",
        "tid": "39",
        "time": "2024/09/02 10:00:31"
      }).as_object()
    );
    assert_eq!(e.priority(), Priority::Warning);
  }

  #[test]
  fn test_basic_error() {
    let msg = "\"/usr/share/nginx/html/hello/world\" is not found \
               (2: No such file or directory)";
    let extra = ", client: 64.225.101.100, server: hive.example.net, \
                 request: \"GET /hello/world HTTP/1.1\", host: \"216.213.58.42\", \
                 referrer: \"http://216.213.58.42:80/v2/\"";
    let input = format!("2024/09/02 10:00:31 [error] 39#39: *606 {}{}", msg, extra);

    let e = classify(&input);

    assert_eq!(
      e.message().fields(),
      json!({
        "client": "64.225.101.100",
        "conn": "606",
        "host": "216.213.58.42",
        "level": "error",
        "message": msg,
        "pid": "39",
        "referrer": "http://216.213.58.42:80/v2/",
        "request": "GET /hello/world HTTP/1.1",
        "server": "hive.example.net",
        "tid": "39",
        "time": "2024/09/02 10:00:31"
      }).as_object()
    );
    assert_eq!(e.priority(), Priority::Err);
  }

  #[test]
  fn test_messy_error_keeps_interior_quote() {
    // it's possible to mess with the quoting and get this through
    // nginx and into the logs; the outer quotes are stripped and the
    // interior quote survives as data
    let msg = "\"/usr/share/nginx/html/hello/world\" is not found \
               (2: No such file or directory)";
    let extra = ", client: 64.225.101.100, server: hive.example.net, \
                 request: \"GET /hello/world HTTP/1.1\", host: \"exam\"ple.net\", \
                 referrer: \"http://216.213.58.42:80/v2/\"";
    let input = format!("2024/09/02 10:00:31 [error] 39#39: *606 {}{}", msg, extra);

    let e = classify(&input);

    assert_eq!(e.kind(), EventKind::NginxError);
    assert_eq!(
      e.message().fields().unwrap()["host"],
      json!("exam\"ple.net")
    );
    assert_eq!(e.message().fields().unwrap()["message"], json!(msg));
  }

  #[test]
  fn test_trailer_collision_aborts_unsplit() {
    // a trailer key that would overwrite an extracted field aborts
    // the entire trailer parse, leaving the message whole
    let msg = "oops, level: \"haha\"";
    let input = format!("2024/09/02 10:00:31 [error] 1#1: {}", msg);

    let e = classify(&input);

    assert_eq!(e.kind(), EventKind::NginxError);
    assert_eq!(e.message().fields().unwrap()["message"], json!(msg));
    assert_eq!(e.message().fields().unwrap()["level"], json!("error"));
  }

  #[test]
  fn test_unbalanced_open_quote_absorbed() {
    // an unclosed quote makes the would-be trailer indistinguishable
    // from message text; everything from the last sound boundary
    // onwards is absorbed into the preceding field's value
    let input = "2024/09/02 10:00:31 [error] 1#1: oops, \
                 client: 1.2.3.4, host: \"unclosed";

    let e = classify(input);

    assert_eq!(e.kind(), EventKind::NginxError);
    let fields = e.message().fields().unwrap();
    assert_eq!(fields["message"], json!("oops"));
    assert_eq!(fields["client"], json!("1.2.3.4, host: \"unclosed"));
  }

  #[test]
  fn test_no_trailing_message() {
    let e = classify("2024/09/02 10:00:31 [notice] 1#1: ");

    assert_eq!(e.kind(), EventKind::NginxError);
    assert!(!e.message().fields().unwrap().contains_key("message"));
  }

  #[test]
  fn test_pairs_omit_level_and_time() {
    let e = classify("2024/09/02 10:00:31 [notice] 1#1: hello world");

    let keys: Vec<String> =
      e.message().pairs().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["message", "pid", "tid"]);
  }

  #[test]
  fn test_unknown_level_is_impossible_but_safe() {
    // the grammar won't match unknown levels, so they fall through
    let e = classify("2024/09/02 10:00:31 [wibble] 1#1: hello");

    assert_eq!(e.kind(), EventKind::Journal);
  }
}
