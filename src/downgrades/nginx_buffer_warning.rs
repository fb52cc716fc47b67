// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use crate::event::{string_field, BoxedEvent, Event, EventKind, Priority};
use crate::modifiers::Modified;
use super::{path_has_prefix, DowngradedEvent};

const NGINX_CACHE_DIR: &str = "/var/cache/nginx/";

/// Downgrades Nginx's "buffered to a temporary file" warnings to
/// Info.  Requests and responses spilling to disk under the cache
/// directory is Nginx working as configured, not a problem.
pub(super) fn downgrade(e: BoxedEvent) -> Modified {
  if !should_downgrade(&*e) {
    return Modified::Unchanged(e);
  }

  Modified::Wrapped(Box::new(DowngradedEvent::new(e, Priority::Info)))
}

fn should_downgrade(e: &dyn Event) -> bool {
  if e.kind() != EventKind::NginxError {
    return false;
  }
  if e.priority() != Priority::Warning {
    return false;
  }

  let s = string_field(e, "message");
  let (what, s) = match s.split_once(" is buffered to a temporary file ") {
    Some(parts) => parts,
    None => return false
  };

  // "an upstream response is buffered ... while reading upstream", but
  // "a client request body is buffered ..." with no trailer; anything
  // else is some new variant we haven't vetted
  let (s, had_suffix) = match s.strip_suffix(" while reading upstream") {
    Some(s) => (s, true),
    None => (s, false)
  };

  match what {
    "an upstream response" if had_suffix => {}
    "a client request body" if !had_suffix => {}
    _ => return false
  }

  path_has_prefix(s, NGINX_CACHE_DIR)
}
