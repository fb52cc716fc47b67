// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use crate::event::{string_field, BoxedEvent, Event, EventKind, Priority};
use crate::modifiers::Modified;
use super::{path_has_prefix, DowngradedEvent};

const NGINX_WEBROOT: &str = "/usr/share/nginx/html/";

/// Downgrades Nginx's "No such file or directory" errors to Info when
/// the missing file is confined to the document root.  Crawlers
/// probing for files that don't exist is background noise, not an
/// error on our side.
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
  if e.priority() != Priority::Err {
    return false;
  }

  let s = string_field(e, "message");
  let (s, _) = match s.split_once(" (2: No such file or directory)") {
    Some(parts) => parts,
    None => return false
  };

  if let Some(s) = s.strip_prefix("open() \"") {
    // open() "/path/to/file" failed (2: No such file or directory)
    if let Some(s) = s.strip_suffix("\" failed") {
      return path_has_prefix(s, NGINX_WEBROOT);
    }
  } else if let Some(s) = s.strip_suffix("\" is not found") {
    // "/path/to/file" is not found (2: No such file or directory)
    if let Some(s) = s.strip_prefix('"') {
      return path_has_prefix(s, NGINX_WEBROOT);
    }
  }

  false
}

#[cfg(test)]
mod tests {
  use crate::event::{Event, EventKind, Priority};
  use crate::modifiers::Registry;
  use crate::testevents::envelope_for_message;
  use crate::unmarshal_event;

  fn registry() -> Registry {
    let mut registry = Registry::with_defaults();
    crate::downgrades::register_all(&mut registry);
    registry
  }

  fn classify(msg: &str) -> Box<dyn Event> {
    let input = format!(
      "2024/09/02 10:00:31 [error] 39#39: *606 {}\
       , client: 64.225.101.100, server: hive.example.net\
       , request: \"GET /hello/world HTTP/1.1\", host: \"216.213.58.42\"",
      msg
    );
    let envelope = envelope_for_message(&input);

    unmarshal_event(&envelope, &registry()).unwrap()
  }

  #[test]
  fn test_downgrades() {
    for msg in &[
      "\"/usr/share/nginx/html/hello/world\" is not found \
       (2: No such file or directory)",
      "open() \"/usr/share/nginx/html/robots.txt\" failed \
       (2: No such file or directory)"
    ] {
      let e = classify(msg);

      assert_eq!(e.kind(), EventKind::NginxError);
      assert_eq!(e.priority(), Priority::Info, "{}", msg);
    }
  }

  #[test]
  fn test_no_downgrade_outside_webroot() {
    for msg in &[
      "\"/etc/passwd\" is not found (2: No such file or directory)",
      "open() \"/usr/share/nginx/html/../secrets\" failed \
       (2: No such file or directory)"
    ] {
      let e = classify(msg);

      assert_eq!(e.priority(), Priority::Err, "{}", msg);
    }
  }

  #[test]
  fn test_no_downgrade_of_other_errors() {
    let e = classify(
      "\"/usr/share/nginx/html/hello\" is not found \
       (13: Permission denied)"
    );

    assert_eq!(e.priority(), Priority::Err);
  }
}
