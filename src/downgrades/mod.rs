// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

//! Priority downgrades for known-noisy events.  Some things Nginx
//! logs as warnings or errors are entirely routine on Hive hosts;
//! these modifiers layer on top of the classification pipeline and
//! re-derive just the priority, leaving everything else alone.

mod nginx_buffer_warning;
mod nginx_no_such_file;

use chrono::DateTime;
use chrono::offset::Utc;

use crate::event::{BoxedEvent, Event, EventKind, Message, Priority};
use crate::modifiers::Registry;

/// Adds every priority-downgrade rule to a registry.
pub fn register_all(registry: &mut Registry) {
  registry.register(
    "downgrade-nginx-buffer-warning",
    nginx_buffer_warning::downgrade
  );
  registry.register(
    "downgrade-nginx-no-such-file",
    nginx_no_such_file::downgrade
  );
}

/// An event whose priority has been lowered for quieter display.
pub struct DowngradedEvent {
  inner: BoxedEvent,
  priority: Priority
}

impl DowngradedEvent {
  pub(crate) fn new(inner: BoxedEvent, priority: Priority) -> DowngradedEvent {
    DowngradedEvent { inner, priority }
  }
}

impl Event for DowngradedEvent {
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

  /// Downgrading doesn't reclassify: histograms still bucket this
  /// event under the format that produced it.
  fn kind(&self) -> EventKind {
    self.inner.kind()
  }

  fn message(&self) -> &dyn Message {
    self.inner.message()
  }

  fn priority(&self) -> Priority {
    self.priority
  }

  fn time(&self) -> DateTime<Utc> {
    self.inner.time()
  }
}

/// Reports whether `p` is a plain filesystem path rooted in `prefix`.
/// Note that the filesystem is **not** inspected, this is purely
/// string manipulation, so keep symbolic links in mind.
fn path_has_prefix(p: &str, prefix: &str) -> bool {
  p.starts_with(prefix) && is_normalized_path(p)
}

/// A path is normalized if no amount of `..`, `.`, doubled or
/// trailing slashes can make it mean somewhere else than it reads.
fn is_normalized_path(p: &str) -> bool {
  let mut parts = p.split('/');
  if p.starts_with('/') {
    parts.next(); // the empty part before the leading slash
  }

  parts.all(|part| !part.is_empty() && part != "." && part != "..")
}
