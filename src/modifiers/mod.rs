// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

//! The event modifier plugin system.  A modifier inspects an event
//! and either reclassifies it into something more specific or hands
//! it back untouched; the registry runs every registered modifier to
//! a fixed point.

use tracing::trace;

use crate::event::BoxedEvent;
use crate::wrappers;

/// The outcome of applying a modifier: a new, more specific event, or
/// the original unchanged.  An explicit enum rather than comparing
/// identities; a modifier can't accidentally half-apply.
pub enum Modified {
  Wrapped(BoxedEvent),
  Unchanged(BoxedEvent)
}

/// An event modifier either wraps an event into a more specific form
/// or returns it unchanged.
pub type Modifier = fn(BoxedEvent) -> Modified;

/// The registered event modifiers.
///
/// A registry is assembled once, single-threaded, during process
/// startup, and is read-only from then on; [apply](Registry::apply)
/// works on a snapshot, so concurrent invocations over different
/// messages need no locking or coordination.
pub struct Registry {
  modifiers: Vec<(&'static str, Modifier)>
}

impl Registry {
  /// Returns a new, empty registry.
  pub fn new() -> Registry {
    Registry { modifiers: Vec::new() }
  }

  /// Returns a registry preloaded with the standard format wrappers.
  pub fn with_defaults() -> Registry {
    let mut registry = Registry::new();

    registry.register("json", wrappers::maybe_wrap_json);
    registry.register("nginx-error", wrappers::maybe_wrap_nginx_error);
    registry.register("nginx-access", wrappers::maybe_wrap_nginx_access);
    registry.register("php-fpm-access", wrappers::maybe_wrap_php_fpm_access);
    registry.register("rabbitmq", wrappers::maybe_wrap_rabbitmq);
    registry.register("mongodb", wrappers::maybe_wrap_mongodb);
    registry.register("hive-service", wrappers::maybe_wrap_hive_service);

    registry
  }

  /// Registers an event modifier.
  pub fn register(&mut self, name: &'static str, f: Modifier) {
    self.modifiers.push((name, f));
  }

  /// Applies all relevant modifiers.
  ///
  /// Scans the still-candidate modifiers against the current event;
  /// the instant one fires it's removed from the candidate set and
  /// the scan restarts against the new event, so stacked
  /// classifications work (e.g. a JSON envelope, then a Hive service
  /// convention detected on top of it).  Stops once a full scan
  /// changes nothing.  Removing fired modifiers bounds this to at
  /// most one pass per modifier, guarantees nothing fires twice on
  /// the same event, and makes the outcome independent of
  /// registration order.
  pub fn apply(&self, event: BoxedEvent) -> BoxedEvent {
    let mut candidates = self.modifiers.clone();
    let mut event = event;

    'scan: loop {
      for i in 0..candidates.len() {
        let (name, maybe_wrap) = candidates[i];

        match maybe_wrap(event) {
          Modified::Wrapped(wrapped) => {
            trace!(
              event = wrapped.id(),
              modifier = name,
              "event modified"
            );

            event = wrapped;
            candidates.remove(i);
            continue 'scan;
          }
          Modified::Unchanged(unchanged) => event = unchanged
        }
      }

      break; // nothing changed
    }

    event
  }
}

impl Default for Registry {
  fn default() -> Registry {
    Registry::with_defaults()
  }
}
