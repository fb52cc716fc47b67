// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

//! Log event classification and enrichment for Hive.
//!
//! Hive's log collectors read raw entries from the systemd journal and
//! publish them onto the message bus.  This crate turns those raw,
//! unstructured records back into uniform, strongly-typed events: it
//! decodes the bus envelope, verifies the content digest, and runs the
//! result through a set of format detectors (Nginx, RabbitMQ, MongoDB,
//! PHP-FPM, Hive's own services, ...) until no detector has anything
//! left to add.

#[macro_use] extern crate lazy_static;
#[cfg(test)] #[macro_use] extern crate maplit;

pub mod downgrades;
pub mod event;
pub mod journal;
pub mod messaging;
pub mod modifiers;
pub mod rxp;
pub mod rxparser;
pub mod wrappers;

#[cfg(test)] pub(crate) mod testevents;

pub use event::{BoxedEvent, Event, EventKind, Message, Priority};
pub use journal::JournalEntry;
pub use modifiers::{Modified, Modifier, Registry};

/// Decodes a bus envelope into a classified [Event].
///
/// The envelope's payload is unmarshaled into the base journal entry,
/// its digest is re-derived and verified, and the result is run to a
/// fixed point through the registry's modifiers.  Decode and digest
/// failures are returned to the caller, which is expected to reject
/// the message; classification itself cannot fail.
pub fn unmarshal_event(
  envelope: &messaging::Envelope,
  registry: &modifiers::Registry
) -> Result<BoxedEvent, journal::Error> {
  let entry = journal::JournalEntry::unmarshal_event(envelope)?;

  Ok(registry.apply(Box::new(entry)))
}
