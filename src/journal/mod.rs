// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

//! The systemd journal entry: the base event everything else wraps.
//! Entries arrive as bus envelopes published by the log collectors;
//! this module decodes them, restores the envelope-hoisted fields,
//! and verifies their content digests.

use std::collections::BTreeMap;

use blake2::{Blake2b, Digest};
use blake2::digest::consts::U32;
use chrono::DateTime;
use chrono::offset::{TimeZone, Utc};
use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};
use snafu::{ensure, ResultExt, Snafu};

use crate::event::{Event, EventKind, Message, Priority};
use crate::messaging::{self, Envelope, CONTENT_TYPE_JSON};

/// CloudEvent type of systemd journal entries published to
/// [EVENTS_QUEUE].
pub const EVENT_TYPE: &str = "net.hive.systemd_journal_event";

/// Queue where log collectors publish the journal entries they
/// collect.
pub const EVENTS_QUEUE: &str = "systemd.journal.events";

#[derive(Debug, Snafu)]
pub enum Error {
  #[snafu(display(
    "unexpected event type {:?}", event_type
  ))]
  UnexpectedEventType {
    event_type: String
  },

  /// A checksum failed.
  #[snafu(display(
    "invalid digest: got {:?}, want {:?}", got, want
  ))]
  InvalidDigest {
    got: String,
    want: String
  },

  #[snafu(display(
    "unable to encode journal entry: {}", source
  ))]
  EntryEncode {
    source: messaging::Error
  },

  #[snafu(display(
    "unable to decode journal entry: {}", source
  ))]
  EntryDecode {
    source: messaging::Error
  }
}

fn is_empty(s: &str) -> bool {
  s.is_empty()
}

fn is_zero(v: &i64) -> bool {
  *v == 0
}

/// A systemd journal entry plus address fields.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct JournalEntry {
  /// Digest of `fields` plus the two timestamp address fields.
  #[serde(default, skip_serializing_if = "is_empty")]
  pub digest: String,

  /// systemd address fields that the journal reader moves out of
  /// line.  Both are in **microseconds** since the epoch.
  #[serde(rename = "realtime_usec")]
  pub realtime_timestamp: u64,
  #[serde(rename = "monotonic_usec")]
  pub monotonic_timestamp: u64,

  /// Hive collection and ingestion timestamps.  These are in
  /// **nanoseconds** since the epoch.
  #[serde(rename = "collected_nsec", default, skip_serializing_if = "is_zero")]
  pub collection_timestamp: i64,
  #[serde(rename = "ingested_nsec", default, skip_serializing_if = "is_zero")]
  pub ingestion_timestamp: i64,

  /// All fields of a journal entry, less outlined address fields, as
  /// defined in systemd.journal-fields(7).  Note that fields prefixed
  /// with an underscore are systemd _trusted fields_ added by systemd
  /// on the originating host.  Note that it's _systemd_ doing the
  /// trusting.
  pub fields: BTreeMap<String, String>
}

type Blake2b256 = Blake2b<U32>;

/// Computes the canonical content identity of a journal field map and
/// the two address-field timestamps systemd moved out of line.  Pure
/// and deterministic: everything the collector read from the journal,
/// less the cursor it drops before forwarding.
pub fn digest(
  fields: &BTreeMap<String, String>,
  realtime_usec: u64,
  monotonic_usec: u64
) -> String {
  let mut fields = fields.clone();

  fields.insert(
    "__REALTIME_TIMESTAMP".to_string(),
    realtime_usec.to_string()
  );
  fields.insert(
    "__MONOTONIC_TIMESTAMP".to_string(),
    monotonic_usec.to_string()
  );

  // BTreeMap serializes with lexically sorted keys, so this is
  // canonical.
  let data = serde_json::to_vec(&fields)
    .expect("maps of strings always encode");

  let hash = Blake2b256::digest(&data);
  let encoded = base64::encode(&hash);

  format!("BLAKE2b:{}", encoded.trim_end_matches('='))
}

impl JournalEntry {
  /// Returns the string-encoded BLAKE2b-256 digest of this entry's
  /// fields, including the address-field timestamps.
  pub fn blake2b256_digest(&self) -> String {
    digest(&self.fields, self.realtime_timestamp, self.monotonic_timestamp)
  }

  fn field(&self, k: &str) -> &str {
    self.fields.get(k).map(String::as_str).unwrap_or("")
  }

  /// Marshals this entry into a bus envelope.  The digest and the
  /// collection timestamp are hoisted out of the payload into the
  /// envelope's `id` and `time` attributes rather than duplicating
  /// them on the wire.  An entry already carrying a digest that
  /// disagrees with its content is refused.
  pub fn marshal_event(&self) -> Result<Envelope, Error> {
    let digest = self.blake2b256_digest();
    ensure!(
      self.digest.is_empty() || self.digest == digest,
      InvalidDigest { got: self.digest.as_str(), want: digest.as_str() }
    );

    let mut entry = self.clone();
    entry.digest = String::new();

    let mut envelope = Envelope::new(EVENT_TYPE);
    envelope.id = digest;

    if entry.collection_timestamp != 0 {
      envelope.time = Some(Utc.timestamp_nanos(entry.collection_timestamp));
      entry.collection_timestamp = 0;
    }

    envelope.set_data(CONTENT_TYPE_JSON, &entry).context(EntryEncode)?;

    Ok(envelope)
  }

  /// Unmarshals a bus envelope into a journal entry.  The digest and
  /// collection timestamp are restored from the envelope if the
  /// payload doesn't carry them, then the digest is independently
  /// re-derived and checked: an entry that doesn't match its digest
  /// is corrupt and is refused rather than let through.
  pub fn unmarshal_event(envelope: &Envelope) -> Result<JournalEntry, Error> {
    ensure!(
      envelope.event_type == EVENT_TYPE,
      UnexpectedEventType { event_type: envelope.event_type.as_str() }
    );

    let mut entry: JournalEntry = envelope.data_as().context(EntryDecode)?;

    // Sink the collection timestamp and digest, if necessary.
    if entry.collection_timestamp == 0 {
      if let Some(time) = envelope.time {
        entry.collection_timestamp = time.timestamp_nanos_opt().unwrap_or(0);
      }
    }
    if entry.digest.is_empty() {
      entry.digest = envelope.id.clone();
    }

    let want = entry.blake2b256_digest();
    ensure!(
      entry.digest == want,
      InvalidDigest { got: entry.digest.as_str(), want: want.as_str() }
    );

    Ok(entry)
  }
}

impl Event for JournalEntry {
  /// Prefers the `_COMM` trusted field, falling back to the
  /// `SYSLOG_IDENTIFIER` compatibility field.
  fn command(&self) -> &str {
    match self.field("_COMM") {
      "" => self.field("SYSLOG_IDENTIFIER"),
      command => command
    }
  }

  /// Docker sets `CONTAINER_NAME`, maybe others too.
  fn container_name(&self) -> &str {
    self.field("CONTAINER_NAME")
  }

  fn hostname(&self) -> &str {
    self.field("_HOSTNAME")
  }

  fn id(&self) -> &str {
    &self.digest
  }

  fn kind(&self) -> EventKind {
    EventKind::Journal
  }

  fn message(&self) -> &dyn Message {
    self
  }

  /// The priority as reported by the originating process.  This isn't
  /// always present or useful: entries from processes in Docker
  /// containers are reported as Info if collected from stdout or Err
  /// if collected from stderr, so it may well not line up with the
  /// content of the message.
  fn priority(&self) -> Priority {
    self.field("PRIORITY").parse::<i64>().ok()
      .and_then(Priority::from_syslog)
      .unwrap_or(Priority::UNKNOWN)
  }

  /// The wallclock time of the originating host at the point the
  /// entry was received by the systemd journal.  Microsecond
  /// granularity.
  fn time(&self) -> DateTime<Utc> {
    Utc.timestamp_nanos((self.realtime_timestamp as i64) * 1000)
  }
}

impl Message for JournalEntry {
  fn text(&self) -> &str {
    self.field("MESSAGE")
  }

  fn fields(&self) -> Option<&Map<String, Value>> {
    None
  }

  fn pairs(&self) -> Vec<(String, Value)> {
    Vec::new()
  }
}
