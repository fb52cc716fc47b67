// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

//! Test-support builders: journal entries and envelopes shaped like
//! the ones the log collector publishes from a containerized Nginx,
//! with the message text swapped for whatever the test needs.

use crate::journal::JournalEntry;
use crate::messaging::Envelope;

/// Returns a journal entry, digest populated, whose MESSAGE field is
/// the given text.
pub fn entry_for_message(message: &str) -> JournalEntry {
  let mut entry = JournalEntry {
    realtime_timestamp: 1751009634906660,
    monotonic_timestamp: 1931361950197,
    fields: btreemap!{
      "CONTAINER_ID".to_string() =>
        "9f0911fb18d7".to_string(),
      "CONTAINER_NAME".to_string() =>
        "hive-nginx-ingress-1".to_string(),
      "IMAGE_NAME".to_string() =>
        "nginx".to_string(),
      "MESSAGE".to_string() =>
        message.to_string(),
      "PRIORITY".to_string() =>
        "3".to_string(),
      "SYSLOG_IDENTIFIER".to_string() =>
        "9f0911fb18d7".to_string(),
      "_BOOT_ID".to_string() =>
        "27fbd0a3c26945e28624dad56044f8fe".to_string(),
      "_CMDLINE".to_string() =>
        "/usr/bin/dockerd -H fd://".to_string(),
      "_COMM".to_string() =>
        "dockerd".to_string(),
      "_HOSTNAME".to_string() =>
        "box1".to_string(),
      "_MACHINE_ID".to_string() =>
        "b7ae3b30d3284b1dacb78ec9b966f531".to_string(),
      "_PID".to_string() =>
        "559660".to_string(),
      "_TRANSPORT".to_string() =>
        "journal".to_string()
    },
    ..Default::default()
  };

  entry.digest = entry.blake2b256_digest();
  entry
}

/// Returns a bus envelope carrying a journal entry whose MESSAGE
/// field is the given text.
pub fn envelope_for_message(message: &str) -> Envelope {
  entry_for_message(message).marshal_event().unwrap()
}
