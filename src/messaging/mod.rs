// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

//! The bus envelope structured events travel in.  Only the shape of
//! the envelope lives here; connections, channels and delivery are
//! the message bus's problem, not ours.

use chrono::DateTime;
use chrono::offset::Utc;
use serde::{Serialize, Deserialize};
use serde::de::DeserializeOwned;
use serde_json::Value;
use snafu::{ResultExt, Snafu};

/// Content type of JSON-encoded event payloads.  The only payload
/// encoding there is, today.
pub const CONTENT_TYPE_JSON: &str = "application/json";

#[derive(Debug, Snafu)]
pub enum Error {
  #[snafu(display(
    "unable to decode envelope: {}", source
  ))]
  EnvelopeDecode {
    source: serde_json::Error
  },

  #[snafu(display(
    "unable to encode envelope data: {}", source
  ))]
  DataEncode {
    source: serde_json::Error
  },

  #[snafu(display(
    "unable to decode envelope data: {}", source
  ))]
  DataDecode {
    source: serde_json::Error
  }
}

fn is_empty(s: &str) -> bool {
  s.is_empty()
}

/// A bus envelope: the canonical wire representation of a structured
/// event.  The `id` and `time` attributes exist so payload-level
/// values can be hoisted out of line rather than duplicated on the
/// wire.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Envelope {
  #[serde(default, skip_serializing_if = "is_empty")]
  pub id: String,

  #[serde(rename = "type")]
  pub event_type: String,

  #[serde(
    rename = "datacontenttype",
    default,
    skip_serializing_if = "is_empty"
  )]
  pub content_type: String,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub time: Option<DateTime<Utc>>,

  #[serde(default, skip_serializing_if = "Value::is_null")]
  pub data: Value
}

impl Envelope {
  /// Returns a new, empty envelope of the given event type.
  pub fn new(event_type: &str) -> Envelope {
    Envelope {
      id: String::new(),
      event_type: event_type.to_string(),
      content_type: String::new(),
      time: None,
      data: Value::Null
    }
  }

  /// Decodes an envelope from its JSON-encoded wire form.  Attributes
  /// we don't model are ignored.
  pub fn from_json(b: &[u8]) -> Result<Envelope, Error> {
    serde_json::from_slice(b).context(EnvelopeDecode)
  }

  /// Returns the JSON-encoded wire form of this envelope.
  pub fn to_json(&self) -> Result<Vec<u8>, Error> {
    serde_json::to_vec(self).context(DataEncode)
  }

  /// Encodes a payload into the envelope.
  pub fn set_data<T: Serialize>(
    &mut self, content_type: &str, data: &T
  ) -> Result<(), Error> {
    self.content_type = content_type.to_string();
    self.data = serde_json::to_value(data).context(DataEncode)?;

    Ok(())
  }

  /// Decodes the envelope's payload.
  pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, Error> {
    serde_json::from_value(self.data.clone()).context(DataDecode)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use serde_json::json;
  use spectral::prelude::*;

  #[test]
  fn test_roundtrip() {
    let mut envelope = Envelope::new("net.hive.test_event");
    envelope.id = "some-id".to_string();
    envelope.set_data(CONTENT_TYPE_JSON, &json!({"a": 1})).unwrap();

    let b = envelope.to_json().unwrap();
    let got = Envelope::from_json(&b).unwrap();

    assert_eq!(got.id, "some-id");
    assert_eq!(got.event_type, "net.hive.test_event");
    assert_eq!(got.content_type, CONTENT_TYPE_JSON);
    assert_eq!(got.data, json!({"a": 1}));
  }

  #[test]
  fn test_unknown_attributes_ignored() {
    let got = Envelope::from_json(br#"{
      "specversion": "1.0",
      "id": "x",
      "source": "https://hive.example.net/services/log-collector",
      "type": "net.hive.test_event",
      "data": {}
    }"#).unwrap();

    assert_eq!(got.event_type, "net.hive.test_event");
    assert_that!(got.time).is_none();
  }

  #[test]
  fn test_decode_error_propagates() {
    assert_that!(Envelope::from_json(b"not json")).is_err();
  }
}
