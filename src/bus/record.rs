//! Record Payloads - reconstruction from loosely-typed key/value records
//!
//! Second flavor of the bus for payloads that originate outside the
//! process's type system: a host system event arrives as a string-keyed
//! record, and the payload type rebuilds itself from it. The bus performs
//! no translation of its own - [`FromRecord`] belongs to the payload.
//!
//! Decode failures are surfaced to the observer as a typed
//! [`RecordError`] rather than dropped or treated as fatal, so a
//! mismatched producer/consumer pair is diagnosable at runtime.
//!
//! # Example
//!
//! ```ignore
//! use serde::Deserialize;
//! use viewbus::bus::{self, FromRecord, Notification, Record};
//! use viewbus::RecordError;
//!
//! #[derive(Deserialize)]
//! struct KeyboardFrame { height: f64 }
//!
//! impl Notification for KeyboardFrame {
//!     fn channel_name() -> std::borrow::Cow<'static, str> {
//!         "HostKeyboardWillShow".into()
//!     }
//! }
//!
//! impl FromRecord for KeyboardFrame {
//!     fn from_record(record: &Record) -> Result<Self, RecordError> {
//!         bus::decode_record(record)
//!     }
//! }
//!
//! let _subscription = bus::observe_record::<KeyboardFrame, _>(|_, result| {
//!     match result {
//!         Ok(frame) => println!("keyboard height: {}", frame.height),
//!         Err(err) => eprintln!("bad host event: {err}"),
//!     }
//! });
//! ```

use std::any::Any;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::bus::broadcast::{self, Envelope};
use crate::bus::notify::Notification;
use crate::error::RecordError;
use crate::subscription::Subscription;
use crate::types::short_type_name;

/// A loosely-typed key/value record, as handed over by a host framework.
pub type Record = serde_json::Map<String, Value>;

// =============================================================================
// FROM-RECORD TRAIT
// =============================================================================

/// Payload types that can rebuild themselves from a raw record.
///
/// Implementations that are plain serde shapes can delegate to
/// [`decode_record`]; hand-rolled implementations use the `require_*`
/// helpers to report precise field-level errors.
pub trait FromRecord: Sized {
    fn from_record(record: &Record) -> Result<Self, RecordError>;
}

/// Decode a record into any `Deserialize` payload.
///
/// This is the default behavior [`FromRecord`] implementations can call;
/// it is a free function rather than a blanket impl so types remain free
/// to decode by hand.
pub fn decode_record<T: DeserializeOwned>(record: &Record) -> Result<T, RecordError> {
    serde_json::from_value(Value::Object(record.clone())).map_err(RecordError::from)
}

// =============================================================================
// FIELD HELPERS
// =============================================================================

/// Fetch a field, reporting its absence as a typed error.
pub fn require_field<'r>(record: &'r Record, field: &str) -> Result<&'r Value, RecordError> {
    record
        .get(field)
        .ok_or_else(|| RecordError::MissingField(field.to_string()))
}

/// Fetch a string field.
pub fn require_str<'r>(record: &'r Record, field: &str) -> Result<&'r str, RecordError> {
    require_field(record, field)?
        .as_str()
        .ok_or_else(|| RecordError::WrongType {
            field: field.to_string(),
            expected: "string",
        })
}

/// Fetch an integer field.
pub fn require_i64(record: &Record, field: &str) -> Result<i64, RecordError> {
    require_field(record, field)?
        .as_i64()
        .ok_or_else(|| RecordError::WrongType {
            field: field.to_string(),
            expected: "integer",
        })
}

// =============================================================================
// POST / OBSERVE
// =============================================================================

/// Broadcast a raw record on an externally-named channel.
///
/// This is the producer side of a host system event: the producer knows
/// only the channel name and the record, never the payload type.
pub fn post_record(channel: &str, record: Record, sender: Option<Rc<dyn Any>>) {
    log::trace!("bus: posting raw record on `{channel}`");
    broadcast::post(channel, Envelope::new(Rc::new(record), sender));
}

/// Subscribe to records on `T`'s channel, decoded through `T::from_record`.
///
/// The callback receives `Ok(payload)` for records that decode, and a
/// typed [`RecordError`] for records that do not. Envelopes on the channel
/// that are not records at all are dropped with a warning.
pub fn observe_record<T, F>(callback: F) -> Subscription
where
    T: Notification + FromRecord,
    F: Fn(Option<&dyn Any>, Result<T, RecordError>) + 'static,
{
    let channel = T::channel_name();
    let handle = broadcast::add_observer(&channel, move |envelope| {
        match envelope.payload().downcast_ref::<Record>() {
            Some(record) => {
                let decoded = T::from_record(record);
                if let Err(err) = &decoded {
                    log::warn!(
                        "bus: record on `{}` failed to decode as {}: {err}",
                        T::channel_name(),
                        short_type_name::<T>()
                    );
                }
                callback(envelope.sender(), decoded);
            }
            None => log::warn!(
                "bus: dropping envelope on `{}`: payload is not a raw record",
                T::channel_name()
            ),
        }
    });

    Subscription::new(move || broadcast::remove_observer(handle))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::notify::reset_bus_state;
    use serde::Deserialize;
    use serde_json::json;
    use std::cell::RefCell;

    fn setup() {
        reset_bus_state();
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("test record must be an object, got {other}"),
        }
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct BatteryEvent {
        level: i64,
        charging: bool,
    }

    impl Notification for BatteryEvent {
        fn channel_name() -> std::borrow::Cow<'static, str> {
            "HostBatteryChanged".into()
        }
    }

    impl FromRecord for BatteryEvent {
        fn from_record(record: &Record) -> Result<Self, RecordError> {
            decode_record(record)
        }
    }

    #[derive(Debug, PartialEq)]
    struct HandRolled {
        name: String,
        count: i64,
    }

    impl Notification for HandRolled {
        fn channel_name() -> std::borrow::Cow<'static, str> {
            "HostHandRolled".into()
        }
    }

    impl FromRecord for HandRolled {
        fn from_record(record: &Record) -> Result<Self, RecordError> {
            Ok(Self {
                name: require_str(record, "name")?.to_string(),
                count: require_i64(record, "count")?,
            })
        }
    }

    #[test]
    fn test_well_formed_record_decodes_and_delivers() {
        setup();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let _subscription = observe_record::<BatteryEvent, _>(move |_, result| {
            seen_clone.borrow_mut().push(result.expect("decodes"));
        });

        post_record(
            "HostBatteryChanged",
            record(json!({"level": 80, "charging": true})),
            None,
        );

        assert_eq!(
            *seen.borrow(),
            vec![BatteryEvent {
                level: 80,
                charging: true
            }]
        );
    }

    #[test]
    fn test_malformed_record_surfaces_a_typed_error() {
        setup();

        let errors = Rc::new(RefCell::new(Vec::new()));
        let errors_clone = errors.clone();
        let _subscription = observe_record::<BatteryEvent, _>(move |_, result| {
            errors_clone
                .borrow_mut()
                .push(result.expect_err("must not decode"));
        });

        post_record(
            "HostBatteryChanged",
            record(json!({"level": "eighty"})),
            None,
        );

        let errors = errors.borrow();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], RecordError::Malformed(_)));
    }

    #[test]
    fn test_hand_rolled_decode_reports_field_level_errors() {
        setup();

        let missing = record(json!({"count": 3}));
        let err = HandRolled::from_record(&missing).unwrap_err();
        assert!(matches!(err, RecordError::MissingField(ref f) if f == "name"));

        let wrong = record(json!({"name": "ok", "count": "three"}));
        let err = HandRolled::from_record(&wrong).unwrap_err();
        assert!(
            matches!(err, RecordError::WrongType { ref field, expected } if field == "count" && expected == "integer")
        );

        let good = record(json!({"name": "ok", "count": 3}));
        assert_eq!(
            HandRolled::from_record(&good).unwrap(),
            HandRolled {
                name: "ok".to_string(),
                count: 3
            }
        );
    }

    #[test]
    fn test_record_channel_ignores_other_channels() {
        setup();

        let count = Rc::new(RefCell::new(0));
        let count_clone = count.clone();
        let _subscription = observe_record::<HandRolled, _>(move |_, _| {
            *count_clone.borrow_mut() += 1;
        });

        post_record("SomeOtherChannel", record(json!({"name": "x", "count": 1})), None);
        assert_eq!(*count.borrow(), 0);

        post_record("HostHandRolled", record(json!({"name": "x", "count": 1})), None);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_released_record_subscription_stops_delivery() {
        setup();

        let count = Rc::new(RefCell::new(0));
        let count_clone = count.clone();
        let subscription = observe_record::<BatteryEvent, _>(move |_, _| {
            *count_clone.borrow_mut() += 1;
        });

        post_record(
            "HostBatteryChanged",
            record(json!({"level": 10, "charging": false})),
            None,
        );
        assert_eq!(*count.borrow(), 1);

        subscription.release();
        post_record(
            "HostBatteryChanged",
            record(json!({"level": 11, "charging": false})),
            None,
        );
        assert_eq!(*count.borrow(), 1);
    }
}
