//! Shared tag types for the Tally event aggregation workspace.
//!
//! Every aggregated count is keyed by two closed tag sets: what happened
//! ([`EventType`]) and which component reported it ([`DeviceType`]). Both
//! are persisted by their canonical label, so the label strings returned by
//! `as_str` are part of the stored data format and must never change.
//!
//! Untrusted labels are checked with the `is_valid` predicates or parsed
//! with [`std::str::FromStr`]; adding a new tag is a one-place change to the
//! `define_tags!` invocation below.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which closed tag set a rejected label was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// [`EventType`].
    EventType,
    /// [`DeviceType`].
    DeviceType,
}

impl TagKind {
    /// Returns a human-readable name for the tag set.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EventType => "event type",
            Self::DeviceType => "device type",
        }
    }
}

/// Error returned when a label is outside its closed tag set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {}: {value:?}", kind.as_str())]
pub struct ParseTagError {
    /// The tag set the label was checked against.
    pub kind: TagKind,
    /// The rejected label.
    pub value: String,
}

macro_rules! define_tags {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:expr, {
            $( $(#[$vmeta:meta])* $variant:ident => $label:tt, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant, )+
        }

        impl $name {
            /// Every member of the closed set, in declaration order.
            pub const ALL: &'static [Self] = &[ $( Self::$variant, )+ ];

            /// Returns the canonical label stored for this tag.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }

            /// Returns `true` if `label` names a member of the closed set.
            pub fn is_valid(label: &str) -> bool {
                Self::ALL.iter().any(|tag| tag.as_str() == label)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseTagError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|tag| tag.as_str() == s)
                    .ok_or_else(|| ParseTagError {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

define_tags! {
    /// What happened. Each member is a distinct failure or lifecycle class
    /// reported by the key exchange service.
    EventType, TagKind::EventType, {
        /// A one-time key was submitted with a signature that was already used.
        OtkDuplicateSignature => "OTKDuplicateSignature",
        /// A one-time key expired before it was claimed.
        OtkExpired => "OTKExpired",
        /// A one-time key was generated by a health authority portal.
        OtkGenerated => "OTKGenerated",
        /// A one-time key was claimed by a device.
        OtkClaimed => "OTKClaimed",
        /// A claim was attempted with a key that does not exist.
        OtkUnclaimed => "OTKUnclaimed",
        /// A one-time key was regenerated for the same case.
        OtkRegenerated => "OTKRegenerated",
        /// Diagnosis keys were uploaded by a device.
        KeysUploaded => "KeysUploaded",
        /// A key claim failed for a reason other than an unknown key.
        ClaimFailure => "ClaimFailure",
    }
}

define_tags! {
    /// Which component or platform reported the event.
    ///
    /// [`DeviceType::Server`] marks events raised by the key exchange
    /// service itself; only those are reported by the server-event queries.
    DeviceType, TagKind::DeviceType, {
        /// An Android handset.
        Android => "Android",
        /// An iOS handset.
        Ios => "iOS",
        /// The key exchange service itself.
        Server => "Server",
        /// A health authority portal.
        Portal => "Portal",
    }
}
