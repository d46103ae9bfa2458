//! Enum types for the beads data model.
//!
//! `IssueType` is an open set (unrecognized values round-trip as
//! `IssueType::Custom`), so it keeps the teacher's string-backed macro with a
//! catch-all variant. `Status` and `DependencyType` are closed sets per the
//! data model and are rejected outright on an unknown value. `Priority` has
//! two string representations (`critical`..`backlog` and `P0`..`P4`) and is
//! hand-written to support both.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Macro: defines an open-set enum with known string variants + a Custom(String)
// fallback, serialized/deserialized as a plain string.
// ---------------------------------------------------------------------------
macro_rules! define_enum {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident, custom_variant = $custom_variant:ident,
        variants: [
            $( ($variant:ident, $str:expr) ),+ $(,)?
        ]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )+
            $custom_variant(String),
        }

        impl $name {
            /// Returns the string representation.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $str, )+
                    Self::$custom_variant(s) => s.as_str(),
                }
            }

            /// Returns `true` if this is the default variant.
            pub fn is_default(&self) -> bool {
                *self == Self::$default
            }

            /// Returns `true` if this is a built-in (non-custom) variant.
            pub fn is_builtin(&self) -> bool {
                !matches!(self, Self::$custom_variant(_))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from(s.as_str()))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $( $str => Self::$variant, )+
                    other => Self::$custom_variant(other.to_owned()),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.as_str() {
                    $( $str => Self::$variant, )+
                    _ => Self::$custom_variant(s),
                }
            }
        }
    };
}

define_enum!(
    /// The kind of work an issue represents. Open set: any string not in the
    /// known list round-trips through `IssueType::Custom`.
    IssueType, default = Task, custom_variant = Custom,
    variants: [
        (Task, "task"),
        (Bug, "bug"),
        (Feature, "feature"),
        (Epic, "epic"),
        (Chore, "chore"),
    ]
);

/// Issue lifecycle status. Closed set — see `Status::from_str`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Open,
    InProgress,
    Hooked,
    Closed,
    Tombstone,
}

/// Error returned when a string does not name a known `Status` or
/// `DependencyType` variant.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Hooked => "hooked",
            Self::Closed => "closed",
            Self::Tombstone => "tombstone",
        }
    }

    /// Returns `true` if this status lives under `closed/` on disk (I2).
    pub fn is_closed_location(&self) -> bool {
        matches!(self, Self::Closed | Self::Tombstone)
    }
}

impl std::str::FromStr for Status {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "hooked" => Ok(Self::Hooked),
            "closed" => Ok(Self::Closed),
            "tombstone" => Ok(Self::Tombstone),
            other => Err(UnknownVariant {
                kind: "status",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The relationship a dependency edge expresses. Closed set: only `blocks`
/// and `parent_child` are meaningful to the store's invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyType {
    /// The owning issue is blocked by the edge target.
    Blocks,
    /// The edge target is the owning issue's parent (denormalized alongside
    /// `Issue::parent`).
    ParentChild,
}

impl DependencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::ParentChild => "parent_child",
        }
    }
}

impl std::str::FromStr for DependencyType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blocks" => Ok(Self::Blocks),
            "parent_child" => Ok(Self::ParentChild),
            other => Err(UnknownVariant {
                kind: "dependency type",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DependencyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DependencyType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Issue priority. Exposed both as a word (`critical`..`backlog`, the
/// canonical serialized form) and as `P0`..`P4` (an alternate textual form
/// accepted on parse, e.g. from formula variables or CLI flags upstream).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
    Backlog,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Backlog => "backlog",
        }
    }

    /// Returns the `P0`..`P4` alias for this priority.
    pub fn as_p_level(&self) -> &'static str {
        match self {
            Self::Critical => "P0",
            Self::High => "P1",
            Self::Medium => "P2",
            Self::Low => "P3",
            Self::Backlog => "P4",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" | "P0" | "p0" => Ok(Self::Critical),
            "high" | "P1" | "p1" => Ok(Self::High),
            "medium" | "P2" | "p2" => Ok(Self::Medium),
            "low" | "P3" | "p3" => Ok(Self::Low),
            "backlog" | "P4" | "p4" => Ok(Self::Backlog),
            other => Err(UnknownVariant {
                kind: "priority",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
