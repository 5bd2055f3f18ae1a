//! Enum types for the context palace domain.
//!
//! Each enum has:
//! - Custom Serialize (as snake_case/kebab-case string)
//! - Custom Deserialize (known variants + catch-all Custom(String))
//! - `as_str()`, `is_default()`, `Display` impl

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Macro: defines an enum with known string variants + a Custom(String) fallback.
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

            /// Returns `true` unless this is a custom variant holding an empty string --
            /// the one shape `From<&str>`/`From<String>` can produce that nothing downstream
            /// should accept.
            pub fn is_valid(&self) -> bool {
                match self {
                    Self::$custom_variant(s) => !s.is_empty(),
                    _ => true,
                }
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
                // Reuse the &str match so the known-variant arms live in one place;
                // only the unmatched case needs the owned `s` at all.
                match Self::from(s.as_str()) {
                    Self::$custom_variant(_) => Self::$custom_variant(s),
                    known => known,
                }
            }
        }
    };
}

// ===========================================================================
// Status — the generic lifecycle column shared by every shard.
// ===========================================================================

define_enum! {
    /// Generic open/in_progress/closed status carried by every shard.
    ///
    /// `open -> in_progress -> closed`, with `reopen` taking `closed` back to
    /// `open`. Requirement-specific sub-state lives in `metadata.lifecycle_status`
    /// instead (see [`LifecycleStatus`]) so this column stays uniform across
    /// shard types.
    Status, default = Open, custom_variant = Custom,
    variants: [
        (Open, "open"),
        (InProgress, "in_progress"),
        (Closed, "closed"),
    ]
}

// ===========================================================================
// ShardType
// ===========================================================================

define_enum! {
    /// Categorises a shard's behavioral meaning. Freeform, but certain values
    /// (`memory`, `knowledge`, `requirement`, `epic`, `message`) are treated
    /// specially by the vertical engines.
    ShardType, default = Task, custom_variant = Custom,
    variants: [
        (Task, "task"),
        (Bug, "bug"),
        (Memory, "memory"),
        (Message, "message"),
        (Knowledge, "knowledge"),
        (Requirement, "requirement"),
        (Epic, "epic"),
        (Test, "test"),
        (Doc, "doc"),
        (Design, "design"),
        (Log, "log"),
        (Proposal, "proposal"),
        (Session, "session"),
    ]
}

impl ShardType {
    /// Shard types excluded from `next`/ready-work scheduling.
    pub fn excluded_from_next(&self) -> bool {
        matches!(self, Self::Epic | Self::Memory | Self::Message)
    }
}

// ===========================================================================
// EdgeType
// ===========================================================================

define_enum! {
    /// Typed directed relation between two shards. Open vocabulary; these
    /// variants carry behavior in the core engines.
    EdgeType, default = References, custom_variant = Custom,
    variants: [
        (BlockedBy, "blocked-by"),
        (ChildOf, "child-of"),
        (PreviousVersion, "previous-version"),
        (Implements, "implements"),
        (HasArtifact, "has-artifact"),
        (References, "references"),
        (RepliesTo, "replies-to"),
    ]
}

// ===========================================================================
// DocType — knowledge shard sub-classification.
// ===========================================================================

define_enum! {
    /// `metadata.doc_type` on a knowledge shard.
    DocType, default = Reference, custom_variant = Custom,
    variants: [
        (Architecture, "architecture"),
        (Vision, "vision"),
        (Roadmap, "roadmap"),
        (Decision, "decision"),
        (Reference, "reference"),
    ]
}

// ===========================================================================
// LifecycleStatus — requirement sub-state kept in metadata, not `status`.
// ===========================================================================

define_enum! {
    /// `metadata.lifecycle_status` on a requirement shard.
    ///
    /// `draft -> approved -> in_progress -> implemented -> verified`, with
    /// `reopen` taking any non-draft state back to `approved`.
    LifecycleStatus, default = Draft, custom_variant = Custom,
    variants: [
        (Draft, "draft"),
        (Approved, "approved"),
        (InProgress, "in_progress"),
        (Implemented, "implemented"),
        (Verified, "verified"),
    ]
}

impl LifecycleStatus {
    /// Transition target for `approve`. Only valid from `draft`.
    pub fn can_approve(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Transition target for `verify`. Only valid from `implemented`.
    pub fn can_verify(&self) -> bool {
        matches!(self, Self::Implemented)
    }

    /// `reopen` is valid from any state except `draft`.
    pub fn can_reopen(&self) -> bool {
        !matches!(self, Self::Draft)
    }
}
