//! Optimization flags attached to generated vnode calls.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Describes which parts of an element may change between renders.
    ///
    /// Positive values are combinable bits. `HOISTED` and `BAIL` are
    /// negative sentinels that are only ever used alone.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PatchFlags: i32 {
        /// Dynamic text content
        const TEXT = 1;
        /// Dynamic class binding
        const CLASS = 1 << 1;
        /// Dynamic style binding
        const STYLE = 1 << 2;
        /// Dynamic non-class/style props, listed in `dynamicProps`
        const PROPS = 1 << 3;
        /// Props with dynamic keys; disables the specific bits above
        const FULL_PROPS = 1 << 4;
        /// Props that only matter during hydration (e.g. event listeners)
        const NEED_HYDRATION = 1 << 5;
        /// Fragment whose children order never changes
        const STABLE_FRAGMENT = 1 << 6;
        /// Fragment with keyed children
        const KEYED_FRAGMENT = 1 << 7;
        /// Fragment with unkeyed children
        const UNKEYED_FRAGMENT = 1 << 8;
        /// Needs patching for refs, hooks or custom directives only
        const NEED_PATCH = 1 << 9;
        /// Component whose slots are conditional or looped
        const DYNAMIC_SLOTS = 1 << 10;
        /// Fragment created because of comments at the template root
        const DEV_ROOT_FRAGMENT = 1 << 11;
        /// Hoisted static vnode
        const HOISTED = -1;
        /// Leave optimized mode for this subtree
        const BAIL = -2;
    }
}

const FLAG_NAMES: [(PatchFlags, &str); 12] = [
    (PatchFlags::TEXT, "TEXT"),
    (PatchFlags::CLASS, "CLASS"),
    (PatchFlags::STYLE, "STYLE"),
    (PatchFlags::PROPS, "PROPS"),
    (PatchFlags::FULL_PROPS, "FULL_PROPS"),
    (PatchFlags::NEED_HYDRATION, "NEED_HYDRATION"),
    (PatchFlags::STABLE_FRAGMENT, "STABLE_FRAGMENT"),
    (PatchFlags::KEYED_FRAGMENT, "KEYED_FRAGMENT"),
    (PatchFlags::UNKEYED_FRAGMENT, "UNKEYED_FRAGMENT"),
    (PatchFlags::NEED_PATCH, "NEED_PATCH"),
    (PatchFlags::DYNAMIC_SLOTS, "DYNAMIC_SLOTS"),
    (PatchFlags::DEV_ROOT_FRAGMENT, "DEV_ROOT_FRAGMENT"),
];

impl PatchFlags {
    /// Whether this is one of the negative sentinel values.
    #[inline]
    pub fn is_sentinel(self) -> bool {
        self.bits() < 0
    }

    /// Human readable names, in ascending bit order.
    pub fn names(self) -> std::vec::Vec<&'static str> {
        if self == Self::HOISTED {
            return vec!["HOISTED"];
        }
        if self == Self::BAIL {
            return vec!["BAIL"];
        }
        FLAG_NAMES
            .iter()
            .filter(|(flag, _)| self.bits() & flag.bits() != 0)
            .map(|(_, name)| *name)
            .collect()
    }

    /// Render as `value /* NAMES */`, the form used in generated code.
    pub fn to_annotated(self) -> std::string::String {
        format!("{} /* {} */", self.bits(), self.names().join(", "))
    }
}

/// How a component's slots object may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SlotFlags {
    /// Slot content only depends on the slot's own props
    Stable = 1,
    /// Slot content references outer scope variables or is conditional
    Dynamic = 2,
    /// Slot content is forwarded from a parent's `<slot>`
    Forwarded = 3,
}

impl SlotFlags {
    pub fn name(self) -> &'static str {
        match self {
            Self::Stable => "STABLE",
            Self::Dynamic => "DYNAMIC",
            Self::Forwarded => "FORWARDED",
        }
    }
}
