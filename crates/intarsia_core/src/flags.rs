//! Patch flags attached to vnode calls.
//!
//! A patch flag tells the runtime which parts of a vnode can change so the
//! patch phase can skip the rest. Flags are a bitmask except for the two
//! negative sentinels, which are never combined with anything else.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
    pub struct PatchFlags: i32 {
        /// Dynamic text content
        const TEXT = 1;
        /// Dynamic class binding
        const CLASS = 1 << 1;
        /// Dynamic style binding
        const STYLE = 1 << 2;
        /// Dynamic non-class/style props; the keys are listed in `dynamic_props`
        const PROPS = 1 << 3;
        /// Props with dynamic keys; full diff required
        const FULL_PROPS = 1 << 4;
        /// Element with event listeners needing hydration attachment
        const NEED_HYDRATION = 1 << 5;
        /// Fragment whose children order never changes
        const STABLE_FRAGMENT = 1 << 6;
        /// Fragment with keyed or partially keyed children
        const KEYED_FRAGMENT = 1 << 7;
        /// Fragment with unkeyed children
        const UNKEYED_FRAGMENT = 1 << 8;
        /// Element needing non-props patching (ref, directives)
        const NEED_PATCH = 1 << 9;
        /// Component with dynamic slots
        const DYNAMIC_SLOTS = 1 << 10;
    }
}

impl PatchFlags {
    /// Hoisted static vnode. Sentinel, compare with `==`.
    pub const HOISTED: PatchFlags = PatchFlags::from_bits_retain(-1);
    /// Diff algorithm should bail out of optimized mode. Sentinel.
    pub const BAIL: PatchFlags = PatchFlags::from_bits_retain(-2);

    /// True for the non-bitmask sentinels.
    pub fn is_sentinel(self) -> bool {
        self.bits() < 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_bits() {
        assert_eq!(PatchFlags::TEXT.bits(), 1);
        assert_eq!(PatchFlags::STABLE_FRAGMENT.bits(), 64);
        assert_eq!(PatchFlags::HOISTED.bits(), -1);
        assert!(PatchFlags::HOISTED.is_sentinel());
        assert!(!(PatchFlags::CLASS | PatchFlags::STYLE).is_sentinel());
    }
}
