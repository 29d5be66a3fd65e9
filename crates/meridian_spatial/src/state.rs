//! Group state and per-camera occlusion state bitmasks.
//!
//! ```text
//! GroupState                     OcclusionState (per camera)
//! ─────────────────────          ──────────────────────────
//! DEAD            0x001          OCCLUDED         0x01  (inherited)
//! DIRTY           0x002          QUERY_PENDING    0x02
//! OBJECT_DIRTY    0x004          ACTIVE_OCCLUSION 0x04
//! GEOM_DIRTY      0x008          DISCARD_QUERY    0x08
//! ALPHA_DIRTY     0x010          EARLY_FAIL       0x10
//! SKIP_FRUSTUM    0x020
//! IMAGE_DIRTY     0x040
//! MESH_DIRTY      0x100
//! NEW_DRAWINFO    0x200
//! ```

use std::ops::{BitAnd, BitOr, BitOrAssign};

macro_rules! bitmask {
    ($(#[$meta:meta])* $name:ident($repr:ty) { $($(#[$fmeta:meta])* $flag:ident = $value:expr;)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name($repr);

        impl $name {
            $($(#[$fmeta])* pub const $flag: Self = Self($value);)*

            /// No bits set.
            pub const EMPTY: Self = Self(0);

            /// Raw bits.
            #[inline]
            #[must_use]
            pub const fn bits(self) -> $repr {
                self.0
            }

            /// True if every bit of `other` is set.
            #[inline]
            #[must_use]
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            /// True if any bit of `other` is set.
            #[inline]
            #[must_use]
            pub const fn intersects(self, other: Self) -> bool {
                self.0 & other.0 != 0
            }

            /// Sets the bits of `other`.
            #[inline]
            pub fn insert(&mut self, other: Self) {
                self.0 |= other.0;
            }

            /// Clears the bits of `other`.
            #[inline]
            pub fn remove(&mut self, other: Self) {
                self.0 &= !other.0;
            }

            /// True if no bit is set.
            #[inline]
            #[must_use]
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }
        }

        impl BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl BitAnd for $name {
            type Output = Self;
            fn bitand(self, rhs: Self) -> Self {
                Self(self.0 & rhs.0)
            }
        }
    };
}

bitmask! {
    /// Lifecycle and dirtiness of a spatial group.
    GroupState(u32) {
        /// Group was pruned; handles to it are stale.
        DEAD = 0x0000_0001;
        /// Bounds need recomputing.
        DIRTY = 0x0000_0002;
        /// Membership changed since the last rebuild.
        OBJECT_DIRTY = 0x0000_0004;
        /// Draw batches need regenerating.
        GEOM_DIRTY = 0x0000_0008;
        /// Alpha ordering needs refreshing.
        ALPHA_DIRTY = 0x0000_0010;
        /// Treat as always inside the frustum.
        SKIP_FRUSTUM_CHECK = 0x0000_0020;
        /// A texture used by the group changed.
        IMAGE_DIRTY = 0x0000_0040;
        /// Meshes need regenerating.
        MESH_DIRTY = 0x0000_0100;
        /// Draw batches were regenerated since last consumed.
        NEW_DRAWINFO = 0x0000_0200;
    }
}

impl GroupState {
    /// State of a freshly created group.
    pub const INITIAL: Self = Self(Self::DIRTY.0 | Self::GEOM_DIRTY.0);
}

bitmask! {
    /// Per-camera occlusion state of a spatial group.
    OcclusionState(u32) {
        /// Hidden by the last completed query.
        OCCLUDED = 0x0001;
        /// A query is in flight.
        QUERY_PENDING = 0x0002;
        /// Group takes part in occlusion testing.
        ACTIVE_OCCLUSION = 0x0004;
        /// Ignore the in-flight query's answer.
        DISCARD_QUERY = 0x0008;
        /// No query could be issued; treat as visible.
        EARLY_FAIL = 0x0010;
    }
}

impl OcclusionState {
    /// Bits a new child group copies from its parent.
    pub const INHERIT_MASK: Self = Self::OCCLUDED;
}

/// How far a group state change propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateMode {
    /// The group alone.
    Single,
    /// The group and every descendant.
    Branch,
    /// The group and descendants, stopping where a descendant already
    /// agrees.
    Diff,
}

/// How far an occlusion state change propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcclusionMode {
    /// The group alone, one camera.
    Single,
    /// The group and every descendant, one camera.
    Branch,
    /// The group and descendants, stopping where a descendant already
    /// agrees, one camera.
    Diff,
    /// The group alone, every camera.
    AllCameras,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = GroupState::INITIAL;
        assert!(state.contains(GroupState::DIRTY));
        assert!(state.contains(GroupState::GEOM_DIRTY));
        assert!(!state.intersects(GroupState::DEAD));
    }

    #[test]
    fn test_insert_remove() {
        let mut state = OcclusionState::EMPTY;
        state.insert(OcclusionState::OCCLUDED | OcclusionState::QUERY_PENDING);
        state.remove(OcclusionState::QUERY_PENDING);

        assert_eq!(state, OcclusionState::INHERIT_MASK);
        assert!((state & OcclusionState::QUERY_PENDING).is_empty());
    }
}
