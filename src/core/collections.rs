//! Collection types used throughout the mesh kernel and algorithms.
//!
//! The aliases here fix the concrete containers in one place: entity arenas
//! ([`StorageMap`]), fast non-cryptographic hash maps and sets, and
//! small-vector buffers sized for typical node degrees.

use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;

#[cfg(not(feature = "dense-slotmap"))]
use slotmap::SlotMap;

#[cfg(feature = "dense-slotmap")]
use slotmap::DenseSlotMap;

use crate::core::mesh::{EdgeKey, HalfedgeKey};

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Arena storage backend for mesh entities.
///
/// `DenseSlotMap` by default (faster iteration), `SlotMap` when built with
/// `--no-default-features`. Both hand out generation-tagged keys, so a key
/// whose entity was removed never aliases a later entity.
///
/// Not exposed in public signatures; the mesh returns iterators instead.
#[cfg(not(feature = "dense-slotmap"))]
pub type StorageMap<K, V> = SlotMap<K, V>;

#[cfg(feature = "dense-slotmap")]
pub type StorageMap<K, V> = DenseSlotMap<K, V>;

// =============================================================================
// HASHED COLLECTIONS
// =============================================================================

/// Optimized `HashMap` using `rustc_hash::FxHasher`.
///
/// Not DoS-resistant; use only with internal keys.
///
/// # Examples
///
/// ```rust
/// use ruppert::core::collections::FastHashMap;
///
/// let mut map: FastHashMap<u64, usize> = FastHashMap::default();
/// map.insert(123, 456);
/// assert_eq!(map.get(&123), Some(&456));
/// ```
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Optimized `HashSet` using `rustc_hash::FxHasher`.
///
/// # Examples
///
/// ```rust
/// use ruppert::core::collections::FastHashSet;
///
/// let mut set: FastHashSet<u32> = FastHashSet::default();
/// assert!(set.insert(7));
/// assert!(!set.insert(7));
/// ```
pub type FastHashSet<T> = FxHashSet<T>;

/// Small-optimized `Vec`: inline storage for up to `N` elements.
///
/// # Examples
///
/// ```rust
/// use ruppert::core::collections::SmallBuffer;
///
/// let mut buffer: SmallBuffer<i32, 8> = SmallBuffer::new();
/// buffer.extend(0..5);
/// assert!(!buffer.spilled());
/// ```
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

/// Inline capacity for per-node half-edge buffers.
///
/// Interior nodes of a quality mesh have degree close to six.
pub const NODE_DEGREE_BUFFER_SIZE: usize = 8;

/// Half-edges around one node.
pub type HalfedgeBuffer = SmallBuffer<HalfedgeKey, NODE_DEGREE_BUFFER_SIZE>;

/// Set of edge keys.
pub type EdgeKeySet = FastHashSet<EdgeKey>;

// =============================================================================
// HELPERS
// =============================================================================

/// Creates a [`FastHashMap`] with pre-allocated capacity.
///
/// # Examples
///
/// ```rust
/// use ruppert::core::collections::fast_hash_map_with_capacity;
///
/// let map = fast_hash_map_with_capacity::<u64, usize>(100);
/// assert!(map.capacity() >= 100);
/// ```
#[must_use]
pub fn fast_hash_map_with_capacity<K, V>(capacity: usize) -> FastHashMap<K, V> {
    FastHashMap::with_capacity_and_hasher(capacity, FxBuildHasher)
}

/// Creates a [`FastHashSet`] with pre-allocated capacity.
#[must_use]
pub fn fast_hash_set_with_capacity<T>(capacity: usize) -> FastHashSet<T> {
    FastHashSet::with_capacity_and_hasher(capacity, FxBuildHasher)
}
