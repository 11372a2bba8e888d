//! This module defines the constants that determine the shape of the
//! authenticated tree and its wire format.

use alloy_primitives::B256;

/// Width of every digest, nonce, salt and lookup index, in bytes.
pub const HASH_SIZE: usize = B256::len_bytes();

/// Number of addressable bits in a lookup index, which is also the maximum
/// depth of the prefix tree.
pub const INDEX_BITS: usize = HASH_SIZE * 8;

/// Domain separation tag mixed into the hash of every empty branch.
pub const EMPTY_BRANCH_TAG: u8 = b'E';

/// Domain separation tag mixed into the hash of every user leaf.
pub const LEAF_TAG: u8 = b'L';

/// Serialization tag for interior nodes. Interior nodes never carry a
/// domain tag in their hash (they hash their children only), so this tag
/// exists purely for the node stream.
pub const INTERIOR_TAG: u8 = b'I';

/// Version byte leading every serialized recorder. Bumped whenever the
/// container layout changes incompatibly.
pub const FORMAT_VERSION: u8 = 0x01;
