//! Read-name fingerprinting.
//!
//! Records belonging to the same read (mates, supplementary alignments)
//! share a name; the filter joins them on a 64-bit hash of that name
//! instead of storing names. Equal names always collide, which is the
//! point; unequal names colliding is tolerated — the consequence is a
//! rare over-retained read, never a lost one. Full names are deliberately
//! not stored to keep the membership set compact.

use ahash::RandomState;

// Fixed seeds keep fingerprints stable across runs and inputs.
static STATE: RandomState = RandomState::with_seeds(
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
);

/// Hash a read name to its 64-bit fingerprint.
pub fn name_fingerprint(name: &[u8]) -> u64 {
    STATE.hash_one(name)
}
