//! Content hashing (blake3) for asset identities.

mod hash;

pub use hash::hash_file;
