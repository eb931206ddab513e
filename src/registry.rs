use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Mutex;

// ── HashRegistry ──────────────────────────────────────────────────────────────

/// Run-wide registry of the content hashes already written to disk.
///
/// The registry is shared by reference across every page worker. Exactly one
/// caller can claim a given digest for the duration of the run: the membership
/// check and the insert happen under a single lock, so two workers that hash
/// byte-identical images can never both win the claim.
pub struct HashRegistry {
    hashes: Mutex<HashSet<String>>,
}

impl HashRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            hashes: Mutex::new(HashSet::new()),
        }
    }

    /// Claim `digest` for the caller.
    ///
    /// Returns `true` when the digest was not yet present — the caller now
    /// owns it and is responsible for persisting the image. Returns `false`
    /// when another caller claimed it earlier.
    pub fn claim(&self, digest: &str) -> bool {
        let mut hashes = match self.hashes.lock() {
            Ok(guard) => guard,
            // lock poisoning is not fatal here; the set is never torn
            Err(poisoned) => poisoned.into_inner(),
        };
        hashes.insert(digest.to_owned())
    }

    /// Returns `true` when `digest` has already been claimed.
    pub fn contains(&self, digest: &str) -> bool {
        let hashes = match self.hashes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        hashes.contains(digest)
    }

    /// Number of digests claimed so far.
    pub fn len(&self) -> usize {
        let hashes = match self.hashes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        hashes.len()
    }

    /// Returns `true` when nothing has been claimed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HashRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ── Content hashing ───────────────────────────────────────────────────────────

/// Lowercase hex SHA-256 digest of `data`.
///
/// ```
/// let digest = extractimagespdf::content_digest(b"hello world");
/// assert_eq!(digest.len(), 64);
/// assert_eq!(
///     digest,
///     "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
/// );
/// ```
pub fn content_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
