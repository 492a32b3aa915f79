/// Stable 32-bit string hash: `s[0]*31^(n-1) + ... + s[n-1]` over UTF-16
/// code units with wrapping arithmetic.
///
/// Identical across processes and platforms, so shard layouts written by an
/// earlier run stay addressable.
pub fn key_hash(key: &str) -> i32 {
    key.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// Shard index in `[0, shard_count)` for a partition key.
///
/// The remainder keeps the sign of the hash and is then made non-negative,
/// so `i32::MIN` and other negative hashes still land in range.
pub fn resolve(key: &str, shard_count: usize) -> usize {
    debug_assert!(shard_count > 0, "shard count must be positive");
    let n = shard_count.max(1) as i64;
    (i64::from(key_hash(key)) % n).unsigned_abs() as usize
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
