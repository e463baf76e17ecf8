//! Hash Router
//!
//! Maps a key to a shard index. Unsalted and deterministic, so a key stays
//! on the same shard for the lifetime of the process.

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// 32-bit FNV hash (multiply, then xor) over the key bytes.
pub fn fnv32(key: &str) -> u32 {
    key.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        hash.wrapping_mul(FNV_PRIME) ^ u32::from(byte)
    })
}

/// Returns the shard responsible for `key`.
///
/// `shard_count` must be non-zero.
pub fn shard_index(key: &str, shard_count: usize) -> usize {
    fnv32(key) as usize % shard_count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv32_empty_key() {
        assert_eq!(fnv32(""), FNV_OFFSET_BASIS);
    }

    #[test]
    fn test_fnv32_known_value() {
        // 2166136261 * 16777619 mod 2^32, then xor 'a'
        let expected = FNV_OFFSET_BASIS.wrapping_mul(FNV_PRIME) ^ 0x61;
        assert_eq!(fnv32("a"), expected);
    }

    #[test]
    fn test_shard_index_stable() {
        for key in ["alpha", "beta", "user:42", ""] {
            let first = shard_index(key, 1024);
            assert!(first < 1024);
            for _ in 0..10 {
                assert_eq!(shard_index(key, 1024), first);
            }
        }
    }

    #[test]
    fn test_single_shard() {
        assert_eq!(shard_index("anything", 1), 0);
    }

    #[test]
    fn test_keys_spread_across_shards() {
        let used: std::collections::HashSet<usize> = (0..1000)
            .map(|i| shard_index(&format!("key_{}", i), 16))
            .collect();
        assert!(used.len() > 8);
    }
}
