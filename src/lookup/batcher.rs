//! Fixed-size batching of addresses

use crate::lookup::models::Address;

/// Ordered group of addresses looked up together
pub type Batch = Vec<Address>;

/// Split `addresses` into contiguous batches of at most `size` elements
///
/// # Panics
///
/// Panics if `size` is zero.
pub fn chunk(addresses: &[Address], size: usize) -> Vec<Batch> {
    assert!(size > 0, "batch size must be positive");
    addresses.chunks(size).map(<[Address]>::to_vec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationPolicy;

    fn addresses(n: usize) -> Vec<Address> {
        (0..n)
            .map(|i| {
                Address::parse(&format!("10.0.{}.{}", i / 256, i % 256), ValidationPolicy::Strict)
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_chunk_sizes() {
        let input = addresses(25);
        let batches = chunk(&input, 10);
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![10, 10, 5]);
    }

    #[test]
    fn test_chunk_preserves_order() {
        for (n, size) in [(1, 1), (7, 3), (10, 10), (11, 10), (30, 4)] {
            let input = addresses(n);
            let batches = chunk(&input, size);
            assert_eq!(batches.len(), n.div_ceil(size));
            assert!(batches[..batches.len() - 1].iter().all(|b| b.len() == size));
            let flattened: Vec<Address> = batches.into_iter().flatten().collect();
            assert_eq!(flattened, input);
        }
    }

    #[test]
    fn test_chunk_empty() {
        assert!(chunk(&[], 10).is_empty());
    }

    #[test]
    #[should_panic(expected = "batch size must be positive")]
    fn test_chunk_zero_size() {
        chunk(&addresses(3), 0);
    }
}
