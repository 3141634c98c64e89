//! Address decomposition and cache geometry.
//!
//! A memory address enters the simulator as a string of binary digits and is
//! sliced into tag, index, and offset fields according to the active
//! organization. Tags are kept as bit strings and compared for equality
//! only, never arithmetically, so the widest configurations need no numeric
//! representation.

use serde::Serialize;

use crate::config::{CacheConfig, Organization};
use crate::error::SimError;

/// Derived bit-level shape of a cache configuration.
///
/// Constructing a geometry performs the full structural validation of the
/// configuration; every invariant the engine relies on is checked here, so
/// any live `CacheGeometry` is internally consistent and
/// `tag_bits + index_bits + offset_bits == address_bits` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheGeometry {
    /// Total lines in the cache (`cache_size / block_size`).
    pub num_lines: usize,
    /// Number of sets (1 for fully-associative, `num_lines` for direct-mapped).
    pub num_sets: usize,
    /// Ways per set (1 for direct-mapped, `num_lines` for fully-associative).
    pub associativity: usize,
    /// Bits addressing a byte within a block.
    pub offset_bits: usize,
    /// Bits selecting the set (0 for fully-associative).
    pub index_bits: usize,
    /// Remaining leading bits identifying the block.
    pub tag_bits: usize,
    /// Total address width in bits.
    pub address_bits: usize,
}

impl CacheGeometry {
    /// Derives the geometry for a configuration under the given organization,
    /// rejecting any structurally invalid combination.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfiguration`] when sizes are zero or not
    /// powers of two, the associativity does not match the organization, or
    /// the field widths exceed the address width (negative tag width).
    pub fn new(cache: &CacheConfig, mode: Organization) -> Result<Self, SimError> {
        let pow2 = |name: &str, n: usize| -> Result<(), SimError> {
            if n == 0 || !n.is_power_of_two() {
                Err(SimError::config(format!(
                    "{name} must be a nonzero power of two, got {n}"
                )))
            } else {
                Ok(())
            }
        };

        pow2("cache size", cache.cache_size_bytes)?;
        pow2("block size", cache.block_size_bytes)?;
        pow2("associativity", cache.associativity)?;
        if cache.block_size_bytes > cache.cache_size_bytes {
            return Err(SimError::config(format!(
                "block size {} exceeds cache size {}",
                cache.block_size_bytes, cache.cache_size_bytes
            )));
        }

        if cache.write_buffer.size_blocks == 0 || cache.write_buffer.drain_rate_blocks_per_cycle == 0
        {
            return Err(SimError::config(
                "write buffer size and drain rate must be nonzero",
            ));
        }

        let num_lines = cache.cache_size_bytes / cache.block_size_bytes;
        let associativity = cache.associativity;
        match mode {
            Organization::DirectMapped => {
                if associativity != 1 {
                    return Err(SimError::config(format!(
                        "direct-mapped cache requires associativity 1, got {associativity}"
                    )));
                }
            }
            Organization::SetAssociative => {
                if associativity > num_lines || num_lines % associativity != 0 {
                    return Err(SimError::config(format!(
                        "associativity {associativity} does not divide line count {num_lines}"
                    )));
                }
            }
            Organization::FullyAssociative => {
                if associativity != num_lines {
                    return Err(SimError::config(format!(
                        "fully-associative cache requires associativity {num_lines} \
                         (one way per line), got {associativity}"
                    )));
                }
            }
        }

        let num_sets = match mode {
            Organization::FullyAssociative => 1,
            _ => num_lines / associativity,
        };
        let offset_bits = log2(cache.block_size_bytes);
        let index_bits = match mode {
            Organization::FullyAssociative => 0,
            _ => log2(num_sets),
        };
        if index_bits + offset_bits > cache.address_bits {
            return Err(SimError::config(format!(
                "index ({index_bits}) + offset ({offset_bits}) bits exceed the \
                 {}-bit address width (negative tag width)",
                cache.address_bits
            )));
        }
        let tag_bits = cache.address_bits - index_bits - offset_bits;

        Ok(Self {
            num_lines,
            num_sets,
            associativity,
            offset_bits,
            index_bits,
            tag_bits,
            address_bits: cache.address_bits,
        })
    }
}

/// The fields an address decomposes into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessFields {
    /// Leading `tag_bits` of the address, kept as a bit string.
    pub tag: String,
    /// Set (or line) index, parsed from the middle field. 0 when `index_bits == 0`.
    pub index: usize,
    /// Trailing `offset_bits` of the address.
    pub offset: String,
    /// Everything except the offset: the block's addressable payload.
    pub data: String,
}

/// Decomposes a binary address string into `{tag, index, offset, data}`.
///
/// The input is zero-padded on the left to the configured width before
/// slicing, so short inputs are accepted; inputs longer than the address
/// width or containing non-binary characters are rejected.
///
/// # Errors
///
/// Returns [`SimError::InvalidAddress`] for empty input, non-binary digits,
/// or input wider than `geometry.address_bits`.
pub fn decompose(address: &str, geometry: &CacheGeometry) -> Result<AccessFields, SimError> {
    if address.is_empty() {
        return Err(SimError::address(address, "empty address"));
    }
    if let Some(bad) = address.chars().find(|c| *c != '0' && *c != '1') {
        return Err(SimError::address(
            address,
            format!("non-binary character {bad:?}"),
        ));
    }
    if address.len() > geometry.address_bits {
        return Err(SimError::address(
            address,
            format!(
                "{} bits exceed the {}-bit address width",
                address.len(),
                geometry.address_bits
            ),
        ));
    }

    let mut padded = "0".repeat(geometry.address_bits - address.len());
    padded.push_str(address);

    let tag = padded[..geometry.tag_bits].to_string();
    let index = if geometry.index_bits == 0 {
        0
    } else {
        let field = &padded[geometry.tag_bits..geometry.tag_bits + geometry.index_bits];
        // All characters were checked above, so the parse cannot fail.
        usize::from_str_radix(field, 2).unwrap_or(0)
    };
    let offset = padded[geometry.address_bits - geometry.offset_bits..].to_string();
    let data = padded[..geometry.address_bits - geometry.offset_bits].to_string();

    Ok(AccessFields {
        tag,
        index,
        offset,
        data,
    })
}

/// Rebuilds the full padded address from its decomposed fields.
///
/// Inverse of [`decompose`] for already-padded inputs: feeding the result
/// back through `decompose` yields the same triple.
pub fn compose(tag: &str, index: usize, offset: &str, geometry: &CacheGeometry) -> String {
    let mut address = String::with_capacity(geometry.address_bits);
    address.push_str(tag);
    if geometry.index_bits > 0 {
        address.push_str(&format!("{index:0width$b}", width = geometry.index_bits));
    }
    address.push_str(offset);
    address
}

/// Base-2 logarithm of a power of two.
fn log2(n: usize) -> usize {
    n.trailing_zeros() as usize
}
