//! Length-limited prefix code construction.
//!
//! Given the occurrence count of every symbol in an alphabet and a maximum
//! code length, the solvers in this crate compute the bit length each symbol
//! should be coded with so that the resulting canonical prefix code is
//! uniquely decodable, no length exceeds the limit, and the total coded size
//! is minimal. This is the package-merge problem of Larmore and Hirschberg,
//! the standard way DEFLATE-style coders cap their Huffman codes at 15 bits.
//!
//! Three solvers share one contract and produce bit-identical results:
//!
//! * [`natural`] materialises every merge stage. Simple, and the reference
//!   the other two are checked against, but it keeps O(n·L) nodes alive.
//! * [`lazy`] builds elements on demand, recycling consumed package trees
//!   through a fixed pool, so only a handful of nodes are live at a time.
//! * [`boundary`] never builds package trees at all; each element is a
//!   three-word chain node and live memory is O(L²) regardless of the
//!   alphabet size. This is the one to use.
//!
//! A frequency of zero means "symbol not present"; such symbols get length
//! zero. When more symbols are in use than `2^max_bits` distinct codes can
//! exist, no valid assignment exists and the solvers return an empty vector.
//! Length limits from 1 to 63 bits are supported.

#![no_std]

#[macro_use]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

#[cfg(not(feature = "std"))]
macro_rules! trace {
    ($($tt:tt)*) => {};
}

pub mod boundary;
pub mod lazy;
pub mod natural;
mod pool;
mod symbols;

#[cfg(test)]
mod proptests;

pub use symbols::is_impossible_coding;

use alloc::vec::Vec;

/// Calculates the bit lengths for a length-limited Huffman code over the
/// given symbol frequencies, using the most economical solver.
pub fn length_limited_code_lengths(frequencies: &[u32], max_bits: usize) -> Vec<u32> {
    boundary::code_lengths(frequencies, max_bits)
}
