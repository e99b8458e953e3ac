//! Property tests pitting the three solvers against each other and, on
//! small alphabets, against an exhaustive search over every legal
//! assignment.

use alloc::vec::Vec;

use proptest::prelude::*;

use crate::{boundary, lazy, natural};

/// Kraft sum of the assignment, scaled by 2^63 so it stays integral.
fn kraft_numerator(bit_lengths: &[u32]) -> u128 {
    bit_lengths
        .iter()
        .filter(|&&len| len > 0)
        .map(|&len| 1u128 << (63 - len))
        .sum()
}

fn cost(frequencies: &[u32], bit_lengths: &[u32]) -> u64 {
    frequencies
        .iter()
        .zip(bit_lengths)
        .map(|(&freq, &len)| u64::from(freq) * u64::from(len))
        .sum()
}

/// Smallest total coded size over every length assignment that satisfies
/// the Kraft inequality and the length cap. Exponential, so callers keep
/// the alphabet tiny.
fn exhaustive_minimum(frequencies: &[u32], max_bits: usize) -> u64 {
    fn descend(
        frequencies: &[u32],
        max_bits: usize,
        index: usize,
        lengths: &mut Vec<u32>,
        best: &mut u64,
    ) {
        if index == frequencies.len() {
            if kraft_numerator(lengths) <= 1 << 63 {
                let total = cost(frequencies, lengths);
                if total < *best {
                    *best = total;
                }
            }
            return;
        }
        for len in 1..=max_bits as u32 {
            lengths.push(len);
            descend(frequencies, max_bits, index + 1, lengths, best);
            lengths.pop();
        }
    }

    let mut best = u64::MAX;
    descend(frequencies, max_bits, 0, &mut Vec::new(), &mut best);
    best
}

fn check_agreement(frequencies: &[u32], max_bits: usize) -> Result<(), TestCaseError> {
    let reference = natural::code_lengths(frequencies, max_bits);
    prop_assert_eq!(&reference, &lazy::code_lengths(frequencies, max_bits));
    prop_assert_eq!(&reference, &boundary::code_lengths(frequencies, max_bits));

    let used = frequencies.iter().filter(|&&freq| freq > 0).count() as u64;
    if used > 1 << max_bits {
        prop_assert!(reference.is_empty());
        return Ok(());
    }

    prop_assert_eq!(reference.len(), frequencies.len());
    prop_assert!(kraft_numerator(&reference) <= 1 << 63);
    for (&freq, &len) in frequencies.iter().zip(&reference) {
        prop_assert_eq!(freq == 0, len == 0);
        prop_assert!(len as usize <= max_bits);
    }

    // Rarer symbols never get shorter codes than more frequent ones.
    for (i, &a) in frequencies.iter().enumerate() {
        for (j, &b) in frequencies.iter().enumerate() {
            if a > 0 && b > 0 && a <= b {
                prop_assert!(
                    reference[i] >= reference[j],
                    "weights {} <= {} but lengths {} < {}",
                    a,
                    b,
                    reference[i],
                    reference[j]
                );
            }
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn solvers_agree(
        frequencies in prop::collection::vec(0u32..200, 0..40),
        max_bits in 1usize..=9,
    ) {
        check_agreement(&frequencies, max_bits)?;
    }

    #[test]
    fn solvers_agree_under_heavy_ties(
        frequencies in prop::collection::vec(0u32..3, 0..33),
        max_bits in 1usize..=6,
    ) {
        check_agreement(&frequencies, max_bits)?;
    }

    #[test]
    fn assignment_is_optimal(
        frequencies in prop::collection::vec(1u32..50, 2..=6),
        max_bits in 2usize..=4,
    ) {
        prop_assume!(frequencies.len() <= 1 << max_bits);
        let bit_lengths = boundary::code_lengths(&frequencies, max_bits);
        prop_assert_eq!(
            cost(&frequencies, &bit_lengths),
            exhaustive_minimum(&frequencies, max_bits)
        );
    }
}
