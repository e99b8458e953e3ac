//! Chain-compressed package-merge solver.
//!
//! Packages are never built as trees here. A stage element is a
//! `{weight, count, tail}` triple: `count` is how many of the lightest
//! symbols sit at or before this element on its stage, and `tail` links to
//! the element one stage up that this package covers. A symbol's bit length
//! falls out of the count sequence along the final chain, and live memory
//! is O(L²) however large the alphabet is. Based on the boundary
//! package-merge of Katajainen, Moffat and Turpin.

use alloc::vec::Vec;

#[cfg(feature = "std")]
use log::trace;

use crate::pool::{NodePool, NONE};
use crate::symbols::{prepare, Leaf, Setup};

/// Stage element. `tail` indexes the solver pool; `NONE` ends a chain.
#[derive(Copy, Clone)]
struct ChainNode {
    weight: u64,
    count: usize,
    tail: u32,
}

impl Default for ChainNode {
    fn default() -> Self {
        ChainNode {
            weight: 0,
            count: 0,
            tail: NONE,
        }
    }
}

/// Look-ahead pair of one stage, as pool indices. `second` goes to `NONE`
/// for good once the stage can no longer form a pair.
#[derive(Copy, Clone)]
struct Pair {
    elements: [u32; 2],
}

impl Pair {
    fn first(&self) -> u32 {
        self.elements[0]
    }

    fn second(&self) -> u32 {
        self.elements[1]
    }

    fn is_spent(&self) -> bool {
        self.second() == NONE
    }
}

struct Solver<'a> {
    leaves: &'a [Leaf],
    pool: NodePool<ChainNode>,
    look: Vec<Pair>,
    /// Rightmost element chosen so far on the bottom stage, which is never
    /// materialised.
    chain: ChainNode,
    /// Count sequence of the chain hanging off `chain`, captured whenever
    /// the bottom stage takes a package. The pool sweep only keeps
    /// look-ahead chains alive, so this is read while the pair still pins
    /// every node of it; by extraction time the slots may be recycled.
    tail_counts: Vec<usize>,
}

impl<'a> Solver<'a> {
    fn new(leaves: &'a [Leaf], max_bits: usize) -> Self {
        // Each of the max_bits-1 look-ahead slots holds a chain of at most
        // stage+1 nodes; summed over the stages and doubled for the pair
        // that is L(L-1), the high-water mark the pool must cover.
        let mut pool = NodePool::new(max_bits * (max_bits - 1));

        let mut look = Vec::with_capacity(max_bits - 1);
        for _ in 0..max_bits - 1 {
            let first = pool.borrow().expect("chain node pool exhausted");
            pool.set(
                first,
                ChainNode {
                    weight: leaves[0].weight,
                    count: 1,
                    tail: NONE,
                },
            );
            let second = pool.borrow().expect("chain node pool exhausted");
            pool.set(
                second,
                ChainNode {
                    weight: leaves[1].weight,
                    count: 2,
                    tail: NONE,
                },
            );
            look.push(Pair {
                elements: [first, second],
            });
        }

        Solver {
            leaves,
            pool,
            look,
            chain: ChainNode {
                weight: leaves[1].weight,
                count: 2,
                tail: NONE,
            },
            tail_counts: Vec::with_capacity(max_bits),
        }
    }

    fn pair_weight(&self, pair: Pair) -> u64 {
        self.pool.get(pair.first()).weight + self.pool.get(pair.second()).weight
    }

    fn package(&self, pair: Pair, count: usize) -> ChainNode {
        ChainNode {
            weight: self.pair_weight(pair),
            count,
            tail: pair.second(),
        }
    }

    /// Builds the element that follows `before` on the stage fed by `pair`:
    /// the next unused symbol or the look-ahead package, whichever is
    /// lighter. Equal weights go to the package. Also reports whether the
    /// pair was consumed, which is what obliges a restock.
    fn choose_next(&self, pair: Pair, before: ChainNode) -> (ChainNode, bool) {
        let next_symbol = before.count;
        if next_symbol >= self.leaves.len() {
            assert!(!pair.is_spent(), "element demanded from a spent stage");
            return (self.package(pair, next_symbol), true);
        }

        let symbol_weight = self.leaves[next_symbol].weight;
        if pair.is_spent() || symbol_weight < self.pair_weight(pair) {
            // A lone symbol extends the stage without touching the stage
            // above, so it carries the previous element's chain forward.
            let node = ChainNode {
                weight: symbol_weight,
                count: next_symbol + 1,
                tail: before.tail,
            };
            (node, false)
        } else {
            (self.package(pair, next_symbol), true)
        }
    }

    /// Claims a pool slot for `node`, collecting garbage first if the pool
    /// has run dry.
    fn allocate(&mut self, node: ChainNode) -> u32 {
        let index = match self.pool.borrow() {
            Some(index) => index,
            None => self.sweep(),
        };
        self.pool.set(index, node);
        index
    }

    /// In-arena mark-sweep: clear every borrow flag, re-mark the chains
    /// still reachable from the look-ahead pairs, then claim one of the
    /// freed slots.
    fn sweep(&mut self) -> u32 {
        trace!("chain node pool exhausted, re-marking reachable chains");
        self.pool.release_all();
        for stage in 0..self.look.len() {
            for slot in 0..2 {
                self.mark_chain(self.look[stage].elements[slot]);
            }
        }
        self.pool
            .borrow()
            .expect("chain node pool exhausted beyond recovery")
    }

    fn mark_chain(&mut self, mut index: u32) {
        while index != NONE {
            self.pool.mark(index);
            index = self.pool.get(index).tail;
        }
    }

    /// Restocks both look-ahead slots of `stage` after its pair was taken
    /// as a package, recursing upward each time the restock itself takes a
    /// package.
    fn refill(&mut self, stage: usize) {
        if stage == 0 {
            let mut before = self.look[0].second();
            for slot in 0..2 {
                let next_symbol = self.pool.get(before).count;
                if next_symbol >= self.leaves.len() {
                    // Out of symbols for good: a pair can no longer form on
                    // this stage. Poison the remaining slots rather than
                    // leave the consumed elements looking like a pair.
                    for spent in slot..2 {
                        self.look[0].elements[spent] = NONE;
                    }
                    return;
                }
                let node = ChainNode {
                    weight: self.leaves[next_symbol].weight,
                    count: next_symbol + 1,
                    tail: self.pool.get(before).tail,
                };
                // Empty the slot first so a sweep cannot pin the node it
                // still held.
                self.look[0].elements[slot] = NONE;
                self.look[0].elements[slot] = self.allocate(node);
                before = self.look[0].elements[slot];
            }
            return;
        }

        let mut before = self.look[stage].second();
        for slot in 0..2 {
            let (node, took_package) =
                self.choose_next(self.look[stage - 1], *self.pool.get(before));
            self.look[stage].elements[slot] = NONE;
            self.look[stage].elements[slot] = self.allocate(node);
            before = self.look[stage].elements[slot];
            if took_package {
                self.refill(stage - 1);
            }
        }
    }

    /// Records the count sequence of the chain below the current head,
    /// replacing whatever an earlier package pick captured.
    fn snapshot_tail(&mut self) {
        self.tail_counts.clear();
        let mut index = self.chain.tail;
        while index != NONE {
            let node = self.pool.get(index);
            self.tail_counts.push(node.count);
            index = node.tail;
        }
    }

    /// Reads the answer off the final chain: every link bumps the length of
    /// the `count` lightest symbols by one.
    fn extract(&self, bit_lengths: &mut [u32]) {
        for leaf in &self.leaves[..self.chain.count] {
            bit_lengths[leaf.alphabet as usize] += 1;
        }
        for &count in &self.tail_counts {
            for leaf in &self.leaves[..count] {
                bit_lengths[leaf.alphabet as usize] += 1;
            }
        }
    }
}

/// Calculates optimal code lengths for `frequencies` with every length at
/// most `max_bits`, keeping only boundary chains. Returns an empty vector
/// when more than `2^max_bits` symbols are in use.
pub fn code_lengths(frequencies: &[u32], max_bits: usize) -> Vec<u32> {
    let leaves = match prepare(frequencies, max_bits) {
        Setup::Finished(bit_lengths) => return bit_lengths,
        Setup::Leaves(leaves) => leaves,
    };

    let mut solver = Solver::new(&leaves, max_bits);

    // The bottom stage settles on 2n-2 elements; the bootstrap chain stands
    // for the first two.
    let total = 2 * leaves.len() - 2;
    for produced in 2..total {
        let top = solver.look.len() - 1;
        let (next, took_package) = solver.choose_next(solver.look[top], solver.chain);
        solver.chain = next;
        if took_package {
            solver.snapshot_tail();
            if produced + 1 < total {
                solver.refill(top);
            }
        }
    }

    let mut bit_lengths = vec![0u32; frequencies.len()];
    solver.extract(&mut bit_lengths);
    bit_lengths
}
