// SPDX-License-Identifier: CC0-1.0

//! The per-block data the consensus engine reads.
//!
//! This module defines the [`Algo`] tag identifying which hash function mined a block, the
//! [`BlockIndex`] record summarizing a stored header, and the [`Chain`] arena the retargeting
//! and validation functions walk backward through.
//!
//! The crate does not store or deserialize blocks; the node's storage layer appends a
//! [`BlockIndex`] per accepted header and hands the [`Chain`] to the consensus functions.

use core::fmt;

use hashes::{hash_newtype, sha256d};

use crate::pow::CompactTarget;

hash_newtype! {
    /// A block hash, the double SHA-256 digest of the block header.
    ///
    /// This is the block's identity on the wire regardless of which algorithm mined it;
    /// scrypt only decides proof-of-work validity.
    pub struct BlockHash(pub sha256d::Hash);
}

/// Mask of the block version bits that select the proof-of-work algorithm.
const VERSION_ALGO_BITS: i32 = 7 << 9;
/// Version bits marking a scrypt-mined block.
const VERSION_ALGO_SCRYPT: i32 = 1 << 9;

/// Identifies the hash algorithm that mined a block.
///
/// The discriminants are fixed; they index per-algorithm arrays such as
/// [`Params::pow_limit`](crate::params::Params).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Algo {
    /// Double SHA-256, the default algorithm.
    Sha256d = 0,
    /// Scrypt (the litecoin parametrization).
    Scrypt = 1,
}

impl Algo {
    /// The number of supported algorithms.
    pub const COUNT: usize = 2;

    /// Extracts the algorithm tag from a block version field.
    ///
    /// Version values carrying unassigned algorithm bits decode as sha256d, which is what
    /// the network has always done with them.
    pub fn from_version(version: i32) -> Algo {
        match version & VERSION_ALGO_BITS {
            VERSION_ALGO_SCRYPT => Algo::Scrypt,
            _ => Algo::Sha256d,
        }
    }
}

impl fmt::Display for Algo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match *self {
            Algo::Sha256d => "sha256d",
            Algo::Scrypt => "scrypt",
        };
        f.write_str(s)
    }
}

/// A stored block header summarized down to the fields consensus reads.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockIndex {
    /// Height of the block in the chain, zero for genesis.
    pub height: u32,
    /// Block timestamp as claimed by the miner, in seconds since the epoch.
    pub time: u32,
    /// The difficulty target committed to in the header.
    pub bits: CompactTarget,
    /// The algorithm that mined the block.
    pub algo: Algo,
    /// Arena position of the parent record, `None` only for a chain root.
    pub prev: Option<usize>,
}

/// An append-only arena of [`BlockIndex`] records.
///
/// Records are never mutated after [`push`] and a record's back-reference always points at an
/// earlier position, so every backward walk terminates and never cycles. Side branches may
/// share ancestors; the consensus functions take a starting position and follow `prev` links,
/// they never assume the arena is a single chain.
///
/// [`push`]: Chain::push
#[derive(Clone, Debug, Default)]
pub struct Chain {
    records: Vec<BlockIndex>,
}

impl Chain {
    /// Creates an empty arena.
    pub fn new() -> Self { Chain { records: Vec::new() } }

    /// Appends a record, returning its arena position.
    ///
    /// # Panics
    ///
    /// If the record's back-reference points at a position that has not been appended yet
    /// (which includes pointing at itself).
    pub fn push(&mut self, record: BlockIndex) -> usize {
        if let Some(prev) = record.prev {
            assert!(prev < self.records.len(), "back-reference to a record that does not exist");
        }
        self.records.push(record);
        self.records.len() - 1
    }

    /// Returns the record at `pos`.
    pub fn get(&self, pos: usize) -> Option<&BlockIndex> { self.records.get(pos) }

    /// The number of records in the arena.
    pub fn len(&self) -> usize { self.records.len() }

    /// Returns true if the arena holds no records.
    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    /// Position of the most recently appended record.
    pub fn tip(&self) -> Option<usize> { self.records.len().checked_sub(1) }

    /// Iterates backward over the record at `start` and its ancestors.
    ///
    /// Yields nothing if `start` is out of bounds.
    pub fn ancestors(&self, start: usize) -> Ancestors<'_> {
        let cursor = if start < self.records.len() { Some(start) } else { None };
        Ancestors { chain: self, cursor }
    }

    /// Iterates backward over the ancestors of `start` (inclusive) mined by `algo`.
    ///
    /// Each item carries the record's 1-based ordinal within the *unfiltered* walk. The
    /// retargeting arithmetic divides by that ordinal, so it counts skipped records of other
    /// algorithms too; see [`next_work_required`](crate::retarget::next_work_required).
    pub fn ancestors_for_algo(&self, start: usize, algo: Algo) -> AlgoAncestors<'_> {
        AlgoAncestors { inner: self.ancestors(start), algo, visited: 0 }
    }

    /// Finds the most recent record mined by `algo`, walking backward from `start` (inclusive).
    ///
    /// A matching root record is returned like any other; callers that must not retarget off
    /// a genesis block check the record's height themselves.
    pub fn last_index_for_algo(&self, start: usize, algo: Algo) -> Option<usize> {
        self.ancestors(start).find(|(_, record)| record.algo == algo).map(|(pos, _)| pos)
    }
}

/// Backward iterator over a chain of records, created by [`Chain::ancestors`].
///
/// Yields `(arena position, record)` pairs.
pub struct Ancestors<'c> {
    chain: &'c Chain,
    cursor: Option<usize>,
}

impl<'c> Iterator for Ancestors<'c> {
    type Item = (usize, &'c BlockIndex);

    fn next(&mut self) -> Option<Self::Item> {
        let pos = self.cursor?;
        // In bounds: `push` validates back-references and `ancestors` the start position.
        let record = &self.chain.records[pos];
        self.cursor = record.prev;
        Some((pos, record))
    }
}

/// Backward iterator over same-algorithm records, created by [`Chain::ancestors_for_algo`].
///
/// Yields `(unfiltered ordinal, arena position, record)` triples; the ordinal is 1-based and
/// advances on every visited record, matching or not.
pub struct AlgoAncestors<'c> {
    inner: Ancestors<'c>,
    algo: Algo,
    visited: u64,
}

impl<'c> Iterator for AlgoAncestors<'c> {
    type Item = (u64, usize, &'c BlockIndex);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (pos, record) = self.inner.next()?;
            self.visited += 1;
            if record.algo == self.algo {
                return Some((self.visited, pos, record));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(height: u32, algo: Algo, prev: Option<usize>) -> BlockIndex {
        BlockIndex {
            height,
            time: 1_500_000_000 + height * 60,
            bits: CompactTarget::from_consensus(0x1e0f_fff0),
            algo,
            prev,
        }
    }

    #[test]
    fn algo_from_version() {
        assert_eq!(Algo::from_version(0), Algo::Sha256d);
        assert_eq!(Algo::from_version(2), Algo::Sha256d);
        assert_eq!(Algo::from_version(1 << 9), Algo::Scrypt);
        assert_eq!(Algo::from_version(2 | 1 << 9), Algo::Scrypt);
        // Unassigned algorithm bits decode as sha256d.
        assert_eq!(Algo::from_version(2 << 9), Algo::Sha256d);
        assert_eq!(Algo::from_version(7 << 9), Algo::Sha256d);
    }

    #[test]
    fn algo_display() {
        assert_eq!(Algo::Sha256d.to_string(), "sha256d");
        assert_eq!(Algo::Scrypt.to_string(), "scrypt");
    }

    #[test]
    fn ancestors_walks_to_root() {
        let mut chain = Chain::new();
        let a = chain.push(record(0, Algo::Sha256d, None));
        let b = chain.push(record(1, Algo::Scrypt, Some(a)));
        let c = chain.push(record(2, Algo::Sha256d, Some(b)));

        let heights: Vec<u32> = chain.ancestors(c).map(|(_, r)| r.height).collect();
        assert_eq!(heights, vec![2, 1, 0]);

        assert_eq!(chain.ancestors(99).count(), 0);
    }

    #[test]
    fn ancestors_follows_side_branch() {
        let mut chain = Chain::new();
        let a = chain.push(record(0, Algo::Sha256d, None));
        let b = chain.push(record(1, Algo::Sha256d, Some(a)));
        let _c = chain.push(record(2, Algo::Sha256d, Some(b)));
        // A competing block at height 2.
        let c2 = chain.push(record(2, Algo::Scrypt, Some(b)));

        let positions: Vec<usize> = chain.ancestors(c2).map(|(pos, _)| pos).collect();
        assert_eq!(positions, vec![c2, b, a]);
    }

    #[test]
    fn ancestors_for_algo_ordinals_count_every_record() {
        let mut chain = Chain::new();
        let mut prev = None;
        for height in 0..6 {
            let algo = if height % 2 == 0 { Algo::Sha256d } else { Algo::Scrypt };
            prev = Some(chain.push(record(height, algo, prev)));
        }

        // Walking from the scrypt tip at height 5: scrypt records sit at ordinals 1, 3, 5.
        let got: Vec<(u64, u32)> =
            chain.ancestors_for_algo(5, Algo::Scrypt).map(|(i, _, r)| (i, r.height)).collect();
        assert_eq!(got, vec![(1, 5), (3, 3), (5, 1)]);
    }

    #[test]
    fn last_index_for_algo_is_inclusive() {
        let mut chain = Chain::new();
        let a = chain.push(record(0, Algo::Sha256d, None));
        let b = chain.push(record(1, Algo::Scrypt, Some(a)));
        let c = chain.push(record(2, Algo::Sha256d, Some(b)));

        assert_eq!(chain.last_index_for_algo(c, Algo::Sha256d), Some(c));
        assert_eq!(chain.last_index_for_algo(c, Algo::Scrypt), Some(b));
        assert_eq!(chain.last_index_for_algo(b, Algo::Sha256d), Some(a));
        assert_eq!(chain.last_index_for_algo(a, Algo::Scrypt), None);
    }

    #[test]
    #[should_panic]
    fn push_rejects_forward_reference() {
        let mut chain = Chain::new();
        chain.push(record(0, Algo::Sha256d, Some(0)));
    }
}
