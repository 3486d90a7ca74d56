// SPDX-License-Identifier: CC0-1.0

//! Consensus parameters.
//!
//! This module provides a predefined set of parameters for different chains, the subset that
//! the proof-of-work and retargeting rules consume.

use hashes::Hash;

use crate::block::{Algo, BlockHash};
use crate::pow::Target;

/// The chains the crate knows parameters for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Network {
    /// The production network.
    Mainnet,
    /// The public test network.
    Testnet,
    /// A local network for integration tests.
    Regtest,
}

/// Hash of the airdrop block, exempt from the proof of work check on every network.
///
/// Bytes are in internal (reversed) order; the displayed hash is
/// `0000f09aa1598d2d5a2ea7eab61153a8e24641da3b8a4f0404f0bebd57f7bc10`.
#[rustfmt::skip]
const AIRDROP_BLOCK: [u8; 32] = [
    0x10, 0xbc, 0xf7, 0x57, 0xbd, 0xbe, 0xf0, 0x04,
    0x04, 0x4f, 0x8a, 0x3b, 0xda, 0x41, 0x46, 0xe2,
    0xa8, 0x53, 0x11, 0xb6, 0xea, 0xa7, 0x2e, 0x5a,
    0x2d, 0x8d, 0x59, 0xa1, 0x9a, 0xf0, 0x00, 0x00,
];

/// Parameters that influence chain consensus.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Params {
    /// Network for which parameters are valid.
    pub network: Network,
    /// Proof of work limit per algorithm, indexed by the [`Algo`] discriminant.
    ///
    /// This is the highest (easiest) target a block may commit to. The value here is full
    /// precision; encoding it compact rounds down.
    pub pow_limit: [Target; Algo::COUNT],
    /// Expected amount of time between blocks of one algorithm, in seconds.
    pub pow_target_spacing: u64,
    /// Expected amount of time to mine one averaging window, in seconds.
    pub pow_target_timespan: u64,
    /// Hash of the block whose proof of work is never checked.
    pub airdrop_block_hash: BlockHash,
    /// Skip the proof of work check entirely. Never set on a built-in network; test
    /// harnesses flip it to accept arbitrary hashes.
    pub skip_pow_check: bool,
    /// Determines whether minimal difficulty may be used for blocks.
    pub allow_min_difficulty_blocks: bool,
}

impl Params {
    /// Creates parameters set for the given network.
    pub fn new(network: Network) -> Self {
        let airdrop_block_hash = BlockHash::from_byte_array(AIRDROP_BLOCK);
        match network {
            Network::Mainnet => Params {
                network,
                pow_limit: [Target::MAIN_POW_LIMIT; Algo::COUNT],
                pow_target_spacing: 60,
                pow_target_timespan: 10 * 60,
                airdrop_block_hash,
                skip_pow_check: false,
                allow_min_difficulty_blocks: false,
            },
            Network::Testnet => Params {
                network,
                pow_limit: [Target::MAIN_POW_LIMIT; Algo::COUNT],
                pow_target_spacing: 10 * 60,
                pow_target_timespan: 14 * 24 * 60 * 60,
                airdrop_block_hash,
                skip_pow_check: false,
                allow_min_difficulty_blocks: true,
            },
            Network::Regtest => Params {
                network,
                pow_limit: [Target::REGTEST_POW_LIMIT; Algo::COUNT],
                pow_target_spacing: 10 * 60,
                pow_target_timespan: 14 * 24 * 60 * 60,
                airdrop_block_hash,
                skip_pow_check: false,
                allow_min_difficulty_blocks: true,
            },
        }
    }

    /// Returns the proof of work limit for blocks mined with `algo`.
    pub fn pow_limit(&self, algo: Algo) -> Target { self.pow_limit[algo as usize] }
}
