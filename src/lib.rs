// SPDX-License-Identifier: CC0-1.0

//! # Multi-algorithm proof-of-work consensus
//!
//! A consensus-critical library for a chain where several hash algorithms compete to extend
//! the same block chain. It provides the difficulty arithmetic ([`Target`], [`Work`], the
//! compact encoding), the per-algorithm gravity-well retargeter, the header proof-of-work
//! check, and the chain work measure used for fork selection.
//!
//! The crate computes over an in-memory view of the block index ([`Chain`]); storing blocks,
//! hashing headers, and mining are the embedding node's business.
//!
//! Bit-for-bit compatibility with the network is the point of this crate: the retargeting
//! arithmetic, including its floating-point steps and its quirks, must not be "fixed".
//!
//! ## Available feature flags
//!
//! * `serde` - (dependency), implements `serde`-based serialization and
//!                 deserialization for the difficulty types.
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
// Coding conventions
#![forbid(unsafe_code)]
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]
#![deny(unused_imports)]
#![deny(missing_docs)]
#![deny(unused_must_use)]

/// Rust implementation of cryptographic hash function algorithms.
pub extern crate hashes;

pub mod block;
pub mod params;
pub mod pow;
pub mod retarget;
pub mod validation;

#[rustfmt::skip]                // Keep public re-exports separate.
#[doc(inline)]
pub use crate::{
    block::{Algo, BlockHash, BlockIndex, Chain},
    params::{Network, Params},
    pow::{CompactTarget, DecodedTarget, Target, Work},
    retarget::next_work_required,
    validation::{block_proof, check_proof_of_work, PowError},
};
