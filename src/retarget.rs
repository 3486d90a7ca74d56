// SPDX-License-Identifier: CC0-1.0

//! Difficulty retargeting.
//!
//! Every block is retargeted with a gravity-well filter: an incremental mean of the recent
//! same-algorithm difficulties, rescaled by how far actual block production drifted from the
//! target spacing. The averaging window grows one block at a time and is cut short as soon as
//! enough blocks have been seen *and* the drift leaves an acceptance band that tightens as
//! the window grows, so the filter reacts quickly to hash rate swings while staying smooth
//! under steady conditions.
//!
//! The arithmetic below is consensus critical. Window bounds and the mean divisor count every
//! record visited on the walk, including blocks of other algorithms; an implementation that
//! counts only matching blocks computes different difficulties and forks.

use crate::block::{Algo, Chain};
use crate::params::Params;
use crate::pow::{CompactTarget, Target};

/// Target spacing between blocks of one algorithm, in seconds.
///
/// The window constants are anchored to the original mainnet schedule and are part of the
/// consensus rules on every network; they deliberately do not read [`Params`].
const TARGET_SPACING: i64 = 60;
/// Shortest averaging window, a quarter of a day.
const PAST_SECONDS_MIN: i64 = 60 * 60 * 24 / 4;
/// Longest averaging window, a full week.
const PAST_SECONDS_MAX: i64 = 60 * 60 * 24 * 7;
/// Shortest window in blocks (360).
const PAST_BLOCKS_MIN: u64 = (PAST_SECONDS_MIN / TARGET_SPACING) as u64;
/// Longest window in blocks (10080).
const PAST_BLOCKS_MAX: u64 = (PAST_SECONDS_MAX / TARGET_SPACING) as u64;

/// Computes the required difficulty for the block that would extend the chain at `prev`
/// with a block mined by `algo`.
///
/// `prev` is the arena position of the new block's parent, or `None` when mining on an
/// empty chain. Retargeting never fails: whenever there is not enough same-algorithm
/// history (fewer than 360 blocks of `algo`, or the most recent one is a genesis block),
/// the algorithm's proof of work limit is returned.
pub fn next_work_required(
    chain: &Chain,
    prev: Option<usize>,
    algo: Algo,
    params: &Params,
) -> CompactTarget {
    let limit = params.pow_limit(algo);

    let prev_pos = match prev {
        Some(pos) => pos,
        None => return limit.to_compact_lossy(),
    };
    let tip_pos = match chain.last_index_for_algo(prev_pos, algo) {
        Some(pos) => pos,
        None => return limit.to_compact_lossy(),
    };
    let tip = chain.get(tip_pos).expect("last_index_for_algo returns in-bounds positions");

    // First walk: count the algorithm's blocks inside the longest window. The bound applies
    // to the overall visitation ordinal, not to the matching count.
    let mut algo_count: u64 = 0;
    for (i, _, record) in chain.ancestors_for_algo(tip_pos, algo) {
        if record.height == 0 || i > PAST_BLOCKS_MAX {
            break;
        }
        algo_count += 1;
    }

    if tip.height == 0 || u64::from(tip.height) < PAST_BLOCKS_MIN || algo_count < PAST_BLOCKS_MIN {
        return limit.to_compact_lossy();
    }

    // Second walk: incremental mean of the difficulties, watching the production rate.
    let mut mass: u64 = 0;
    let mut avg = Target::ZERO;
    let mut avg_prev = Target::ZERO;
    let mut latest_time = i64::from(tip.time);
    let mut actual_seconds: i64 = 0;
    let mut target_seconds: i64 = 0;

    for (i, _, record) in chain.ancestors_for_algo(tip_pos, algo) {
        if record.height == 0 || i > algo_count {
            break;
        }
        mass += 1;

        let difficulty = Target::from(record.bits);
        avg = if i == 1 {
            difficulty
        } else if difficulty > avg_prev {
            avg_prev + (difficulty - avg_prev) / i
        } else {
            avg_prev - (avg_prev - difficulty) / i
        };
        avg_prev = avg;

        // Timestamps are miner-controlled and need not be monotonic; measure from the
        // latest one seen so the elapsed time never goes negative.
        let time = i64::from(record.time);
        if time > latest_time {
            latest_time = time;
        }
        actual_seconds = latest_time - time;
        target_seconds = TARGET_SPACING * mass as i64;

        let mut ratio = 1.0;
        if actual_seconds < 1 {
            actual_seconds = 1;
        }
        if actual_seconds != 0 && target_seconds != 0 {
            ratio = target_seconds as f64 / actual_seconds as f64;
        }

        // The acceptance band narrows as the window grows; once enough blocks are in the
        // mean, a drift outside the band ends the window early.
        let deviation = 1.0 + 0.7084 * (mass as f64 / 144.0).powf(-1.228);
        let deviation_fast = deviation;
        let deviation_slow = 1.0 / deviation;

        if mass >= PAST_BLOCKS_MIN && (ratio <= deviation_slow || ratio >= deviation_fast) {
            break;
        }
    }

    // Rescale the mean by the measured drift, full precision, then clamp to the limit.
    let mut new_target = avg;
    if actual_seconds != 0 && target_seconds != 0 {
        new_target = new_target.mul_div(actual_seconds as u64, target_seconds as u64);
    }
    if new_target > limit {
        new_target = limit;
    }

    new_target.to_compact_lossy()
}
