// SPDX-License-Identifier: CC0-1.0

//! End-to-end retargeting scenarios over realistic chains.

use multipow::{
    next_work_required, Algo, BlockIndex, Chain, CompactTarget, Network, Params, Target,
};

const T0: u32 = 1_500_000_000;

/// Builds a linear chain where the arena position equals the height.
///
/// `spacing_at` returns the number of seconds between a block and its parent, and `algo_at`
/// the algorithm of each block.
fn build_chain(
    blocks: u32,
    spacing_at: impl Fn(u32) -> u32,
    algo_at: impl Fn(u32) -> Algo,
    bits: u32,
) -> Chain {
    let mut chain = Chain::new();
    let mut time = T0;
    for height in 0..=blocks {
        if height > 0 {
            time += spacing_at(height);
        }
        chain.push(BlockIndex {
            height,
            time,
            bits: CompactTarget::from_consensus(bits),
            algo: algo_at(height),
            prev: if height == 0 { None } else { Some(height as usize - 1) },
        });
    }
    chain
}

#[test]
fn constant_spacing_holds_difficulty_steady() {
    let params = Params::new(Network::Mainnet);
    let bits = 0x1e0f_fff0;
    let chain = build_chain(400, |_| 60, |_| Algo::Sha256d, bits);

    let got = next_work_required(&chain, chain.tip(), Algo::Sha256d, &params);

    // The mean stays at the input difficulty; the rescale only sees the one-block
    // difference between a 400 block window and its 399 spacings.
    let want = Target::from(CompactTarget::from_consensus(bits)).mul_div(23_940, 24_000);
    assert_eq!(got, want.to_compact_lossy());
    assert_eq!(got, CompactTarget::from_consensus(0x1e0f_f5b2));

    // Within a quarter percent of the input.
    let b = Target::from(CompactTarget::from_consensus(bits));
    let drift = b - Target::from(got);
    assert!(drift < b.mul_div(1, 256));
}

#[test]
fn fast_tail_raises_difficulty() {
    let params = Params::new(Network::Mainnet);
    let bits = 0x1e0f_fff0;
    // On-schedule for 350 blocks, then 50 blocks arriving twice as fast.
    let chain =
        build_chain(400, |h| if h > 350 { 30 } else { 60 }, |_| Algo::Sha256d, bits);

    let got = next_work_required(&chain, chain.tip(), Algo::Sha256d, &params);

    // Total drift: the full 400 block window took 22440s instead of 24000s.
    let want = Target::from(CompactTarget::from_consensus(bits)).mul_div(22_440, 24_000);
    assert_eq!(got, want.to_compact_lossy());
    assert_eq!(got, CompactTarget::from_consensus(0x1e0e_f5b3));

    // Difficulty increases, meaning the target shrinks.
    assert!(Target::from(got) < Target::from(CompactTarget::from_consensus(bits)));
}

#[test]
fn sustained_burst_exits_window_early() {
    let params = Params::new(Network::Mainnet);
    let bits = 0x1e0f_fff0;
    // Blocks arriving every second; the drift ratio blows straight through the
    // acceptance band the moment the window reaches its minimum size.
    let chain = build_chain(400, |_| 1, |_| Algo::Sha256d, bits);

    let got = next_work_required(&chain, chain.tip(), Algo::Sha256d, &params);

    // Cut off at 360 blocks: 359 seconds of production against a 21600s schedule.
    let want = Target::from(CompactTarget::from_consensus(bits)).mul_div(359, 21_600);
    assert_eq!(got, want.to_compact_lossy());

    // A drastic difficulty hike, but nowhere near zero.
    let b = Target::from(CompactTarget::from_consensus(bits));
    assert!(Target::from(got) < b.mul_div(1, 40));
    assert!(Target::from(got) > Target::ZERO);
}

#[test]
fn sustained_stall_clamps_to_limit() {
    let params = Params::new(Network::Mainnet);
    // Already at the loosest committable difficulty, with blocks ten times late.
    let bits = 0x1e0f_ffff;
    let chain = build_chain(400, |_| 600, |_| Algo::Sha256d, bits);

    let got = next_work_required(&chain, chain.tip(), Algo::Sha256d, &params);
    assert_eq!(got, CompactTarget::from_consensus(0x1e0f_ffff));
}

#[test]
fn algorithms_retarget_independently() {
    let params = Params::new(Network::Mainnet);
    let bits = 0x1e00_ffff;
    // Strictly alternating algorithms at the global 60s spacing, so each algorithm
    // produces a block every 120s.
    let algo_at = |h: u32| if h % 2 == 1 { Algo::Scrypt } else { Algo::Sha256d };
    let chain = build_chain(800, |_| 60, algo_at, bits);

    let got = next_work_required(&chain, chain.tip(), Algo::Scrypt, &params);

    // The walk from the scrypt tip at height 799 visits 799 records of which 400 are
    // scrypt, and the averaging pass is bounded by that count of *visited* records, so
    // only 200 scrypt blocks (heights 799 down to 401) enter the mean: 23880s of
    // production against a 12000s schedule.
    let want = Target::from(CompactTarget::from_consensus(bits)).mul_div(23_880, 12_000);
    assert_eq!(got, want.to_compact_lossy());
    assert_eq!(got, CompactTarget::from_consensus(0x1e01_fd6e));

    // Roughly a halving of difficulty, since scrypt blocks come at half the target rate.
    let b = Target::from(CompactTarget::from_consensus(bits));
    assert!(Target::from(got) > b);
    assert!(Target::from(got) < b * 2);
}

#[test]
fn missing_algo_history_returns_limit() {
    let params = Params::new(Network::Mainnet);
    let bits = 0x1e00_ffff;
    // 250 scrypt blocks among 500 is short of the 360 block minimum.
    let algo_at = |h: u32| if h % 2 == 1 { Algo::Scrypt } else { Algo::Sha256d };
    let chain = build_chain(500, |_| 60, algo_at, bits);

    let got = next_work_required(&chain, chain.tip(), Algo::Scrypt, &params);
    assert_eq!(got, CompactTarget::from_consensus(0x1e0f_ffff));

    // The sha256d side has 251 blocks and is just as short.
    let got = next_work_required(&chain, chain.tip(), Algo::Sha256d, &params);
    assert_eq!(got, CompactTarget::from_consensus(0x1e0f_ffff));
}

#[test]
fn fork_points_retarget_from_their_own_branch() {
    let params = Params::new(Network::Mainnet);
    let bits = 0x1e0f_fff0;
    let mut chain = build_chain(400, |_| 60, |_| Algo::Sha256d, bits);

    // A side block at height 400 whose timestamp lags the main tip by an hour.
    let fork_parent = 399;
    let side = chain.push(BlockIndex {
        height: 400,
        time: T0 + 400 * 60 + 3600,
        bits: CompactTarget::from_consensus(bits),
        algo: Algo::Sha256d,
        prev: Some(fork_parent),
    });

    let main = next_work_required(&chain, Some(400), Algo::Sha256d, &params);
    let branch = next_work_required(&chain, Some(side), Algo::Sha256d, &params);

    // Both retarget off their own tip; the slower branch ends up with a looser target.
    assert!(Target::from(branch) > Target::from(main));
}
