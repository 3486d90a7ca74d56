// SPDX-License-Identifier: CC0-1.0

//! Proof-of-work acceptance and chain work.
//!
//! [`check_proof_of_work`] is the header-level consensus check: the committed target must be
//! well formed and no easier than the algorithm's limit, and the block hash must meet it.
//! [`block_proof`] turns a committed target into the [`Work`] a block contributes to its
//! chain's cumulative total, the quantity chain selection compares.

use core::fmt;

use crate::block::{Algo, BlockHash};
use crate::params::Params;
use crate::pow::{CompactTarget, Target, Work};

/// A proof of work failed validation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum PowError {
    /// The committed target is negative, overflowing, zero, or above the algorithm's
    /// proof of work limit.
    InvalidTarget,
    /// The block hash is numerically above the committed target.
    InsufficientWork,
}

impl fmt::Display for PowError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::PowError::*;

        match *self {
            InvalidTarget => write!(f, "target is out of range for the algorithm"),
            InsufficientWork => write!(f, "block hash does not meet the committed target"),
        }
    }
}

impl std::error::Error for PowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> { None }
}

/// Checks that `hash` satisfies the difficulty committed to in `bits`, and that the committed
/// difficulty is itself legal for blocks mined with `algo`.
///
/// The check is bypassed entirely when the network disables proof of work
/// ([`Params::skip_pow_check`]) or when `hash` is the airdrop block, which was granted a
/// one-time exemption.
pub fn check_proof_of_work(
    hash: BlockHash,
    bits: CompactTarget,
    algo: Algo,
    params: &Params,
) -> Result<(), PowError> {
    if params.skip_pow_check || hash == params.airdrop_block_hash {
        return Ok(());
    }

    let decoded = Target::from_compact(bits);
    if decoded.negative
        || decoded.overflow
        || decoded.target == Target::ZERO
        || decoded.target > params.pow_limit(algo)
    {
        return Err(PowError::InvalidTarget);
    }

    if decoded.target.is_met_by(hash) {
        Ok(())
    } else {
        Err(PowError::InsufficientWork)
    }
}

/// The amount of work a block with the committed target `bits` adds to its chain,
/// `floor(2^256 / (target + 1))`.
///
/// A target that decodes as negative, overflowing, or zero contributes [`Work::ZERO`]; such a
/// block never validates, but forks carrying one must still compare as lighter.
pub fn block_proof(bits: CompactTarget) -> Work {
    let decoded = Target::from_compact(bits);
    if decoded.negative || decoded.overflow || decoded.target == Target::ZERO {
        return Work::ZERO;
    }
    decoded.target.to_work()
}

#[cfg(test)]
mod tests {
    use hashes::Hash;

    use super::*;
    use crate::params::Network;

    fn hash_of(target: Target) -> BlockHash { BlockHash::from_byte_array(target.to_le_bytes()) }

    #[test]
    fn accepts_hash_equal_to_target() {
        let params = Params::new(Network::Mainnet);
        let bits = CompactTarget::from_consensus(0x1d00_ffff);
        let target = Target::from(bits);

        assert_eq!(check_proof_of_work(hash_of(target), bits, Algo::Sha256d, &params), Ok(()));
    }

    #[test]
    fn rejects_hash_above_target() {
        let params = Params::new(Network::Mainnet);
        let bits = CompactTarget::from_consensus(0x1d00_ffff);
        let target = Target::from(bits);
        let one = Target::from(CompactTarget::from_consensus(0x0101_0000));

        assert_eq!(
            check_proof_of_work(hash_of(target + one), bits, Algo::Scrypt, &params),
            Err(PowError::InsufficientWork),
        );
        assert_eq!(check_proof_of_work(hash_of(target - one), bits, Algo::Scrypt, &params), Ok(()));
    }

    #[test]
    fn rejects_malformed_targets() {
        let params = Params::new(Network::Mainnet);
        let hash = BlockHash::from_byte_array([0; 32]); // meets any non-zero target

        // Zero, negative, overflowing, and above-limit encodings in turn.
        for bits in [0x0000_0000_u32, 0x0480_0001, 0xff12_3456, 0x2100_ffff] {
            assert_eq!(
                check_proof_of_work(hash, CompactTarget::from_consensus(bits), Algo::Sha256d, &params),
                Err(PowError::InvalidTarget),
                "nBits {:#x}",
                bits,
            );
        }
    }

    #[test]
    fn limit_is_per_network() {
        // The loosest regtest target is far above the mainnet limit.
        let bits = CompactTarget::from_consensus(0x207f_ffff);
        let hash = BlockHash::from_byte_array([0; 32]);

        let main = Params::new(Network::Mainnet);
        assert_eq!(
            check_proof_of_work(hash, bits, Algo::Scrypt, &main),
            Err(PowError::InvalidTarget)
        );

        let regtest = Params::new(Network::Regtest);
        assert_eq!(check_proof_of_work(hash, bits, Algo::Scrypt, &regtest), Ok(()));
    }

    #[test]
    fn airdrop_block_bypasses_check() {
        let params = Params::new(Network::Mainnet);
        // Absurd bits: negative and overflowing at once.
        let bits = CompactTarget::from_consensus(0xffff_ffff);

        assert_eq!(
            check_proof_of_work(params.airdrop_block_hash, bits, Algo::Sha256d, &params),
            Ok(()),
        );
        assert_eq!(
            check_proof_of_work(params.airdrop_block_hash, bits, Algo::Scrypt, &params),
            Ok(()),
        );
    }

    #[test]
    fn skip_flag_bypasses_check() {
        let mut params = Params::new(Network::Regtest);
        params.skip_pow_check = true;

        let hash = BlockHash::from_byte_array([0xff; 32]);
        let bits = CompactTarget::from_consensus(0x0100_3456); // decodes to zero
        assert_eq!(check_proof_of_work(hash, bits, Algo::Sha256d, &params), Ok(()));
    }

    #[test]
    fn block_proof_known_vector() {
        let work = block_proof(CompactTarget::from_consensus(0x1d00_ffff));
        assert_eq!(
            format!("{:x}", work),
            "0000000000000000000000000000000000000000000000000000000100010001",
        );
    }

    #[test]
    fn block_proof_decreases_as_target_rises() {
        let hard = block_proof(CompactTarget::from_consensus(0x1b00_ffff));
        let mid = block_proof(CompactTarget::from_consensus(0x1c00_ffff));
        let easy = block_proof(CompactTarget::from_consensus(0x1d00_ffff));

        assert!(hard > mid);
        assert!(mid > easy);
        assert!(easy > Work::ZERO);
    }

    #[test]
    fn block_proof_of_malformed_bits_is_zero() {
        for bits in [0x0000_0000_u32, 0x0480_0001, 0xff12_3456, 0x0100_3456] {
            assert_eq!(block_proof(CompactTarget::from_consensus(bits)), Work::ZERO, "{:#x}", bits);
        }
    }

    #[test]
    fn chain_work_accumulates() {
        let a = block_proof(CompactTarget::from_consensus(0x1d00_ffff));
        let b = block_proof(CompactTarget::from_consensus(0x1c00_ffff));
        let total = a + b;
        assert!(total > a && total > b);
        assert_eq!(total - b, a);
    }
}
