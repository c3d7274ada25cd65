use crate::blockchain::core::block::Block;
use crate::blockchain::core::state::StakeRegistry;
use crate::error::ChainError;

/// Checks that `block` extends `previous_block` and that its stored hash is
/// the hash of its own contents.
///
/// Beyond the hash link, `block.index` must be exactly `previous_block.index + 1`;
/// a block with a correct link and hash but a skipped or repeated index is rejected.
pub fn validate_block_linkage(block: &Block, previous_block: &Block) -> Result<(), ChainError> {
    if block.previous_hash != previous_block.hash {
        return Err(ChainError::InvalidBlockLinkage);
    }

    if block.index != previous_block.index + 1 {
        return Err(ChainError::InvalidBlock(format!(
            "Invalid block index. Expected {}, but got {}.",
            previous_block.index + 1,
            block.index
        )));
    }

    let expected_hash = block.recompute_hash()?;
    if expected_hash != block.hash {
        return Err(ChainError::InvalidBlock(format!(
            "Block hash mismatch. Expected {}, but got {}.",
            expected_hash, block.hash
        )));
    }

    Ok(())
}

pub fn is_block_valid(block: &Block, previous_block: &Block) -> bool {
    validate_block_linkage(block, previous_block).is_ok()
}

/// Rejects blocks produced by an identity that never staked.
pub fn validate_validator_eligibility(
    block: &Block,
    stakes: &StakeRegistry,
) -> Result<(), ChainError> {
    if !stakes.contains(&block.validator) {
        return Err(ChainError::InvalidBlock(format!(
            "Validator {} is not a registered staker",
            block.validator
        )));
    }
    Ok(())
}

/// Validates every adjacent pair from index 1 to the tip. The genesis block
/// itself is not re-checked.
pub fn validate_chain_linkage(chain: &[Block]) -> Result<(), ChainError> {
    for pair in chain.windows(2) {
        validate_block_linkage(&pair[1], &pair[0])?;
    }
    Ok(())
}
