//! Instruction planning and ordering validation
//!
//! Builds the instruction list for burn/transfer transactions in the
//! required order:
//! 1. Compute budget instructions (CU limit, priority fee)
//! 2. Core token instruction (burn or transfer)
//!
//! Budget instructions must precede the instruction they budget for.

use crate::tx_builder::errors::TransactionBuilderError;
use solana_sdk::{
    compute_budget::ComputeBudgetInstruction, instruction::Instruction, pubkey::Pubkey,
};
use spl_associated_token_account::get_associated_token_address;

/// Ordered instruction list for a transaction
#[derive(Debug, Clone)]
pub struct InstructionPlan {
    pub instructions: Vec<Instruction>,
}

impl InstructionPlan {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }
}

/// Build the spl-token burn instruction for `amount_raw` base units
pub fn burn_instruction(
    wallet: &Pubkey,
    mint: &Pubkey,
    amount_raw: u64,
    decimals: u8,
) -> Result<Instruction, TransactionBuilderError> {
    let token_account = get_associated_token_address(wallet, mint);
    spl_token::instruction::burn_checked(
        &spl_token::id(),
        &token_account,
        mint,
        wallet,
        &[],
        amount_raw,
        decimals,
    )
    .map_err(|e| TransactionBuilderError::instruction_failed("spl-token", e.to_string()))
}

/// Build the spl-token transfer instruction to `recipient`'s token account
pub fn transfer_instruction(
    wallet: &Pubkey,
    recipient: &Pubkey,
    mint: &Pubkey,
    amount_raw: u64,
    decimals: u8,
) -> Result<Instruction, TransactionBuilderError> {
    let source = get_associated_token_address(wallet, mint);
    let destination = get_associated_token_address(recipient, mint);
    spl_token::instruction::transfer_checked(
        &spl_token::id(),
        &source,
        mint,
        &destination,
        wallet,
        &[],
        amount_raw,
        decimals,
    )
    .map_err(|e| TransactionBuilderError::instruction_failed("spl-token", e.to_string()))
}

/// Plan instructions with the budget-before-core ordering.
///
/// `cu_limit` or `micro_lamports` of 0 skips that budget instruction.
pub fn plan_instructions(
    cu_limit: u32,
    micro_lamports: u64,
    core_ix: Instruction,
) -> Result<InstructionPlan, TransactionBuilderError> {
    if core_ix.accounts.is_empty() {
        return Err(TransactionBuilderError::Configuration(
            "Core instruction has no accounts".to_string(),
        ));
    }

    let mut instructions = Vec::with_capacity(3);

    if cu_limit > 0 {
        instructions.push(ComputeBudgetInstruction::set_compute_unit_limit(cu_limit));
    }
    if micro_lamports > 0 {
        instructions.push(ComputeBudgetInstruction::set_compute_unit_price(
            micro_lamports,
        ));
    }
    instructions.push(core_ix);

    Ok(InstructionPlan::new(instructions))
}

/// Validate instruction ordering (debug/test only).
///
/// All compute-budget instructions must come before any other program's
/// instruction. Optimized away in release builds.
#[cfg(debug_assertions)]
pub fn sanity_check_ix_order(
    instructions: &[Instruction],
) -> Result<(), TransactionBuilderError> {
    if instructions.is_empty() {
        return Err(TransactionBuilderError::invalid_order(
            "Instruction list is empty",
        ));
    }

    let budget_id = solana_sdk::compute_budget::id();
    let mut seen_non_budget = false;
    for (idx, ix) in instructions.iter().enumerate() {
        if ix.program_id == budget_id {
            if seen_non_budget {
                return Err(TransactionBuilderError::invalid_order(format!(
                    "Compute budget instruction at position {idx} follows a program instruction"
                )));
            }
        } else {
            seen_non_budget = true;
        }
    }

    if !seen_non_budget {
        return Err(TransactionBuilderError::invalid_order(
            "Transaction has no core instruction",
        ));
    }

    Ok(())
}

/// No-op version for release builds
#[cfg(not(debug_assertions))]
#[inline]
pub fn sanity_check_ix_order(
    _instructions: &[Instruction],
) -> Result<(), TransactionBuilderError> {
    Ok(())
}
