//! 批次校验闸门：任意一行不合法，整批都不提交

use crate::{
    domain::{
        validate, validate_transfer, ChainSet, TransferRequest, ValidatedTransfer,
        ValidationOutcome,
    },
    error::TransferError,
};

/// 逐行校验并返回每一行的结果（不短路）
pub fn validate_rows(rows: &[TransferRequest], chains: &ChainSet) -> Vec<ValidationOutcome> {
    rows.iter().map(|row| validate(row, chains)).collect()
}

/// 全部通过时返回可提交的批次，否则返回 `ValidationGateFailed`
pub fn validate_batch(
    rows: &[TransferRequest],
    chains: &ChainSet,
) -> Result<Vec<ValidatedTransfer>, TransferError> {
    let checked: Vec<Result<ValidatedTransfer, ValidationOutcome>> = rows
        .iter()
        .map(|row| validate_transfer(row, chains))
        .collect();

    if checked.iter().all(Result::is_ok) {
        return Ok(checked.into_iter().flatten().collect());
    }

    let outcomes = checked
        .into_iter()
        .map(|result| result.err().unwrap_or(ValidationOutcome::Valid))
        .collect();
    Err(TransferError::ValidationGateFailed { outcomes })
}
