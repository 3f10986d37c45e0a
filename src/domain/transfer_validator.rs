//! 单行转账校验
//!
//! 只检查链是否受支持、金额是否为有限数值；
//! 金额范围和同链转账是否有意义由执行方决定

use serde::Serialize;

use super::{
    chain::{ChainId, ChainSet},
    transfer_request::TransferRequest,
};

/// 链选择所在的一侧
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainSide {
    From,
    To,
}

/// 单行校验结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "side", rename_all = "camelCase")]
pub enum ValidationOutcome {
    Valid,
    InvalidChainSelection(ChainSide),
    InvalidAmount,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// 已通过校验的转账，链字段保证非空
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedTransfer {
    pub from_chain: ChainId,
    pub to_chain: ChainId,
    pub amount: String,
}

/// 校验一行转账请求
///
/// 检查顺序：fromChain → toChain → amount，返回第一个失败项
pub fn validate(request: &TransferRequest, chains: &ChainSet) -> ValidationOutcome {
    match validate_transfer(request, chains) {
        Ok(_) => ValidationOutcome::Valid,
        Err(outcome) => outcome,
    }
}

/// 校验一行并在通过时给出可提交的转账
pub fn validate_transfer(
    request: &TransferRequest,
    chains: &ChainSet,
) -> Result<ValidatedTransfer, ValidationOutcome> {
    let from_chain = supported(request.from_chain.as_ref(), chains)
        .ok_or(ValidationOutcome::InvalidChainSelection(ChainSide::From))?;
    let to_chain = supported(request.to_chain.as_ref(), chains)
        .ok_or(ValidationOutcome::InvalidChainSelection(ChainSide::To))?;
    if !is_valid_amount(&request.amount) {
        return Err(ValidationOutcome::InvalidAmount);
    }
    Ok(ValidatedTransfer {
        from_chain: from_chain.clone(),
        to_chain: to_chain.clone(),
        amount: request.amount.clone(),
    })
}

fn supported<'a>(chain: Option<&'a ChainId>, chains: &ChainSet) -> Option<&'a ChainId> {
    chain.filter(|id| !id.is_empty() && chains.contains(id))
}

/// 金额必须是有限的十进制数（允许 0、负数和科学计数法）
pub fn is_valid_amount(amount: &str) -> bool {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return false;
    }
    // f64 解析会接受 "inf" / "NaN"，需再判断有限性
    trimmed.parse::<f64>().map(f64::is_finite).unwrap_or(false)
}
