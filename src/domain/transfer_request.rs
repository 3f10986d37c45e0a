//! 批量转账行
//!
//! 行按位置寻址：删除会让后续行的下标前移

use serde::{Deserialize, Serialize};

use super::chain::ChainId;
use crate::error::TransferError;

/// 单笔转账请求（一行表单）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub from_chain: Option<ChainId>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub to_chain: Option<ChainId>,
    #[serde(default)]
    pub amount: String,
}

impl TransferRequest {
    pub fn new(from_chain: &str, to_chain: &str, amount: &str) -> Self {
        let mut request = Self::default();
        request.set(TransferField::FromChain, from_chain);
        request.set(TransferField::ToChain, to_chain);
        request.set(TransferField::Amount, amount);
        request
    }

    /// 替换单个字段；空字符串表示未选择链
    pub fn set(&mut self, field: TransferField, value: &str) {
        let chain = || (!value.is_empty()).then(|| ChainId::new(value));
        match field {
            TransferField::FromChain => self.from_chain = chain(),
            TransferField::ToChain => self.to_chain = chain(),
            TransferField::Amount => self.amount = value.to_string(),
        }
    }
}

/// 可编辑字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum TransferField {
    FromChain,
    ToChain,
    Amount,
}

impl TransferField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FromChain => "fromChain",
            Self::ToChain => "toChain",
            Self::Amount => "amount",
        }
    }
}

/// 有序转账行列表，长度始终 ≥ 1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequestList {
    rows: Vec<TransferRequest>,
}

impl Default for TransferRequestList {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferRequestList {
    pub fn new() -> Self {
        Self {
            rows: vec![TransferRequest::default()],
        }
    }

    pub fn rows(&self) -> &[TransferRequest] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 长度不变式保证恒为 false
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 在末尾追加一个空行
    pub fn append(&mut self) {
        self.rows.push(TransferRequest::default());
    }

    /// 删除指定行
    ///
    /// 只剩一行时为空操作并返回 `Ok(false)`
    pub fn remove(&mut self, index: usize) -> Result<bool, TransferError> {
        if self.rows.len() == 1 {
            return Ok(false);
        }
        self.check_index(index)?;
        self.rows.remove(index);
        Ok(true)
    }

    /// 替换指定行的一个字段
    pub fn update(
        &mut self,
        index: usize,
        field: TransferField,
        value: &str,
    ) -> Result<(), TransferError> {
        self.check_index(index)?;
        self.rows[index].set(field, value);
        Ok(())
    }

    /// 重置为单个空行
    pub fn reset(&mut self) {
        self.rows.clear();
        self.rows.push(TransferRequest::default());
    }

    fn check_index(&self, index: usize) -> Result<(), TransferError> {
        if index < self.rows.len() {
            Ok(())
        } else {
            Err(TransferError::IndexOutOfRange {
                index,
                len: self.rows.len(),
            })
        }
    }
}
