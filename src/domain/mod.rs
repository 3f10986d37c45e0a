//! Domain 模块
//!
//! 批量转账的领域模型：链集合、转账行、单行校验、批次状态

pub mod batch_state;
pub mod chain;
pub mod transfer_request;
pub mod transfer_validator;

// 重新导出常用类型
pub use batch_state::{BatchState, BatchStateMachine, BatchStatus, SettlementResult};
pub use chain::{ChainId, ChainInfo, ChainSet};
pub use transfer_request::{TransferField, TransferRequest, TransferRequestList};
pub use transfer_validator::{
    validate, validate_transfer, ChainSide, ValidatedTransfer, ValidationOutcome,
};
