//! Chainboard - 多链 Dashboard 后端
//!
//! 批量转账编排（整批校验、单次提交、结果按序回填）与链上查询

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod service;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{AppError, AppErrorCode, TransferError};
