pub mod batch_orchestrator; // 批量转账状态机 + 会话
pub mod batch_validation;
pub mod chain_query;
pub mod chain_registry;
pub mod session_store;
pub mod transfer_executor;

pub use batch_orchestrator::{BatchOrchestrator, SessionSnapshot, SubmissionTicket};
pub use chain_query::{ChainQueryGateway, SimulatedChainQuery, TxReceipt, UpstreamChainQuery};
pub use chain_registry::{load_chain_set, ChainRegistry, StaticChainRegistry, UpstreamChainRegistry};
pub use session_store::SessionStore;
pub use transfer_executor::{
    SimulatedTransferExecutor, TransferExecutor, UpstreamTransferExecutor, ValidatedTransfer,
};
