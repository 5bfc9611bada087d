pub mod api;
pub mod blockchain;
pub mod config;
pub mod dispatch;
pub mod models;
pub mod service;
pub mod state;
pub mod units;
pub mod validation;

// Re-export specific items for convenience
pub use api::error::ApiError;
pub use api::response::ApiResponse;
pub use api::route::create_router;
pub use blockchain::{AdapterError, ChainAdapter};
pub use dispatch::{DispatchError, Dispatcher, RequestSpec, RetryPolicy};
pub use models::{AddressValidation, Chain, TokenBalance, Transaction, TxStatus, TxType, WalletSnapshot};
pub use service::{WalletAggregator, WalletError};
pub use validation::{classify, validate_address};
