pub mod adapter;
pub mod ethereum;
pub mod models;
pub mod price;
pub mod solana;

// Re-exports for convenience
pub use adapter::{AdapterError, ChainAdapter};
pub use ethereum::EthereumAdapter;
pub use price::PriceResolver;
pub use solana::SolanaAdapter;
