use crate::service::WalletAggregator;

pub struct AppState {
    pub wallets: WalletAggregator,
}
