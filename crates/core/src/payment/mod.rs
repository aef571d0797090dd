//! Payment transactions and provider feeds.

pub mod gateway;
pub mod provider;
pub mod status;
pub mod store;
pub mod transaction;

pub use gateway::{GatewayError, PaymentGateway};
pub use provider::PaymentProvider;
pub use status::normalize_status;
pub use store::TransactionStore;
pub use transaction::{ProviderTransaction, Transaction, TransactionStatus, TransactionType};
