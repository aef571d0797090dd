//! Wires the Postgres stores, provider gateway and alert sinks into the
//! core services.

use std::sync::Arc;

use ledgerkeep_core::dispute::DisputeManager;
use ledgerkeep_core::ledger::LedgerStore;
use ledgerkeep_core::notify::{NotificationSink, TicketSink};
use ledgerkeep_core::payment::{PaymentProvider, TransactionStore};
use ledgerkeep_core::reconciliation::ReconciliationEngine;
use ledgerkeep_core::verification::LedgerVerificationService;
use ledgerkeep_db::{
    LedgerRepository, PaymentTransactionRepository, ProviderDisputeRepository,
    ReconciliationJobRepository, SupportTicketRepository, connect,
};
use ledgerkeep_integrations::{HttpPaymentGateway, notifier_from_config};
use ledgerkeep_shared::{AppConfig, AppError};
use tracing::{info, warn};

/// The three core services sharing one connection pool and one set of sinks.
pub struct Services {
    /// Provider feed reconciliation.
    pub reconciliation: ReconciliationEngine,
    /// Dispute webhooks and deadlines.
    pub disputes: DisputeManager,
    /// Nightly integrity sweep.
    pub verification: LedgerVerificationService,
}

impl Services {
    /// Connects to the database and builds every service.
    pub async fn build(config: &AppConfig) -> Result<Self, AppError> {
        let db = connect(&config.database)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        info!(
            max_connections = config.database.max_connections,
            "Connected to database"
        );

        let gateway = HttpPaymentGateway::from_config(config)
            .map_err(|e| AppError::Internal(format!("HTTP client: {e}")))?;
        for provider in PaymentProvider::ALL {
            if !gateway.is_configured(provider) {
                warn!(%provider, "No feed endpoint configured, its reconciliation jobs will fail");
            }
        }

        let ledger: Arc<dyn LedgerStore> = Arc::new(LedgerRepository::new(db.clone()));
        let transactions: Arc<dyn TransactionStore> =
            Arc::new(PaymentTransactionRepository::new(db.clone()));
        let tickets: Arc<dyn TicketSink> = Arc::new(SupportTicketRepository::new(db.clone()));
        let notifier: Arc<dyn NotificationSink> = notifier_from_config(config);

        Ok(Self {
            reconciliation: ReconciliationEngine::new(
                Arc::new(gateway),
                Arc::clone(&transactions),
                Arc::new(ReconciliationJobRepository::new(db.clone())),
                Arc::clone(&notifier),
                Arc::clone(&tickets),
            ),
            disputes: DisputeManager::new(
                Arc::clone(&ledger),
                transactions,
                Arc::new(ProviderDisputeRepository::new(db)),
                Arc::clone(&notifier),
                Arc::clone(&tickets),
            ),
            verification: LedgerVerificationService::new(ledger, notifier, tickets),
        })
    }
}
