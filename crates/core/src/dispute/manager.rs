//! Dispute lifecycle handling.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use ledgerkeep_shared::types::{DisputeId, PostingId};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, instrument, warn};

use super::error::DisputeError;
use super::event::{DisputeClosed, DisputeCreated, DisputeEvent, DisputeUpdated};
use super::mapping::{map_reason, map_status, map_type};
use super::repository::DisputeRepository;
use super::types::{Dispute, DisputeStatus};
use crate::ledger::{DisputeFunds, LedgerEntryDraft, LedgerStore, PostingBuilder};
use crate::notify::{
    DisputeAlert, DisputeAlertKind, NewTicket, NotificationSink, TicketCategory, TicketPriority,
    TicketSink,
};
use crate::payment::{PaymentProvider, TransactionStore};

/// Disputed amount at which a ticket is opened on creation.
pub const HIGH_VALUE_DISPUTE_AMOUNT: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// What handling an event did.
#[derive(Debug, Clone, PartialEq)]
pub enum DisputeOutcome {
    /// New dispute recorded.
    Created {
        /// The stored dispute.
        dispute: Dispute,
        /// Posting that froze the funds, absent when the transaction is unknown.
        freeze: Option<PostingId>,
    },
    /// A created event for a dispute that already exists.
    Duplicate(Dispute),
    /// Status updated without ledger effect.
    Updated(Dispute),
    /// Dispute decided.
    Closed {
        /// The stored dispute.
        dispute: Dispute,
        /// Release or chargeback posting, absent when nothing was frozen.
        settlement: Option<PostingId>,
    },
    /// Event could not be applied; logged and, where useful, ticketed.
    Ignored {
        /// Why the event was dropped.
        reason: String,
    },
}

/// Drives disputes through their lifecycle and moves disputed funds
/// between cash and the dispute reserve.
///
/// Events for the same dispute are handled one at a time within a process.
/// Across processes, fund movements are keyed postings written at most once
/// per dispute, and dispute updates carry an optimistic version check; the
/// losing writer gets a `Conflict` and the event can be redelivered.
pub struct DisputeManager {
    ledger: Arc<dyn LedgerStore>,
    transactions: Arc<dyn TransactionStore>,
    disputes: Arc<dyn DisputeRepository>,
    notifier: Arc<dyn NotificationSink>,
    tickets: Arc<dyn TicketSink>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl DisputeManager {
    /// Creates a manager over its collaborators.
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        transactions: Arc<dyn TransactionStore>,
        disputes: Arc<dyn DisputeRepository>,
        notifier: Arc<dyn NotificationSink>,
        tickets: Arc<dyn TicketSink>,
    ) -> Self {
        Self {
            ledger,
            transactions,
            disputes,
            notifier,
            tickets,
            locks: DashMap::new(),
        }
    }

    async fn lock(&self, provider: PaymentProvider, provider_dispute_id: &str) -> DisputeLock<'_> {
        let key = format!("{provider}:{provider_dispute_id}");
        let mutex = Arc::clone(self.locks.entry(key.clone()).or_default().value());
        let guard = mutex.lock_owned().await;
        DisputeLock {
            locks: &self.locks,
            key,
            guard: Some(guard),
        }
    }

    /// Disputes with an event in flight or waiting.
    #[cfg(test)]
    pub(crate) fn held_locks(&self) -> usize {
        self.locks.len()
    }

    /// Handles any dispute event.
    pub async fn handle_event(&self, event: DisputeEvent) -> Result<DisputeOutcome, DisputeError> {
        match event {
            DisputeEvent::Created(e) => self.handle_created(e).await,
            DisputeEvent::Updated(e) => self.handle_updated(e).await,
            DisputeEvent::Closed(e) => self.handle_closed(e).await,
        }
    }

    /// Records a new dispute and freezes the disputed funds.
    ///
    /// Repeated events for the same dispute are no-ops, except that a
    /// dispute recorded without its freeze (the posting failed, or the
    /// transaction arrived late) is frozen on redelivery. When the disputed
    /// transaction is unknown the dispute is still recorded, without a
    /// freeze, and a ticket is opened.
    #[instrument(skip_all, fields(provider = %event.provider, dispute_id = %event.provider_dispute_id))]
    pub async fn handle_created(&self, event: DisputeCreated) -> Result<DisputeOutcome, DisputeError> {
        let _lock = self.lock(event.provider, &event.provider_dispute_id).await;

        let existing = self
            .disputes
            .find_by_provider_dispute_id(event.provider, &event.provider_dispute_id)
            .await?;
        let redelivered = existing.is_some();
        let dispute = match existing {
            Some(existing) if !existing.awaits_freeze() => {
                info!("Duplicate dispute created event ignored");
                return Ok(DisputeOutcome::Duplicate(existing));
            }
            Some(existing) => existing,
            None => {
                let dispute = new_dispute(&event, Utc::now());
                self.disputes.insert(&dispute).await?;
                dispute
            }
        };

        let transaction = self
            .transactions
            .find_by_transaction_id(&dispute.transaction_id)
            .await?;
        if transaction.is_none() {
            if redelivered {
                return Ok(DisputeOutcome::Duplicate(dispute));
            }
            warn!(transaction_id = %dispute.transaction_id, "Dispute references unknown transaction");
            self.open_ticket(NewTicket {
                subject: format!(
                    "Missing transaction for dispute {} ({})",
                    dispute.provider_dispute_id, dispute.provider
                ),
                description: format!(
                    "Dispute {} from {} references transaction {} which is not recorded. \
                     Amount {} {}. Funds were not frozen.",
                    dispute.provider_dispute_id,
                    dispute.provider,
                    dispute.transaction_id,
                    dispute.amount,
                    dispute.currency
                ),
                priority: TicketPriority::High,
                category: TicketCategory::Dispute,
            })
            .await;
            return Ok(DisputeOutcome::Created {
                dispute,
                freeze: None,
            });
        }
        if redelivered {
            info!("Freezing funds for a dispute recorded without them");
        }

        let now = Utc::now();
        let receipt = self
            .ledger
            .post_once(
                &freeze_key(&dispute),
                PostingBuilder::fund_freeze(&funds_of(&dispute, now)),
            )
            .await?;
        let mut dispute = self
            .disputes
            .update(&dispute.with_funds_frozen(true, now))
            .await?;
        self.transactions
            .mark_disputed(&dispute.transaction_id, &dispute.provider_dispute_id)
            .await?;

        if self.notify(DisputeAlertKind::Created, &dispute).await {
            dispute = self
                .disputes
                .update(&dispute.with_admin_notified(Utc::now()))
                .await?;
        }

        if dispute.amount >= HIGH_VALUE_DISPUTE_AMOUNT {
            self.open_ticket(NewTicket {
                subject: format!(
                    "High-value dispute {} ({}): {} {}",
                    dispute.provider_dispute_id, dispute.provider, dispute.amount, dispute.currency
                ),
                description: format!(
                    "Dispute {} on transaction {}. Reason {}. Evidence due by {}.",
                    dispute.provider_dispute_id,
                    dispute.transaction_id,
                    dispute.reason.as_str(),
                    dispute
                        .evidence_due_by
                        .map_or_else(|| "unknown".to_string(), |d| d.to_rfc3339())
                ),
                priority: TicketPriority::Urgent,
                category: TicketCategory::Dispute,
            })
            .await;
        }

        info!(posting_id = %receipt.posting_id, amount = %dispute.amount, "Dispute funds frozen");
        Ok(DisputeOutcome::Created {
            dispute,
            freeze: Some(receipt.posting_id),
        })
    }

    /// Applies a provider status change. Never touches the ledger.
    ///
    /// Outcomes (WON, LOST, ACCEPTED) only take effect through close
    /// events, which also settle the funds.
    #[instrument(skip_all, fields(provider = %event.provider, dispute_id = %event.provider_dispute_id))]
    pub async fn handle_updated(&self, event: DisputeUpdated) -> Result<DisputeOutcome, DisputeError> {
        let _lock = self.lock(event.provider, &event.provider_dispute_id).await;

        let Some(dispute) = self
            .disputes
            .find_by_provider_dispute_id(event.provider, &event.provider_dispute_id)
            .await?
        else {
            return Ok(self
                .unknown_dispute(event.provider, &event.provider_dispute_id, "update")
                .await);
        };

        let next = map_status(event.provider, &event.native_status);
        if next.is_resolution() {
            info!(status = %next, "Outcome in update event left for the close event");
            return Ok(DisputeOutcome::Ignored {
                reason: format!("{next} arrives through close events"),
            });
        }
        if !dispute.status.can_transition_to(next) {
            warn!(from = %dispute.status, to = %next, "Dispute transition ignored");
            return Ok(DisputeOutcome::Ignored {
                reason: format!("cannot move from {} to {next}", dispute.status),
            });
        }

        let now = Utc::now();
        let mut dispute = dispute.with_status(next, now);
        if let Some(due) = event.evidence_due_by {
            dispute.evidence_due_by = Some(due);
        }
        let dispute = self.disputes.update(&dispute).await?;
        self.notify(DisputeAlertKind::Updated, &dispute).await;

        info!(status = %dispute.status, "Dispute updated");
        Ok(DisputeOutcome::Updated(dispute))
    }

    /// Applies a provider decision.
    ///
    /// WON releases frozen funds back to cash. LOST and ACCEPTED move them
    /// to chargeback loss. Expired disputes are decided the same way. A
    /// decision for an already decided dispute is a no-op, and a dispute is
    /// settled by at most one posting.
    #[instrument(skip_all, fields(provider = %event.provider, dispute_id = %event.provider_dispute_id))]
    pub async fn handle_closed(&self, event: DisputeClosed) -> Result<DisputeOutcome, DisputeError> {
        let _lock = self.lock(event.provider, &event.provider_dispute_id).await;

        let Some(dispute) = self
            .disputes
            .find_by_provider_dispute_id(event.provider, &event.provider_dispute_id)
            .await?
        else {
            return Ok(self
                .unknown_dispute(event.provider, &event.provider_dispute_id, "close")
                .await);
        };

        let outcome = map_status(event.provider, &event.native_status);
        if !outcome.is_resolution() {
            warn!(native_status = %event.native_status, "Close event without a decision ignored");
            return Ok(DisputeOutcome::Ignored {
                reason: format!("{:?} is not a dispute decision", event.native_status),
            });
        }
        if !dispute.status.can_transition_to(outcome) {
            info!(status = %dispute.status, "Dispute already decided");
            return Ok(DisputeOutcome::Ignored {
                reason: format!("dispute already {}", dispute.status),
            });
        }

        let now = Utc::now();
        let settlement = if dispute.funds_frozen {
            let funds = funds_of(&dispute, now);
            let drafts: Vec<LedgerEntryDraft> = match outcome {
                DisputeStatus::Won => PostingBuilder::fund_release(&funds),
                _ => PostingBuilder::chargeback(&funds),
            };
            let receipt = self.ledger.post_once(&settlement_key(&dispute), drafts).await?;
            if receipt.replayed {
                info!(posting_id = %receipt.posting_id, "Settlement was already posted");
            }
            Some(receipt.posting_id)
        } else {
            warn!("Dispute decided without frozen funds; no ledger effect");
            None
        };

        let mut dispute = dispute.with_status(outcome, now);
        if settlement.is_some() {
            dispute = dispute.with_funds_frozen(false, now);
        }
        if event.resolution_notes.is_some() {
            dispute.resolution_notes = event.resolution_notes;
        }
        let dispute = self.disputes.update(&dispute).await?;
        self.notify(DisputeAlertKind::Closed, &dispute).await;

        info!(status = %dispute.status, settled = settlement.is_some(), "Dispute closed");
        Ok(DisputeOutcome::Closed {
            dispute,
            settlement,
        })
    }

    /// Records evidence submission for an open dispute.
    pub async fn submit_evidence(
        &self,
        provider: PaymentProvider,
        provider_dispute_id: &str,
    ) -> Result<Dispute, DisputeError> {
        let _lock = self.lock(provider, provider_dispute_id).await;

        let dispute = self
            .disputes
            .find_by_provider_dispute_id(provider, provider_dispute_id)
            .await?
            .ok_or_else(|| DisputeError::NotFound(provider_dispute_id.to_string()))?;
        if !dispute.status.accepts_evidence() {
            return Err(DisputeError::InvalidTransition {
                from: dispute.status,
                to: DisputeStatus::EvidenceSubmitted,
            });
        }

        let now = Utc::now();
        let dispute = self
            .disputes
            .update(&dispute.with_evidence_submitted(now).with_provider_notified(now))
            .await?;
        info!(%provider, provider_dispute_id, "Dispute evidence submitted");
        Ok(dispute)
    }

    /// Expires disputes whose evidence deadline passed. Frozen funds stay
    /// in the reserve until the provider's decision arrives.
    ///
    /// Returns the IDs of expired disputes.
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<Vec<DisputeId>, DisputeError> {
        let overdue = self.disputes.find_overdue(now).await?;
        let mut expired = Vec::with_capacity(overdue.len());

        for candidate in overdue {
            let _lock = self.lock(candidate.provider, &candidate.provider_dispute_id).await;

            let Some(current) = self
                .disputes
                .find_by_provider_dispute_id(candidate.provider, &candidate.provider_dispute_id)
                .await?
            else {
                continue;
            };
            if !current.is_overdue(now) {
                continue;
            }

            let dispute = self
                .disputes
                .update(&current.with_status(DisputeStatus::Expired, now))
                .await?;
            self.notify(DisputeAlertKind::Updated, &dispute).await;
            warn!(
                provider = %dispute.provider,
                dispute_id = %dispute.provider_dispute_id,
                "Dispute evidence deadline passed"
            );
            expired.push(dispute.id);
        }

        Ok(expired)
    }

    async fn unknown_dispute(
        &self,
        provider: PaymentProvider,
        provider_dispute_id: &str,
        action: &str,
    ) -> DisputeOutcome {
        warn!(action, "Event for unknown dispute");
        self.open_ticket(NewTicket {
            subject: format!("Dispute {action} for unknown dispute {provider_dispute_id} ({provider})"),
            description: format!(
                "Received a {action} event from {provider} for dispute {provider_dispute_id}, \
                 which has no created event on record."
            ),
            priority: TicketPriority::Medium,
            category: TicketCategory::Dispute,
        })
        .await;
        DisputeOutcome::Ignored {
            reason: format!("unknown dispute {provider_dispute_id}"),
        }
    }

    /// Sends an alert; returns whether it was delivered.
    async fn notify(&self, kind: DisputeAlertKind, dispute: &Dispute) -> bool {
        match self
            .notifier
            .send_dispute_alert(&DisputeAlert::new(kind, dispute))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(kind = kind.as_str(), error = %e, "Dispute alert not delivered");
                false
            }
        }
    }

    async fn open_ticket(&self, ticket: NewTicket) {
        if let Err(e) = self.tickets.create_ticket(ticket).await {
            warn!(error = %e, "Could not open dispute ticket");
        }
    }
}

fn new_dispute(event: &DisputeCreated, now: DateTime<Utc>) -> Dispute {
    Dispute {
        id: DisputeId::new(),
        provider_dispute_id: event.provider_dispute_id.clone(),
        provider: event.provider,
        transaction_id: event.transaction_id.clone(),
        dispute_type: map_type(event.provider, &event.native_type),
        status: DisputeStatus::Received,
        reason: map_reason(event.provider, &event.native_reason),
        amount: event.amount,
        fee: event.fee,
        currency: event.currency.to_uppercase(),
        evidence_due_by: event.evidence_due_by,
        evidence_submitted: false,
        evidence_submitted_at: None,
        funds_frozen: false,
        funds_frozen_at: None,
        funds_released_at: None,
        admin_notified: false,
        admin_notified_at: None,
        provider_notified: false,
        provider_notified_at: None,
        resolution_notes: None,
        internal_notes: None,
        received_at: now,
        resolved_at: None,
        updated_at: now,
        version: 1,
    }
}

/// Holds a dispute's in-process lock; drops the map entry once nobody else
/// holds or waits for it.
struct DisputeLock<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for DisputeLock<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Posting key of a dispute's freeze.
fn freeze_key(dispute: &Dispute) -> String {
    format!("dispute-freeze:{}:{}", dispute.provider, dispute.provider_dispute_id)
}

/// Posting key shared by a dispute's release and chargeback, so only one
/// of them is ever written.
pub(crate) fn settlement_key(dispute: &Dispute) -> String {
    format!("dispute-settle:{}:{}", dispute.provider, dispute.provider_dispute_id)
}

fn funds_of(dispute: &Dispute, now: DateTime<Utc>) -> DisputeFunds<'_> {
    DisputeFunds {
        transaction_id: &dispute.transaction_id,
        dispute_reference: &dispute.provider_dispute_id,
        amount: dispute.amount,
        currency: &dispute.currency,
        effective_date: now.date_naive(),
    }
}
