//! Team revenue ledger and payout requests
//!
//! Teams earn the markup on each player registration and a commission on
//! product orders from their supporters. Revenue is paid out through a
//! request that an admin approves or rejects, then marks paid.

use chrono::{DateTime, Utc};
use league_common::format_currency;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::registry::TeamRegistry;
use crate::team::{BankingDetails, TeamId};
use crate::{PayoutError, Result, TeamError};

pub type PayoutId = u64;

/// Share of a product order credited to the customer's team
pub const COMMISSION_RATE: Decimal = dec!(0.10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RevenueKind {
    Markup,
    Commission,
}

/// What earned a revenue entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RevenueSource {
    PlayerRegistration {
        #[serde(rename = "playerName")]
        player_name: String,
        #[serde(rename = "submissionId")]
        submission_id: Option<u64>,
    },
    ProductOrder {
        #[serde(rename = "customerName")]
        customer_name: String,
        #[serde(rename = "orderNumber")]
        order_number: String,
        #[serde(rename = "orderTotal")]
        order_total: Decimal,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueEntry {
    pub id: u64,
    pub kind: RevenueKind,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub metadata: RevenueSource,
    pub details: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RevenueBreakdown {
    pub markup: Decimal,
    pub commission: Decimal,
    pub total: Decimal,
}

impl RevenueBreakdown {
    fn from_entries(entries: &[RevenueEntry]) -> Self {
        let sum = |kind: RevenueKind| -> Decimal {
            entries.iter().filter(|e| e.kind == kind).map(|e| e.amount).sum()
        };
        let markup = sum(RevenueKind::Markup);
        let commission = sum(RevenueKind::Commission);
        Self {
            markup,
            commission,
            total: markup + commission,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Paid => "paid",
        }
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which revenue entries a processed payout removes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerClearScope {
    /// Everything on the team's ledger, including entries added after the
    /// request was made
    #[default]
    All,
    /// Only the entries the request was computed from
    Snapshot,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRequest {
    pub id: PayoutId,
    pub team_id: TeamId,
    pub team_name: String,
    pub manager_name: String,
    pub email: String,
    pub phone: String,
    pub amount: Decimal,
    pub breakdown: RevenueBreakdown,
    pub banking_details: Option<BankingDetails>,
    pub status: PayoutStatus,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub notes: String,
    /// Revenue entries the amount was computed from
    pub ledger_entry_ids: Vec<u64>,
}

/// Entry in a team's payout history
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRecord {
    pub id: u64,
    pub request_id: PayoutId,
    pub amount: Decimal,
    pub breakdown: RevenueBreakdown,
    pub paid_at: DateTime<Utc>,
    pub notes: String,
}

impl TeamRegistry {
    // =========================================================================
    // Revenue
    // =========================================================================

    /// Credit a player's registration markup to the main team
    pub fn add_player_registration_revenue(
        &self,
        team_id: TeamId,
        player_name: &str,
        markup: Decimal,
        submission_id: Option<u64>,
    ) -> Result<RevenueEntry> {
        self.append_revenue(
            team_id,
            RevenueKind::Markup,
            markup,
            format!("Player registration markup for {}", player_name),
            RevenueSource::PlayerRegistration {
                player_name: player_name.to_string(),
                submission_id,
            },
        )
    }

    /// Credit made when a player registers for a team: a team on a zero kit
    /// markup earns nothing, so no entry is recorded
    pub fn credit_registration_markup(
        &self,
        team_id: TeamId,
        player_name: &str,
        markup: Decimal,
        submission_id: Option<u64>,
    ) -> Result<Option<RevenueEntry>> {
        if !markup.is_zero() {
            return self
                .add_player_registration_revenue(team_id, player_name, markup, submission_id)
                .map(Some);
        }
        if !self.state.read().teams.contains_key(&team_id) {
            return Err(TeamError::TeamNotFound(team_id));
        }
        tracing::debug!(team_id, player_name, "zero kit markup, nothing credited");
        Ok(None)
    }

    /// Credit the team with its commission on a supporter's order
    pub fn add_product_commission(
        &self,
        team_id: TeamId,
        customer_name: &str,
        order_total: Decimal,
        order_number: &str,
    ) -> Result<RevenueEntry> {
        let commission = (order_total * COMMISSION_RATE).round_dp(2);
        self.append_revenue(
            team_id,
            RevenueKind::Commission,
            commission,
            format!(
                "10% commission from {}'s order #{} (R{})",
                customer_name,
                order_number,
                format_currency(order_total)
            ),
            RevenueSource::ProductOrder {
                customer_name: customer_name.to_string(),
                order_number: order_number.to_string(),
                order_total,
            },
        )
    }

    fn append_revenue(
        &self,
        team_id: TeamId,
        kind: RevenueKind,
        amount: Decimal,
        details: String,
        metadata: RevenueSource,
    ) -> Result<RevenueEntry> {
        if amount <= Decimal::ZERO {
            return Err(TeamError::Validation(format!("revenue amount must be positive, got {}", amount)));
        }

        let mut guard = self.state.write();
        if !guard.teams.contains_key(&team_id) {
            return Err(TeamError::TeamNotFound(team_id));
        }
        let entry = RevenueEntry {
            id: guard.next_item_id(),
            kind,
            amount,
            date: Utc::now(),
            metadata,
            details,
        };
        guard.revenue.entry(team_id).or_default().push(entry.clone());
        tracing::info!(team_id, kind = ?kind, amount = %amount, "revenue recorded");
        Ok(entry)
    }

    /// Ledger entries in the order they were earned
    pub fn revenue(&self, team_id: TeamId) -> Vec<RevenueEntry> {
        self.state.read().revenue.get(&team_id).cloned().unwrap_or_default()
    }

    pub fn total_revenue(&self, team_id: TeamId) -> Decimal {
        self.revenue_breakdown(team_id).total
    }

    pub fn revenue_breakdown(&self, team_id: TeamId) -> RevenueBreakdown {
        self.state
            .read()
            .revenue
            .get(&team_id)
            .map(|entries| RevenueBreakdown::from_entries(entries))
            .unwrap_or_default()
    }

    // =========================================================================
    // Payout requests
    // =========================================================================

    /// Request a payout of the team's full balance. The pending check and the
    /// insert happen under one write lock.
    pub fn create_payout_request(&self, team_id: TeamId) -> std::result::Result<PayoutRequest, PayoutError> {
        let mut guard = self.state.write();
        let state = &mut *guard;

        let team = state.teams.get(&team_id).ok_or(PayoutError::TeamNotFound(team_id))?;
        if let Some(pending) = state
            .payouts
            .values()
            .find(|p| p.team_id == team_id && p.status == PayoutStatus::Pending)
        {
            return Err(PayoutError::PendingExists { team_id, request_id: pending.id });
        }

        let entries = state.revenue.get(&team_id).map(Vec::as_slice).unwrap_or(&[]);
        let breakdown = RevenueBreakdown::from_entries(entries);
        if breakdown.total <= Decimal::ZERO {
            return Err(PayoutError::NoRevenue(team_id));
        }

        let request = PayoutRequest {
            id: state.next_payout_id,
            team_id,
            team_name: team.team_name.clone(),
            manager_name: team.manager_name.clone(),
            email: team.email.clone(),
            phone: team.phone.clone(),
            amount: breakdown.total,
            breakdown,
            banking_details: team.banking_details.clone(),
            status: PayoutStatus::Pending,
            requested_at: Utc::now(),
            processed_at: None,
            notes: String::new(),
            ledger_entry_ids: entries.iter().map(|e| e.id).collect(),
        };
        state.next_payout_id += 1;
        state.payouts.insert(request.id, request.clone());

        tracing::info!(request_id = request.id, team_id, amount = %request.amount, "payout requested");
        Ok(request)
    }

    pub fn approve_payout(&self, id: PayoutId, notes: &str) -> std::result::Result<PayoutRequest, PayoutError> {
        self.decide_payout(id, notes, PayoutStatus::Approved)
    }

    pub fn reject_payout(&self, id: PayoutId, notes: &str) -> std::result::Result<PayoutRequest, PayoutError> {
        self.decide_payout(id, notes, PayoutStatus::Rejected)
    }

    fn decide_payout(
        &self,
        id: PayoutId,
        notes: &str,
        to: PayoutStatus,
    ) -> std::result::Result<PayoutRequest, PayoutError> {
        let mut state = self.state.write();
        let request = state.payouts.get_mut(&id).ok_or(PayoutError::NotFound(id))?;
        if request.status != PayoutStatus::Pending {
            return Err(PayoutError::InvalidTransition { id, from: request.status, to });
        }
        request.status = to;
        request.processed_at = Some(Utc::now());
        request.notes = notes.to_string();
        tracing::info!(request_id = id, status = %to, "payout request decided");
        Ok(request.clone())
    }

    /// Mark a pending or approved request paid, clear the team's ledger per
    /// `scope` and append the payout to the team's history.
    pub fn process_payout(
        &self,
        id: PayoutId,
        notes: &str,
        scope: LedgerClearScope,
    ) -> std::result::Result<PayoutRequest, PayoutError> {
        let mut guard = self.state.write();
        let state = &mut *guard;

        let request = state.payouts.get_mut(&id).ok_or(PayoutError::NotFound(id))?;
        if !matches!(request.status, PayoutStatus::Pending | PayoutStatus::Approved) {
            return Err(PayoutError::InvalidTransition { id, from: request.status, to: PayoutStatus::Paid });
        }

        let now = Utc::now();
        request.status = PayoutStatus::Paid;
        request.processed_at = Some(now);
        request.notes = notes.to_string();
        let request = request.clone();

        match scope {
            LedgerClearScope::All => {
                state.revenue.remove(&request.team_id);
            }
            LedgerClearScope::Snapshot => {
                if let Some(entries) = state.revenue.get_mut(&request.team_id) {
                    entries.retain(|e| !request.ledger_entry_ids.contains(&e.id));
                }
            }
        }

        let record_id = state.next_item_id();
        match state.teams.get_mut(&request.team_id) {
            Some(team) => {
                team.payouts.push(PayoutRecord {
                    id: record_id,
                    request_id: id,
                    amount: request.amount,
                    breakdown: request.breakdown,
                    paid_at: now,
                    notes: notes.to_string(),
                });
                team.updated_at = now;
            }
            None => tracing::warn!(request_id = id, team_id = request.team_id, "paid request for a deleted team"),
        }

        tracing::info!(request_id = id, team_id = request.team_id, amount = %request.amount, scope = ?scope, "payout processed");
        Ok(request)
    }

    // =========================================================================
    // Listings
    // =========================================================================

    pub fn payout(&self, id: PayoutId) -> Option<PayoutRequest> {
        self.state.read().payouts.get(&id).cloned()
    }

    /// All requests, newest first
    pub fn payouts(&self) -> Vec<PayoutRequest> {
        let mut requests: Vec<PayoutRequest> = self.state.read().payouts.values().cloned().collect();
        requests.sort_by(|a, b| b.requested_at.cmp(&a.requested_at).then(b.id.cmp(&a.id)));
        requests
    }

    pub fn pending_payouts(&self) -> Vec<PayoutRequest> {
        self.filter_payouts(|p| p.status == PayoutStatus::Pending)
    }

    pub fn payouts_for_team(&self, team_id: TeamId) -> Vec<PayoutRequest> {
        self.filter_payouts(|p| p.team_id == team_id)
    }

    pub fn pending_payout_for_team(&self, team_id: TeamId) -> Option<PayoutRequest> {
        self.filter_payouts(|p| p.team_id == team_id && p.status == PayoutStatus::Pending)
            .into_iter()
            .next()
    }

    fn filter_payouts(&self, pred: impl Fn(&PayoutRequest) -> bool) -> Vec<PayoutRequest> {
        self.state
            .read()
            .payouts
            .values()
            .filter(|p| pred(p))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::team::TeamDraft;

    fn registry() -> (TeamRegistry, TeamId) {
        let registry = TeamRegistry::new();
        let draft = TeamDraft {
            team_name: "Lions Rugby Club".into(),
            email: "john@lionsrugby.com".into(),
            ..Default::default()
        };
        let id = registry.create(draft).unwrap().team.id;
        (registry, id)
    }

    /// Markups 50 + 75 + 60 and commissions on orders of 455 and 328
    fn seed_revenue(registry: &TeamRegistry, team: TeamId) {
        registry.add_player_registration_revenue(team, "Sipho", dec!(50), Some(11)).unwrap();
        registry.add_player_registration_revenue(team, "Thabo", dec!(75), Some(12)).unwrap();
        registry.add_player_registration_revenue(team, "Lerato", dec!(60), Some(13)).unwrap();
        registry.add_product_commission(team, "Mrs Dlamini", dec!(455), "1001").unwrap();
        registry.add_product_commission(team, "Mr Naidoo", dec!(328), "1002").unwrap();
    }

    #[test]
    fn test_commission_is_ten_percent() {
        let (registry, team) = registry();
        let entry = registry.add_product_commission(team, "Ann", dec!(455), "1001").unwrap();
        assert_eq!(entry.amount, dec!(45.50));
        assert_eq!(entry.kind, RevenueKind::Commission);
        assert_eq!(entry.details, "10% commission from Ann's order #1001 (R455.00)");
    }

    #[test]
    fn test_breakdown_and_payout_amount() {
        let (registry, team) = registry();
        seed_revenue(&registry, team);

        let breakdown = registry.revenue_breakdown(team);
        assert_eq!(breakdown.markup, dec!(185));
        assert_eq!(breakdown.commission, dec!(78.30));
        assert_eq!(breakdown.total, dec!(263.30));

        let request = registry.create_payout_request(team).unwrap();
        assert_eq!(request.amount, dec!(263.30));
        assert_eq!(format_currency(request.amount), "263.30");
        assert_eq!(request.status, PayoutStatus::Pending);
        assert_eq!(request.ledger_entry_ids.len(), 5);
    }

    #[test]
    fn test_single_pending_request_per_team() {
        let (registry, team) = registry();
        seed_revenue(&registry, team);

        let first = registry.create_payout_request(team).unwrap();
        let err = registry.create_payout_request(team).unwrap_err();
        assert!(matches!(err, PayoutError::PendingExists { request_id, .. } if request_id == first.id));
        assert_eq!(registry.pending_payout_for_team(team).map(|p| p.id), Some(first.id));

        registry.reject_payout(first.id, "banking details missing").unwrap();
        assert!(registry.create_payout_request(team).is_ok());
    }

    #[test]
    fn test_payout_requires_revenue_and_team() {
        let (registry, team) = registry();
        assert!(matches!(registry.create_payout_request(team), Err(PayoutError::NoRevenue(_))));
        assert!(matches!(registry.create_payout_request(99), Err(PayoutError::TeamNotFound(99))));
        assert!(matches!(
            registry.add_player_registration_revenue(99, "X", dec!(10), None),
            Err(TeamError::TeamNotFound(99))
        ));
        assert!(matches!(
            registry.add_player_registration_revenue(team, "X", dec!(0), None),
            Err(TeamError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_markup_credit_is_skipped() {
        let (registry, team) = registry();
        assert!(registry.credit_registration_markup(team, "Sipho", dec!(0), Some(11)).unwrap().is_none());
        assert!(registry.revenue(team).is_empty());

        let entry = registry.credit_registration_markup(team, "Sipho", dec!(50), Some(11)).unwrap();
        assert_eq!(entry.map(|e| e.amount), Some(dec!(50)));
        assert!(matches!(
            registry.credit_registration_markup(99, "X", dec!(0), None),
            Err(TeamError::TeamNotFound(99))
        ));
    }

    #[test]
    fn test_process_all_clears_later_revenue() {
        let (registry, team) = registry();
        seed_revenue(&registry, team);
        let request = registry.create_payout_request(team).unwrap();

        registry.add_player_registration_revenue(team, "Late", dec!(20), None).unwrap();
        let paid = registry.process_payout(request.id, "EFT sent", LedgerClearScope::All).unwrap();

        assert_eq!(paid.status, PayoutStatus::Paid);
        assert!(paid.processed_at.is_some());
        assert_eq!(paid.amount, dec!(263.30));
        assert!(registry.revenue(team).is_empty());
        assert_eq!(registry.total_revenue(team), Decimal::ZERO);

        let history = registry.get(team).unwrap().payouts;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount, dec!(263.30));
        assert_eq!(history[0].notes, "EFT sent");
    }

    #[test]
    fn test_process_snapshot_keeps_later_revenue() {
        let (registry, team) = registry();
        seed_revenue(&registry, team);
        let request = registry.create_payout_request(team).unwrap();

        registry.add_player_registration_revenue(team, "Late", dec!(20), None).unwrap();
        registry.approve_payout(request.id, "").unwrap();
        registry.process_payout(request.id, "", LedgerClearScope::Snapshot).unwrap();

        assert_eq!(registry.total_revenue(team), dec!(20));
        assert_eq!(registry.revenue(team).len(), 1);
    }

    #[test]
    fn test_payout_transitions() {
        let (registry, team) = registry();
        seed_revenue(&registry, team);
        let request = registry.create_payout_request(team).unwrap();

        let rejected = registry.reject_payout(request.id, "no").unwrap();
        assert_eq!(rejected.status, PayoutStatus::Rejected);
        assert!(rejected.processed_at.is_some());

        assert!(matches!(
            registry.approve_payout(request.id, ""),
            Err(PayoutError::InvalidTransition { from: PayoutStatus::Rejected, .. })
        ));
        assert!(matches!(
            registry.process_payout(request.id, "", LedgerClearScope::All),
            Err(PayoutError::InvalidTransition { to: PayoutStatus::Paid, .. })
        ));
        assert!(matches!(registry.approve_payout(42, ""), Err(PayoutError::NotFound(42))));
        assert_eq!(registry.total_revenue(team), dec!(263.30));
    }

    #[test]
    fn test_payout_listings() {
        let (registry, lions) = registry();
        let tigers = registry
            .create(TeamDraft { team_name: "Tigers".into(), ..Default::default() })
            .unwrap()
            .team
            .id;
        seed_revenue(&registry, lions);
        registry.add_player_registration_revenue(tigers, "Zola", dec!(40), None).unwrap();

        let first = registry.create_payout_request(lions).unwrap();
        let second = registry.create_payout_request(tigers).unwrap();
        registry.approve_payout(first.id, "").unwrap();

        let all: Vec<PayoutId> = registry.payouts().iter().map(|p| p.id).collect();
        assert_eq!(all, vec![second.id, first.id]);
        assert_eq!(registry.pending_payouts().len(), 1);
        assert_eq!(registry.payouts_for_team(lions).len(), 1);
        assert!(registry.pending_payout_for_team(lions).is_none());
    }
}
