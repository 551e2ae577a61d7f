//! League Portal Teams
//!
//! Team profiles created from approved registrations, and the revenue each
//! team earns through the league.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        TEAM REGISTRY                              │
//! │                  (one RwLock over all state)                      │
//! │                                                                   │
//! │  ┌──────────────┐   ┌──────────────────┐   ┌──────────────────┐   │
//! │  │   Profiles   │   │  Revenue Ledger  │   │ Payout Requests  │   │
//! │  │ players,     │   │ markup +         │──►│ pending ─► paid  │   │
//! │  │ messages ... │   │ 10% commission   │   │   └─► rejected   │   │
//! │  └──────────────┘   └──────────────────┘   └──────────────────┘   │
//! └───────────────────────────────────────────────────────────────────┘
//!
//!  KitPricingRegistry: per-team kit base price and markup
//! ```

pub mod ledger;
pub mod pricing;
pub mod registry;
pub mod team;

use league_common::PasswordError;
use thiserror::Error;

pub use ledger::{
    LedgerClearScope, PayoutId, PayoutRecord, PayoutRequest, PayoutStatus, RevenueBreakdown, RevenueEntry,
    RevenueKind, RevenueSource, COMMISSION_RATE,
};
pub use pricing::{KitPricing, KitPricingRegistry};
pub use registry::{NewTeam, TeamRegistry, TeamStats};
pub use team::{
    BankingDetails, DocumentDraft, Fixture, FixtureDraft, Payment, PaymentDraft, Player, PlayerDraft, Team,
    TeamDocument, TeamDraft, TeamId, TeamMessage, TeamProfilePatch, TeamStatus,
};

/// Team error types
#[derive(Debug, Error)]
pub enum TeamError {
    #[error("team {0} not found")]
    TeamNotFound(TeamId),

    #[error("player {player_id} not found on team {team_id}")]
    PlayerNotFound { team_id: TeamId, player_id: u64 },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Payout workflow errors
#[derive(Debug, Error)]
pub enum PayoutError {
    #[error("team {0} not found")]
    TeamNotFound(TeamId),

    #[error("team {0} has no revenue to pay out")]
    NoRevenue(TeamId),

    #[error("team {team_id} already has pending payout request {request_id}")]
    PendingExists { team_id: TeamId, request_id: PayoutId },

    #[error("payout request {0} not found")]
    NotFound(PayoutId),

    #[error("payout request {id} cannot move from {from} to {to}")]
    InvalidTransition { id: PayoutId, from: PayoutStatus, to: PayoutStatus },
}

pub type Result<T> = std::result::Result<T, TeamError>;
