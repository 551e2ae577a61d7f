//! Team registry
//!
//! Profiles, revenue entries and payout requests share one lock so that ledger
//! operations can check team state and write in a single critical section.

use chrono::Utc;
use league_common::{generate_temporary_password, hash_password, verify_password};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use crate::ledger::{PayoutId, PayoutRequest, RevenueEntry};
use crate::team::{
    BankingDetails, DocumentDraft, Fixture, FixtureDraft, Payment, PaymentDraft, Player, PlayerDraft, Team,
    TeamDocument, TeamDraft, TeamId, TeamMessage, TeamProfilePatch, TeamStatus,
};
use crate::{Result, TeamError};

/// Registration form field holding the selected team's submission id
pub(crate) struct RegistryState {
    pub(crate) teams: BTreeMap<TeamId, Team>,
    pub(crate) revenue: HashMap<TeamId, Vec<RevenueEntry>>,
    pub(crate) payouts: BTreeMap<PayoutId, PayoutRequest>,
    next_team_id: TeamId,
    pub(crate) next_payout_id: PayoutId,
    next_item_id: u64,
}

impl RegistryState {
    /// Ids for players, messages, documents, revenue entries ...
    pub(crate) fn next_item_id(&mut self) -> u64 {
        let id = self.next_item_id;
        self.next_item_id += 1;
        id
    }

    pub(crate) fn team_mut(&mut self, id: TeamId) -> Result<&mut Team> {
        self.teams.get_mut(&id).ok_or(TeamError::TeamNotFound(id))
    }
}

/// A freshly created team with its one-time temporary password
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeam {
    pub team: Team,
    pub temporary_password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeamStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub active: usize,
    pub suspended: usize,
}

/// Team registry
pub struct TeamRegistry {
    pub(crate) state: RwLock<RegistryState>,
}

impl TeamRegistry {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState {
                teams: BTreeMap::new(),
                revenue: HashMap::new(),
                payouts: BTreeMap::new(),
                next_team_id: 1,
                next_payout_id: 1,
                next_item_id: 1,
            }),
        }
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    /// Create a team with a generated temporary password
    pub fn create(&self, draft: TeamDraft) -> Result<NewTeam> {
        let team_name = draft.team_name.trim();
        if team_name.is_empty() {
            return Err(TeamError::Validation("team name is required".into()));
        }

        let temporary_password = generate_temporary_password();
        let password_hash = hash_password(&temporary_password)?;
        let now = Utc::now();

        let mut state = self.state.write();
        let id = state.next_team_id;
        state.next_team_id += 1;

        let team = Team {
            id,
            form_submission_id: draft.form_submission_id,
            team_name: team_name.to_string(),
            manager_name: draft.manager_name,
            manager_phone: draft.manager_phone,
            email: draft.email.trim().to_string(),
            phone: draft.phone,
            password_hash,
            submission_data: draft.submission_data,
            status: TeamStatus::Pending,
            created_at: now,
            updated_at: now,
            last_login: None,
            players: Vec::new(),
            documents: Vec::new(),
            messages: Vec::new(),
            fixtures: Vec::new(),
            payments: Vec::new(),
            payouts: Vec::new(),
            banking_details: None,
        };
        state.teams.insert(id, team.clone());
        tracing::info!(team_id = id, team = %team.team_name, "team profile created");

        Ok(NewTeam { team, temporary_password })
    }

    /// Create the profile for an approved registration submission
    pub fn create_from_submission(&self, submission_id: u64, data: &Map<String, Value>) -> Result<NewTeam> {
        if let Some(existing) = self.by_submission(submission_id) {
            return Err(TeamError::Validation(format!(
                "submission {} already has team {}",
                submission_id, existing.id
            )));
        }
        self.create(TeamDraft::from_submission(submission_id, data))
    }

    /// All teams, newest first
    pub fn list(&self) -> Vec<Team> {
        let mut teams: Vec<Team> = self.state.read().teams.values().cloned().collect();
        teams.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        teams
    }

    pub fn get(&self, id: TeamId) -> Option<Team> {
        self.state.read().teams.get(&id).cloned()
    }

    pub fn by_email(&self, email: &str) -> Option<Team> {
        self.find(|t| !t.email.is_empty() && t.email.eq_ignore_ascii_case(email))
    }

    pub fn by_name(&self, team_name: &str) -> Option<Team> {
        self.find(|t| t.team_name.eq_ignore_ascii_case(team_name))
    }

    pub fn by_submission(&self, submission_id: u64) -> Option<Team> {
        self.find(|t| t.form_submission_id == Some(submission_id))
    }

    /// Main team for a player registration, given the submissions picked in
    /// the player form's dropdowns: the first one a team was created from.
    /// Sub-team choice does not matter.
    pub fn main_team_for_player(&self, picked: &[u64]) -> Option<TeamId> {
        picked.iter().find_map(|id| self.by_submission(*id)).map(|t| t.id)
    }

    pub fn update_profile(&self, id: TeamId, patch: TeamProfilePatch) -> Result<Team> {
        if matches!(&patch.team_name, Some(name) if name.trim().is_empty()) {
            return Err(TeamError::Validation("team name is required".into()));
        }
        self.mutate(id, |team| {
            if let Some(name) = patch.team_name {
                team.team_name = name.trim().to_string();
            }
            if let Some(manager_name) = patch.manager_name {
                team.manager_name = manager_name;
            }
            if let Some(manager_phone) = patch.manager_phone {
                team.manager_phone = manager_phone;
            }
            if let Some(phone) = patch.phone {
                team.phone = phone;
            }
            Ok(team.clone())
        })
    }

    pub fn update_password(&self, id: TeamId, new_password: &str) -> Result<()> {
        if !self.state.read().teams.contains_key(&id) {
            return Err(TeamError::TeamNotFound(id));
        }
        let hash = hash_password(new_password)?;
        self.mutate(id, |team| {
            team.password_hash = hash;
            Ok(())
        })?;
        tracing::info!(team_id = id, "team password changed");
        Ok(())
    }

    pub fn update_email(&self, id: TeamId, email: &str) -> Result<Team> {
        let email = email.trim();
        if !email.contains('@') {
            return Err(TeamError::Validation(format!("'{}' is not an email address", email)));
        }
        self.mutate(id, |team| {
            team.email = email.to_string();
            Ok(team.clone())
        })
    }

    pub fn update_banking_details(&self, id: TeamId, details: BankingDetails) -> Result<Team> {
        self.mutate(id, |team| {
            team.banking_details = Some(BankingDetails {
                updated_at: Some(Utc::now()),
                ..details
            });
            Ok(team.clone())
        })
    }

    /// Sign in by email or team name. Stamps `last_login` on success.
    pub fn verify_credentials(&self, identifier: &str, password: &str) -> Option<Team> {
        let identifier = identifier.trim();
        let (id, hash) = {
            let state = self.state.read();
            let team = state.teams.values().find(|t| t.matches_identifier(identifier))?;
            (team.id, team.password_hash.clone())
        };

        if !verify_password(password, &hash) {
            tracing::warn!(team_id = id, "team sign-in rejected");
            return None;
        }

        let mut state = self.state.write();
        let team = state.teams.get_mut(&id)?;
        team.last_login = Some(Utc::now());
        Some(team.clone())
    }

    pub fn update_status(&self, id: TeamId, status: TeamStatus) -> Result<Team> {
        let team = self.mutate(id, |team| {
            team.status = status;
            Ok(team.clone())
        })?;
        tracing::info!(team_id = id, status = ?status, "team status updated");
        Ok(team)
    }

    /// Remove a team and its revenue entries. Payout requests stay for audit.
    pub fn delete(&self, id: TeamId) -> bool {
        let mut state = self.state.write();
        let removed = state.teams.remove(&id).is_some();
        if removed {
            state.revenue.remove(&id);
            tracing::info!(team_id = id, "team deleted");
        }
        removed
    }

    pub fn stats(&self) -> TeamStats {
        let state = self.state.read();
        let count = |status: TeamStatus| state.teams.values().filter(|t| t.status == status).count();
        TeamStats {
            total: state.teams.len(),
            pending: count(TeamStatus::Pending),
            approved: count(TeamStatus::Approved),
            active: count(TeamStatus::Active),
            suspended: count(TeamStatus::Suspended),
        }
    }

    // =========================================================================
    // Players
    // =========================================================================

    pub fn add_player(&self, team_id: TeamId, draft: PlayerDraft) -> Result<Player> {
        if draft.name.trim().is_empty() {
            return Err(TeamError::Validation("player name is required".into()));
        }
        self.mutate_state(team_id, |state| {
            let player = Player {
                id: state.next_item_id(),
                name: draft.name.trim().to_string(),
                sub_team: draft.sub_team,
                details: draft.details,
                added_at: Utc::now(),
            };
            state.team_mut(team_id)?.players.push(player.clone());
            Ok(player)
        })
    }

    pub fn remove_player(&self, team_id: TeamId, player_id: u64) -> Result<bool> {
        self.mutate(team_id, |team| {
            let before = team.players.len();
            team.players.retain(|p| p.id != player_id);
            Ok(team.players.len() != before)
        })
    }

    /// Reassign a player to another sub-team
    pub fn move_player(&self, team_id: TeamId, player_id: u64, sub_team: &str) -> Result<Player> {
        self.mutate(team_id, |team| {
            let player = team
                .player_mut(player_id)
                .ok_or(TeamError::PlayerNotFound { team_id, player_id })?;
            player.sub_team = Some(sub_team.to_string());
            Ok(player.clone())
        })
    }

    /// Copy a player into another sub-team under a new id
    pub fn duplicate_player(&self, team_id: TeamId, player_id: u64, sub_team: &str) -> Result<Player> {
        self.mutate_state(team_id, |state| {
            let id = state.next_item_id();
            let team = state.team_mut(team_id)?;
            let source = team
                .player_mut(player_id)
                .ok_or(TeamError::PlayerNotFound { team_id, player_id })?;
            let copy = Player {
                id,
                sub_team: Some(sub_team.to_string()),
                added_at: Utc::now(),
                ..source.clone()
            };
            team.players.push(copy.clone());
            Ok(copy)
        })
    }

    // =========================================================================
    // Documents, messages, fixtures, payments
    // =========================================================================

    pub fn add_document(&self, team_id: TeamId, draft: DocumentDraft) -> Result<TeamDocument> {
        self.mutate_state(team_id, |state| {
            let document = TeamDocument {
                id: state.next_item_id(),
                name: draft.name,
                url: draft.url,
                uploaded_at: Utc::now(),
            };
            state.team_mut(team_id)?.documents.push(document.clone());
            Ok(document)
        })
    }

    pub fn add_message(&self, team_id: TeamId, message: &str, from_admin: bool) -> Result<TeamMessage> {
        if message.trim().is_empty() {
            return Err(TeamError::Validation("message is empty".into()));
        }
        self.mutate_state(team_id, |state| {
            let message = TeamMessage {
                id: state.next_item_id(),
                message: message.to_string(),
                from_admin,
                read: false,
                created_at: Utc::now(),
            };
            state.team_mut(team_id)?.messages.push(message.clone());
            Ok(message)
        })
    }

    /// Returns `false` when the message does not exist
    pub fn mark_message_read(&self, team_id: TeamId, message_id: u64) -> Result<bool> {
        let mut state = self.state.write();
        let team = state.team_mut(team_id)?;
        Ok(team
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .map(|m| m.read = true)
            .is_some())
    }

    /// Zero for unknown teams
    pub fn unread_count(&self, team_id: TeamId) -> usize {
        self.state
            .read()
            .teams
            .get(&team_id)
            .map(Team::unread_messages)
            .unwrap_or(0)
    }

    pub fn add_fixture(&self, team_id: TeamId, draft: FixtureDraft) -> Result<Fixture> {
        self.mutate_state(team_id, |state| {
            let fixture = Fixture {
                id: state.next_item_id(),
                opponent: draft.opponent,
                date: draft.date,
                venue: draft.venue,
                added_at: Utc::now(),
            };
            state.team_mut(team_id)?.fixtures.push(fixture.clone());
            Ok(fixture)
        })
    }

    pub fn add_payment(&self, team_id: TeamId, draft: PaymentDraft) -> Result<Payment> {
        self.mutate_state(team_id, |state| {
            let payment = Payment {
                id: state.next_item_id(),
                amount: draft.amount,
                description: draft.description,
                recorded_at: Utc::now(),
            };
            state.team_mut(team_id)?.payments.push(payment.clone());
            Ok(payment)
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn find(&self, pred: impl Fn(&Team) -> bool) -> Option<Team> {
        self.state.read().teams.values().find(|t| pred(t)).cloned()
    }

    fn mutate<T>(&self, id: TeamId, f: impl FnOnce(&mut Team) -> Result<T>) -> Result<T> {
        let mut state = self.state.write();
        let team = state.team_mut(id)?;
        team.touch();
        f(team)
    }

    /// Like `mutate`, for changes that also draw ids from the registry
    fn mutate_state<T>(&self, id: TeamId, f: impl FnOnce(&mut RegistryState) -> Result<T>) -> Result<T> {
        let mut state = self.state.write();
        state.team_mut(id)?.touch();
        f(&mut *state)
    }
}

impl Default for TeamRegistry {
    fn default() -> Self {
        Self::new()
    }
}
