//! Team profile types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ledger::PayoutRecord;

pub type TeamId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamStatus {
    #[default]
    Pending,
    Approved,
    Active,
    Suspended,
}

/// Where payouts are sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankingDetails {
    pub account_holder: String,
    pub bank_name: String,
    pub account_number: String,
    pub branch_code: String,
    pub account_type: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub sub_team: Option<String>,
    /// Remaining registration details
    #[serde(flatten)]
    pub details: Map<String, Value>,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDraft {
    pub name: String,
    #[serde(default)]
    pub sub_team: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDocument {
    pub id: u64,
    pub name: String,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentDraft {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMessage {
    pub id: u64,
    pub message: String,
    pub from_admin: bool,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub id: u64,
    pub opponent: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureDraft {
    pub opponent: String,
    pub date: String,
    #[serde(default)]
    pub venue: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: u64,
    pub amount: Decimal,
    pub description: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentDraft {
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
}

/// A registered team
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    /// Registration submission the profile was created from
    pub form_submission_id: Option<u64>,
    pub team_name: String,
    pub manager_name: String,
    pub manager_phone: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub(crate) password_hash: String,
    pub submission_data: Map<String, Value>,
    pub status: TeamStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub players: Vec<Player>,
    pub documents: Vec<TeamDocument>,
    pub messages: Vec<TeamMessage>,
    pub fixtures: Vec<Fixture>,
    pub payments: Vec<Payment>,
    pub payouts: Vec<PayoutRecord>,
    pub banking_details: Option<BankingDetails>,
}

impl Team {
    pub fn unread_messages(&self) -> usize {
        self.messages.iter().filter(|m| !m.read).count()
    }

    /// Case-insensitive match on email or team name
    pub fn matches_identifier(&self, identifier: &str) -> bool {
        self.email.eq_ignore_ascii_case(identifier) || self.team_name.eq_ignore_ascii_case(identifier)
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub(crate) fn player_mut(&mut self, player_id: u64) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }
}

/// Profile fields for a new team
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDraft {
    pub team_name: String,
    #[serde(default)]
    pub manager_name: String,
    #[serde(default)]
    pub manager_phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub form_submission_id: Option<u64>,
    #[serde(default)]
    pub submission_data: Map<String, Value>,
}

const TEAM_NAME_KEYS: &[&str] = &["teamName", "team-name", "Team Name"];
const MANAGER_NAME_KEYS: &[&str] = &["managerName", "team-manager-name", "coachName", "Coach Name", "Manager Name"];
const MANAGER_PHONE_KEYS: &[&str] = &["managerPhone", "manager-phone", "Manager Phone"];
const EMAIL_KEYS: &[&str] = &["email", "coach-email", "Team Email", "Coach Email", "Email"];
const PHONE_KEYS: &[&str] = &["phone", "coach-phone", "Coach Phone", "Phone"];

impl TeamDraft {
    /// Pull profile fields out of label-keyed registration data; first
    /// non-empty key wins.
    pub fn from_submission(submission_id: u64, data: &Map<String, Value>) -> Self {
        Self {
            team_name: first_text(data, TEAM_NAME_KEYS),
            manager_name: first_text(data, MANAGER_NAME_KEYS),
            manager_phone: first_text(data, MANAGER_PHONE_KEYS),
            email: first_text(data, EMAIL_KEYS),
            phone: first_text(data, PHONE_KEYS),
            form_submission_id: Some(submission_id),
            submission_data: data.clone(),
        }
    }
}

fn first_text(data: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| data.get(*k))
        .filter_map(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// Partial profile update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamProfilePatch {
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub manager_name: Option<String>,
    #[serde(default)]
    pub manager_phone: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_draft_from_registration_labels() {
        let data = json!({
            "100": "Lions Rugby Club",
            "Team Name": "Lions Rugby Club",
            "Manager Name": "John Smith",
            "Manager Phone": "0821234567",
            "Team Email": "john@lionsrugby.com"
        });
        let draft = TeamDraft::from_submission(9, data.as_object().unwrap());
        assert_eq!(draft.team_name, "Lions Rugby Club");
        assert_eq!(draft.manager_name, "John Smith");
        assert_eq!(draft.manager_phone, "0821234567");
        assert_eq!(draft.email, "john@lionsrugby.com");
        assert_eq!(draft.form_submission_id, Some(9));
    }

    #[test]
    fn test_draft_prefers_named_keys() {
        let data = json!({"teamName": "Tigers", "Team Name": "Ignored", "coachName": "", "Coach Name": "Ann"});
        let draft = TeamDraft::from_submission(1, data.as_object().unwrap());
        assert_eq!(draft.team_name, "Tigers");
        assert_eq!(draft.manager_name, "Ann");
        assert_eq!(draft.phone, "");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let now = Utc::now();
        let team = Team {
            id: 1,
            form_submission_id: None,
            team_name: "Lions".into(),
            manager_name: String::new(),
            manager_phone: String::new(),
            email: String::new(),
            phone: String::new(),
            password_hash: "$argon2id$secret".into(),
            submission_data: Map::new(),
            status: TeamStatus::Pending,
            created_at: now,
            updated_at: now,
            last_login: None,
            players: vec![],
            documents: vec![],
            messages: vec![],
            fixtures: vec![],
            payments: vec![],
            payouts: vec![],
            banking_details: None,
        };
        let value = serde_json::to_value(&team).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert_eq!(value["status"], "pending");
        assert_eq!(value["teamName"], "Lions");
    }
}
