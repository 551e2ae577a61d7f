//! API Models

use league_forms::{
    ApprovalStatus, DisplayLocation, FieldDraft, FieldId, MoveDirection, NotificationOutcome, PageId, ReviewStatus,
    Submission, SubmissionData, TemplateId,
};
use league_orders::{Order, OrderStatus, OrderType};
use league_teams::{LedgerClearScope, PayoutRequest, RevenueBreakdown, RevenueEntry};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Standard API response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorResponse>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorResponse {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Acknowledgement for deletes and other bodiless operations
#[derive(Debug, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

// ============ Forms ============

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormQuery {
    pub category_id: Option<u64>,
    pub display_location: Option<DisplayLocation>,
}

#[derive(Debug, Deserialize)]
pub struct ActiveBody {
    pub active: bool,
}

/// New field, optionally addressed to a page
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCreate {
    #[serde(default)]
    pub page_id: Option<PageId>,
    #[serde(flatten)]
    pub field: FieldDraft,
}

#[derive(Debug, Deserialize)]
pub struct MoveBody {
    pub direction: MoveDirection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderBody {
    #[serde(default)]
    pub page_id: Option<PageId>,
    pub field_ids: Vec<FieldId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConvertBody {
    #[serde(default)]
    pub confirm: bool,
}

// ============ Submissions ============

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionQuery {
    pub form_id: Option<TemplateId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionCreate {
    pub form_id: TemplateId,
    pub data: SubmissionData,
}

#[derive(Debug, Deserialize)]
pub struct SubmissionDataBody {
    pub data: SubmissionData,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: ReviewStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalBody {
    pub approval_status: ApprovalStatus,
}

/// A committed change together with what happened to its email
#[derive(Debug, Serialize)]
pub struct Notified<T> {
    #[serde(flatten)]
    pub record: T,
    pub notification: NotificationOutcome,
}

pub type ApprovalResult = Notified<Submission>;

// ============ Designs ============

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignQuery {
    #[serde(default)]
    pub active_only: bool,
}

// ============ Settings ============

#[derive(Debug, Deserialize)]
pub struct EmailBody {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordBody {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResult {
    pub authenticated: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recipient {
    #[default]
    Admin,
    Supplier,
    /// The address given in `to`
    Address,
}

/// Placeholder values for rendering or sending an email template
#[derive(Debug, Default, Deserialize)]
pub struct TemplateSend {
    #[serde(default)]
    pub recipient: Recipient,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub values: HashMap<String, String>,
}

// ============ Teams ============

#[derive(Debug, Deserialize)]
pub struct TeamLogin {
    pub identifier: String,
    pub password: String,
}

/// Exactly one criterion is used, in this order
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamLookup {
    pub email: Option<String>,
    pub name: Option<String>,
    pub submission_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct TeamStatusBody {
    pub status: league_teams::TeamStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    pub message: String,
    #[serde(default = "default_from_admin")]
    pub from_admin: bool,
}

fn default_from_admin() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTeamBody {
    pub sub_team: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkupRevenue {
    pub player_name: String,
    pub markup: Decimal,
    #[serde(default)]
    pub submission_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionRevenue {
    pub customer_name: String,
    pub order_total: Decimal,
    pub order_number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerCredit {
    pub player_name: String,
}

#[derive(Debug, Serialize)]
pub struct RevenueSummary {
    pub entries: Vec<RevenueEntry>,
    pub breakdown: RevenueBreakdown,
}

// ============ Payouts ============

#[derive(Debug, Default, Deserialize)]
pub struct PayoutQuery {
    #[serde(default)]
    pub pending: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct PayoutDecision {
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PayoutProcess {
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub scope: LedgerClearScope,
}

pub type PayoutRequested = Notified<PayoutRequest>;

// ============ Orders ============

#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    #[serde(default, rename = "type")]
    pub order_type: Option<OrderType>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusBody {
    pub status: OrderStatus,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingBody {
    pub tracking_number: String,
    #[serde(default)]
    pub courier: String,
}

/// Customer confirmation and supplier forward for one order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderEmails {
    pub customer: NotificationOutcome,
    pub supplier: NotificationOutcome,
}

impl OrderEmails {
    pub fn skipped(reason: &str) -> Self {
        Self {
            customer: NotificationOutcome::Skipped(reason.to_string()),
            supplier: NotificationOutcome::Skipped(reason.to_string()),
        }
    }
}

/// A committed order with the commission it earned and its emails
#[derive(Debug, Serialize)]
pub struct OrderPlaced {
    #[serde(flatten)]
    pub order: Order,
    pub commission: Option<RevenueEntry>,
    pub notifications: OrderEmails,
}
