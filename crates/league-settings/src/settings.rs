//! Admin settings document and its defaults

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Sections merged key-by-key instead of replaced wholesale
const NESTED_SECTIONS: [&str; 2] = ["teamPortalTemplate", "emailTemplates"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub subject: String,
    pub body: String,
}

impl EmailTemplate {
    fn new(subject: &str, body: &str) -> Self {
        Self {
            subject: subject.to_string(),
            body: body.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailTemplatePatch {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// Team portal branding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPortalTemplate {
    pub title: String,
    pub subtitle: String,
    pub header_start: String,
    pub header_end: String,
}

impl Default for TeamPortalTemplate {
    fn default() -> Self {
        Self {
            title: "Team Portal".into(),
            subtitle: "Manage your team, players, fixtures, and revenue".into(),
            header_start: "#000000".into(),
            header_end: "#dc0000".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPortalTemplatePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub header_start: Option<String>,
    #[serde(default)]
    pub header_end: Option<String>,
}

/// Persisted admin configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSettings {
    pub email: String,
    /// argon2 PHC string; empty until a password is set
    #[serde(default)]
    pub password_hash: String,
    pub supplier_email: String,
    pub team_portal_template: TeamPortalTemplate,
    pub email_templates: BTreeMap<String, EmailTemplate>,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            email: "admin@example.com".into(),
            password_hash: String::new(),
            supplier_email: "supplier@example.com".into(),
            team_portal_template: TeamPortalTemplate::default(),
            email_templates: default_email_templates(),
        }
    }
}

impl AdminSettings {
    pub fn view(&self) -> SettingsView {
        SettingsView {
            email: self.email.clone(),
            supplier_email: self.supplier_email.clone(),
            password_set: !self.password_hash.is_empty(),
            team_portal_template: self.team_portal_template.clone(),
            email_templates: self.email_templates.clone(),
        }
    }
}

/// Settings as shown to the admin UI, without the password hash
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub email: String,
    pub supplier_email: String,
    pub password_set: bool,
    pub team_portal_template: TeamPortalTemplate,
    pub email_templates: BTreeMap<String, EmailTemplate>,
}

/// Bulk update; present sections replace the stored ones
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub supplier_email: Option<String>,
    #[serde(default)]
    pub team_portal_template: Option<TeamPortalTemplate>,
    #[serde(default)]
    pub email_templates: Option<BTreeMap<String, EmailTemplate>>,
}

/// Overlay `stored` on `defaults`: stored wins per key, and the nested
/// sections merge one level deeper.
pub(crate) fn merge_over_defaults(defaults: Value, stored: Value) -> Value {
    let (mut base, stored) = match (defaults, stored) {
        (Value::Object(base), Value::Object(stored)) => (base, stored),
        (defaults, _) => return defaults,
    };

    for (key, value) in stored {
        let merged = match (base.remove(&key), value) {
            (Some(Value::Object(inner)), Value::Object(patch)) if NESTED_SECTIONS.contains(&key.as_str()) => {
                Value::Object(merge_shallow(inner, patch))
            }
            (_, value) => value,
        };
        base.insert(key, merged);
    }
    Value::Object(base)
}

fn merge_shallow(mut base: Map<String, Value>, patch: Map<String, Value>) -> Map<String, Value> {
    for (key, value) in patch {
        base.insert(key, value);
    }
    base
}

pub fn default_email_templates() -> BTreeMap<String, EmailTemplate> {
    let mut templates = BTreeMap::new();
    templates.insert(
        "pending".into(),
        EmailTemplate::new(
            "Registration Received - {teamName}",
            "Dear {coachName},\n\n\
             Thank you for submitting your team registration for {teamName}.\n\n\
             We have received your registration and it is currently being reviewed by our admin team.\n\n\
             Registration ID: #{registrationId}\n\
             Status: Pending Review\n\n\
             You will receive another email once your registration has been reviewed.\n\n\
             Best regards,\nLeague Administration",
        ),
    );
    templates.insert(
        "reviewed".into(),
        EmailTemplate::new(
            "Registration Under Review - {teamName}",
            "Dear {coachName},\n\n\
             Your team registration for {teamName} is currently under review.\n\n\
             Registration ID: #{registrationId}\n\
             Status: Under Review\n\n\
             We may contact you if any additional information is required.\n\n\
             Best regards,\nLeague Administration",
        ),
    );
    templates.insert(
        "complete".into(),
        EmailTemplate::new(
            "Registration Approved - {teamName}",
            "Dear {coachName},\n\n\
             Congratulations! Your team registration for {teamName} has been approved.\n\n\
             Registration ID: #{registrationId}\n\
             Status: Complete\n\n\
             You can sign in to the team portal at {loginUrl}.\n\n\
             Welcome to the league!\n\n\
             Best regards,\nLeague Administration",
        ),
    );
    templates.insert(
        "orderConfirmation".into(),
        EmailTemplate::new(
            "Order Confirmation - #{orderNumber}",
            "Dear {customerName},\n\n\
             Thank you for your order!\n\n\
             Order Number: #{orderNumber}\n\
             Order Date: {orderDate}\n\
             Total Amount: R{totalAmount}\n\n\
             Order Details:\n{orderItems}\n\n\
             Shipping Address:\n{shippingAddress}\n\n\
             Best regards,\nLeague Shop",
        ),
    );
    templates.insert(
        "supplierForward".into(),
        EmailTemplate::new(
            "New Product Order - #{orderNumber}",
            "New product order received:\n\n\
             Order Number: #{orderNumber}\n\
             Order Date: {orderDate}\n\
             Total Amount: R{totalAmount}\n\n\
             Customer Information:\n\
             Name: {customerName}\n\
             Email: {customerEmail}\n\
             Phone: {customerPhone}\n\n\
             Order Details:\n{orderItems}\n\n\
             Shipping Address:\n{shippingAddress}",
        ),
    );
    templates.insert(
        "payoutRequest".into(),
        EmailTemplate::new(
            "New Payout Request - {teamName}",
            "A new payout request has been submitted:\n\n\
             Team: {teamName}\n\
             Coach: {coachName}\n\
             Email: {email}\n\
             Phone: {phone}\n\n\
             Request ID: #{requestId}\n\
             Total Amount: R{amount}\n\n\
             Breakdown:\n\
             - Player Registration Markup: R{markup}\n\
             - Product Commission (10%): R{commission}\n\n\
             Request Date: {requestDate}\n\n\
             Admin Panel Link: {adminLink}/admin/payouts",
        ),
    );
    templates.insert(
        "parentPaymentSuccess".into(),
        EmailTemplate::new(
            "Registration Confirmed - {playerName}",
            "Dear {parentName},\n\n\
             Payment for {playerName} ({teamName}) was successful.\n\n\
             Order Number: #{orderNumber}\n\
             Total Amount: R{totalAmount}\n\n\
             Parent portal: {loginUrl}\n\
             Email: {email}\n\
             Password: {password}\n\n\
             Best regards,\nLeague Administration",
        ),
    );
    templates
}
