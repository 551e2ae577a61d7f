//! Email placeholder rendering
//!
//! Tokens are `{name}`, matched case-sensitively. A token without a value is
//! left in the output exactly as written.

use std::collections::HashMap;

/// Tokens the default templates use
pub const PLACEHOLDERS: &[&str] = &[
    "teamName",
    "coachName",
    "registrationId",
    "orderNumber",
    "orderDate",
    "totalAmount",
    "orderItems",
    "shippingAddress",
    "customerName",
    "customerEmail",
    "customerPhone",
    "amount",
    "markup",
    "commission",
    "requestDate",
    "requestId",
    "phone",
    "adminLink",
    "playerName",
    "parentName",
    "loginUrl",
    "email",
    "password",
];

/// Values to substitute, keyed by token name
#[derive(Debug, Clone, Default)]
pub struct Placeholders {
    values: HashMap<String, String>,
}

impl Placeholders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Substitute every known `{token}` in one pass; substituted text is not rescanned
pub fn render(template: &str, values: &Placeholders) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let token = after
            .find('}')
            .map(|close| &after[..close])
            .filter(|name| !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));

        match token.and_then(|name| values.get(name).map(|v| (name, v))) {
            Some((name, value)) => {
                out.push_str(value);
                rest = &after[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_known_tokens() {
        let values = Placeholders::new().with("teamName", "Lions").with("registrationId", "0042");
        assert_eq!(
            render("Registration #{registrationId} for {teamName}", &values),
            "Registration #0042 for Lions"
        );
    }

    #[test]
    fn test_unknown_tokens_left_verbatim() {
        let values = Placeholders::new().with("teamName", "Lions");
        assert_eq!(render("{teamName} {password} {TeamName}", &values), "Lions {password} {TeamName}");
        assert_eq!(render("braces { alone } and {}", &values), "braces { alone } and {}");
        assert_eq!(render("unterminated {teamName", &values), "unterminated {teamName");
    }

    #[test]
    fn test_no_rescan_of_values() {
        let values = Placeholders::new().with("coachName", "{teamName}").with("teamName", "Lions");
        assert_eq!(render("Hi {coachName}", &values), "Hi {teamName}");
    }
}
