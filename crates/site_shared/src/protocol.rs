use serde::{Deserialize, Serialize};

use crate::domain::FieldKey;

/// Hosted form relay that forwards contact messages by email.
pub const FORM_RELAY_ENDPOINT: &str = "https://formspree.io/f/mpwrjqyw";

/// JSON body accepted by the form relay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPayload {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactPayload {
    pub fn field(&self, key: FieldKey) -> &str {
        match key {
            FieldKey::Name => &self.name,
            FieldKey::Email => &self.email,
            FieldKey::Subject => &self.subject,
            FieldKey::Message => &self.message,
        }
    }

    pub fn field_mut(&mut self, key: FieldKey) -> &mut String {
        match key {
            FieldKey::Name => &mut self.name,
            FieldKey::Email => &mut self.email,
            FieldKey::Subject => &mut self.subject,
            FieldKey::Message => &mut self.message,
        }
    }
}
