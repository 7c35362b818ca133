//! Scenario content types for TOML deserialization.
//!
//! These structures define the authored content of the quiz: scripted
//! conversations, the decision options offered at the end of each one,
//! and the outcomes the options resolve to. Content is static and
//! immutable once loaded.

use serde::{Deserialize, Serialize};

use crate::core::types::{CategoryId, MessageId, OptionId, OutcomeId, ScenarioId};

/// Who a transcript message is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The simulated contact driving the conversation
    Contact,
    /// The player's own side of the conversation
    User,
    /// Annotation messages, excluded from transcript rendering
    System,
}

/// A file or media item attached to a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// Attachment kind (e.g. "apk", "image", "pdf")
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
}

/// One message in a scenario's scripted conversation
///
/// Authored order is conversational chronology and must be preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub content: String,
    /// Display timestamp (e.g. "11:03 AM"); purely presentational
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

/// One of the responses the player can pick at the decision point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionOption {
    pub id: OptionId,
    pub text: String,
    /// Whether picking this option represents a safe decision
    pub is_correct: bool,
}

/// The result shown after a decision, with explanation and advice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub id: OutcomeId,
    pub title: String,
    pub description: String,
    pub is_correct: bool,
    /// Ordered explanation bullet points
    pub explanation: Vec<String>,
    pub advice: String,
}

/// Closed set of content icons, mapped to presentation assets by the shell
///
/// Replaces a string-keyed icon lookup; unknown names fail content
/// validation at load time instead of silently rendering nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IconTag {
    Ticket,
    TrendingUp,
    Briefcase,
    CreditCard,
    ShoppingBag,
    FileText,
    Users,
    Video,
    Key,
    Monitor,
    #[default]
    MessageCircle,
}

/// A self-contained simulated conversation with a decision point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    pub title: String,
    pub description: String,
    pub category_id: CategoryId,
    /// Display name of the simulated contact
    pub contact_name: String,
    /// Presence line shown under the contact name
    #[serde(default = "default_contact_status")]
    pub contact_status: String,
    #[serde(default)]
    pub icon: IconTag,
    pub messages: Vec<Message>,
    pub options: Vec<DecisionOption>,
    pub outcomes: Vec<Outcome>,
}

fn default_contact_status() -> String {
    "online".to_string()
}

impl Scenario {
    /// Messages that appear in the rendered transcript (system messages
    /// are reserved for future annotations and never rendered)
    pub fn visible_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.sender != Sender::System)
    }

    /// The final rendered message; its visibility drives the reveal
    /// state machine
    pub fn final_message(&self) -> Option<&Message> {
        self.visible_messages().last()
    }

    /// Look up a decision option by id
    pub fn option(&self, id: &OptionId) -> Option<&DecisionOption> {
        self.options.iter().find(|o| &o.id == id)
    }
}

/// Risk classification for a scenario category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Grouping of scenarios for browsing and filtering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub icon: IconTag,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: &str, sender: Sender) -> Message {
        Message {
            id: MessageId(id.to_string()),
            sender,
            content: "hello".to_string(),
            timestamp: None,
            attachment: None,
        }
    }

    #[test]
    fn test_visible_messages_skip_system() {
        let scenario = Scenario {
            id: ScenarioId(1),
            title: "Test".to_string(),
            description: String::new(),
            category_id: CategoryId(1),
            contact_name: "Subrat".to_string(),
            contact_status: "online".to_string(),
            icon: IconTag::default(),
            messages: vec![
                message("msg1", Sender::Contact),
                message("msg2", Sender::System),
                message("msg3", Sender::User),
            ],
            options: vec![],
            outcomes: vec![],
        };

        let visible: Vec<_> = scenario.visible_messages().collect();
        assert_eq!(visible.len(), 2);
        assert_eq!(scenario.final_message().unwrap().id.0, "msg3");
    }

    #[test]
    fn test_icon_tag_parses_kebab_case() {
        let tag: IconTag = toml::Value::String("trending-up".to_string())
            .try_into()
            .unwrap();
        assert_eq!(tag, IconTag::TrendingUp);

        let unknown: Result<IconTag, _> =
            toml::Value::String("sparkles".to_string()).try_into();
        assert!(unknown.is_err());
    }

    #[test]
    fn test_message_toml_round_trip() {
        let toml_src = r#"
            id = "msg1"
            sender = "contact"
            content = "You won a prize!"
            timestamp = "11:03 AM"

            [attachment]
            type = "apk"
            name = "claim_prize.apk"
        "#;

        let message: Message = toml::from_str(toml_src).unwrap();
        assert_eq!(message.sender, Sender::Contact);
        assert_eq!(message.attachment.as_ref().unwrap().kind, "apk");
        assert_eq!(message.timestamp.as_deref(), Some("11:03 AM"));
    }

    #[test]
    fn test_contact_status_defaults_to_online() {
        let toml_src = r#"
            id = 7
            title = "Minimal"
            description = "desc"
            category_id = 1
            contact_name = "Asha"

            [[messages]]
            id = "msg1"
            sender = "contact"
            content = "hi"

            [[options]]
            id = "opt1"
            text = "ok"
            is_correct = true

            [[outcomes]]
            id = "out1"
            title = "Safe Choice!"
            description = "d"
            is_correct = true
            explanation = ["fine"]
            advice = "a"
        "#;

        let scenario: Scenario = toml::from_str(toml_src).unwrap();
        assert_eq!(scenario.contact_status, "online");
        assert_eq!(scenario.icon, IconTag::MessageCircle);
    }
}
