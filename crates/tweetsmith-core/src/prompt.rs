//! ============================================================================
//! Prompt Builder - Messages sent to the completion API
//! ============================================================================
//! Two variants:
//! - Basic: a single fixed user instruction
//! - Branded: a system block with brand voice, length limit, hashtag policy,
//!   call to action and the current timestamp, followed by the instruction
//!
//! Constraints in the prompt are advisory only. Nothing checks the model's
//! output against them.
//! ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed instruction used by the basic variant
pub const BASIC_PROMPT: &str = "tweet something cool for #techtwitter";

/// Platform limit stated to the model in the branded variant
pub const TWEET_CHAR_LIMIT: usize = 280;

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Brand settings for the branded variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandVoice {
    pub name: String,
    pub voice: String,
    pub hashtags: Vec<String>,
    pub max_hashtags: usize,
    pub call_to_action: String,
}

impl Default for BrandVoice {
    fn default() -> Self {
        Self {
            name: "Tweetsmith".to_string(),
            voice: "upbeat, witty and developer-friendly".to_string(),
            hashtags: vec!["#techtwitter".to_string(), "#buildinpublic".to_string()],
            max_hashtags: 2,
            call_to_action: "Invite readers to follow for more".to_string(),
        }
    }
}

/// Which prompt to send
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PromptVariant {
    #[default]
    Basic,
    Branded(BrandVoice),
}

impl PromptVariant {
    /// Build the message list for a request made at `now`
    pub fn messages(&self, now: DateTime<Utc>) -> Vec<ChatMessage> {
        match self {
            PromptVariant::Basic => vec![ChatMessage::user(BASIC_PROMPT)],
            PromptVariant::Branded(brand) => vec![
                ChatMessage::system(brand.system_prompt(now)),
                ChatMessage::user(format!(
                    "Write one promotional tweet for {}.",
                    brand.name
                )),
            ],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PromptVariant::Basic => "basic",
            PromptVariant::Branded(_) => "branded",
        }
    }
}

impl BrandVoice {
    fn system_prompt(&self, now: DateTime<Utc>) -> String {
        let hashtags = if self.hashtags.is_empty() {
            "Do not use hashtags.".to_string()
        } else {
            format!(
                "Use at most {} hashtags, chosen from: {}.",
                self.max_hashtags,
                self.hashtags.join(" ")
            )
        };

        format!(
            "You are the social media voice of {name}. Your tone is {voice}.\n\n\
            Rules:\n\
            - Keep the tweet under {limit} characters, including hashtags.\n\
            - {hashtags}\n\
            - End with a call to action: {cta}.\n\
            - Reply with the tweet text only, no quotes or commentary.\n\n\
            The current time is {time}. Make the tweet feel timely.",
            name = self.name,
            voice = self.voice,
            limit = TWEET_CHAR_LIMIT,
            hashtags = hashtags,
            cta = self.call_to_action,
            time = now.to_rfc2822(),
        )
    }
}
