pub mod gate;
pub mod keywords;
pub mod sentiment;

use crate::platform::IncomingMessage;
use crate::triage::keywords::DetectionResult;
use crate::triage::sentiment::SentimentResult;

/// Everything downstream stages know about one message.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageContext {
    pub message: IncomingMessage,
    pub detection: DetectionResult,
    pub sentiment: SentimentResult,
}

impl MessageContext {
    /// Run keyword detection and the sentiment heuristic over the message text.
    pub fn analyze(message: IncomingMessage) -> Self {
        let detection = keywords::detect(&message.text);
        let sentiment = sentiment::analyze(&message.text);
        Self {
            message,
            detection,
            sentiment,
        }
    }

    pub fn has_keywords(&self) -> bool {
        !self.detection.is_empty()
    }

    /// Worth a conversation log entry: on-topic or emotionally salient.
    pub fn is_notable(&self) -> bool {
        self.has_keywords() || self.sentiment.needs_empathy() || self.sentiment.needs_celebration()
    }
}
