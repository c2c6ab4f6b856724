#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Player,
    Narrator,
    Resolver,
    System,
}

impl Speaker {
    /// Key used by the UI colour table.
    pub fn key(&self) -> &'static str {
        match self {
            Speaker::Player => "Player",
            Speaker::Narrator => "Narrator",
            Speaker::Resolver => "Resolver",
            Speaker::System => "System",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    Player(String),
    Narration { speaker: Speaker, text: String },
    System(String),
}

impl Message {
    pub fn speaker(&self) -> Speaker {
        match self {
            Message::Player(_) => Speaker::Player,
            Message::Narration { speaker, .. } => *speaker,
            Message::System(_) => Speaker::System,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Message::Player(t) | Message::System(t) => t,
            Message::Narration { text, .. } => text,
        }
    }
}
