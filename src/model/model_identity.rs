use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    Narrator,
    Resolver,
    Vision,
}

/// A named backend: its role plus its position in that role's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelIdentity {
    pub role: ModelRole,
    pub slot: usize,
}

impl ModelIdentity {
    pub const fn narrator(slot: usize) -> Self {
        Self {
            role: ModelRole::Narrator,
            slot,
        }
    }

    pub const fn resolver(slot: usize) -> Self {
        Self {
            role: ModelRole::Resolver,
            slot,
        }
    }

    pub const fn vision() -> Self {
        Self {
            role: ModelRole::Vision,
            slot: 0,
        }
    }
}

impl fmt::Display for ModelIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match self.role {
            ModelRole::Narrator => "narrator",
            ModelRole::Resolver => "resolver",
            ModelRole::Vision => "vision",
        };
        write!(f, "{role}#{}", self.slot)
    }
}

/// Static mapping from identities to backend model strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelTable {
    pub narrators: Vec<String>,
    pub resolvers: Vec<String>,
    #[serde(default)]
    pub vision: Option<String>,
}

impl ModelTable {
    pub fn resolve(&self, identity: &ModelIdentity) -> Option<&str> {
        match identity.role {
            ModelRole::Narrator => self.narrators.get(identity.slot),
            ModelRole::Resolver => self.resolvers.get(identity.slot),
            ModelRole::Vision => self.vision.as_ref(),
        }
        .map(String::as_str)
    }
}

impl Default for ModelTable {
    fn default() -> Self {
        let deepseek = "deepseek-r1:latest".to_string();
        let qwen_vl = "bsahane/Qwen2.5-VL-7B-Instruct:Q4_K_M_benxh".to_string();

        Self {
            narrators: vec![deepseek, qwen_vl.clone()],
            resolvers: vec![qwen_vl.clone()],
            vision: Some(qwen_vl),
        }
    }
}
