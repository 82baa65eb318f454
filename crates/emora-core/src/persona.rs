use emora_types::Category;

use crate::error::{EmoraError, Result};

/// The system instruction that frames assistant replies in a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Persona {
    pub category: Category,
    pub instruction: &'static str,
}

impl Persona {
    pub fn for_category(category: Category) -> Self {
        let instruction = match category {
            Category::Education => "You are Emora, an education guide.",
            Category::Ethical => "You are Emora, an ethics advisor.",
            Category::Personal => "You are Emora, a personal assistant.",
            Category::Emotional => "You are Emora, an emotional support guide.",
        };
        Self {
            category,
            instruction,
        }
    }

    /// Resolve a persona from a stored category name.
    pub fn resolve(name: &str) -> Result<Self> {
        let category = name
            .parse::<Category>()
            .map_err(|e| EmoraError::UnknownCategory(e.0))?;
        Ok(Self::for_category(category))
    }
}
