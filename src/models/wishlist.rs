use serde::{Deserialize, Serialize};

use super::{Identified, ItemId};

/// Something the household wants to buy, optionally with a shop link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishItem {
    #[serde(default)]
    pub id: ItemId,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub done: bool,
}

impl WishItem {
    pub fn new(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            text: text.into(),
            url: url.into(),
            done: false,
        }
    }

    pub fn has_link(&self) -> bool {
        self.url.starts_with("http://") || self.url.starts_with("https://")
    }
}

impl Identified for WishItem {
    fn id(&self) -> ItemId {
        self.id
    }

    fn set_id(&mut self, id: ItemId) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.text
    }
}
