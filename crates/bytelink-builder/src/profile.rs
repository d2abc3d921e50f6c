//! Profile-guided ordering.
//!
//! A profile names hot classes, strings and methods; their items move to the
//! front of the container, keeping relative order otherwise.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::container::ItemContainer;
use crate::items::Item;

/// Rank given to items a profile names.
const HOT: u8 = 0;

/// Profile input, as JSON:
///
/// ```json
/// { "classes": ["Lapp/Main;"], "strings": ["hello"], "methods": ["Lapp/Main;::main"] }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub classes: Vec<String>,
    pub strings: Vec<String>,
    /// `<class descriptor>::<method name>`; the method's code is hot.
    pub methods: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("cannot read profile {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid profile: {0}")]
    Json(#[from] serde_json::Error),
}

impl Profile {
    pub fn from_json(text: &str) -> Result<Self, ProfileError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.strings.is_empty() && self.methods.is_empty()
    }
}

impl ItemContainer {
    /// Rank items named by `profile` hot and move them first.
    ///
    /// Returns the number of hot items.
    pub fn apply_profile(&mut self, profile: &Profile) -> usize {
        let classes: HashSet<&str> = profile.classes.iter().map(String::as_str).collect();
        let strings: HashSet<&str> = profile.strings.iter().map(String::as_str).collect();
        let methods: HashSet<&str> = profile.methods.iter().map(String::as_str).collect();

        let mut hot = Vec::new();
        for &id in &self.order {
            let is_hot = match self.items.get(id) {
                Item::Class(class) => classes.contains(class.name.as_str()),
                Item::String(s) => strings.contains(s.data.as_str()),
                Item::Code(code) => code.sharers.iter().any(|&m| {
                    let method = self.items.method(m);
                    let key = format!(
                        "{}::{}",
                        self.class_name(method.class),
                        self.string(method.name)
                    );
                    methods.contains(key.as_str())
                }),
                _ => false,
            };
            if is_hot {
                hot.push(id);
            }
        }

        for &id in &hot {
            self.items.base_mut(id).pgo_rank = Some(HOT);
        }
        let items = &self.items;
        self.order
            .sort_by_key(|&id| items.base(id).pgo_rank.unwrap_or(u8::MAX));
        self.invalidate();

        debug!(hot = hot.len(), "profile applied");
        hot.len()
    }
}
