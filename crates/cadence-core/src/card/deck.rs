//! Deck forest and its parent index

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Item;
use crate::settings::{ConfigError, Settings};

/// A deck node; owns its items and child decks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub children: Vec<Deck>,
    #[serde(default)]
    pub has_custom_settings: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_settings: Option<Settings>,
}

impl Deck {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Active override: the flag is set and settings are present
    pub fn override_settings(&self) -> Option<&Settings> {
        match (self.has_custom_settings, &self.custom_settings) {
            (true, Some(settings)) => Some(settings),
            (true, None) => {
                tracing::warn!(deck = %self.id, "Deck flags custom settings but has none; inheriting");
                None
            }
            _ => None,
        }
    }

    /// Depth-first search for an item in this subtree
    pub fn find_item_mut(&mut self, item_id: &str) -> Option<&mut Item> {
        if let Some(pos) = self.items.iter().position(|i| i.id == item_id) {
            return self.items.get_mut(pos);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_item_mut(item_id))
    }

    /// Depth-first search for a deck in this subtree
    pub fn find_deck_mut(&mut self, deck_id: &str) -> Option<&mut Deck> {
        if self.id == deck_id {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_deck_mut(deck_id))
    }

    /// Validate every override in this subtree
    pub fn validate_settings(&self) -> Result<(), ConfigError> {
        if let Some(settings) = &self.custom_settings {
            settings.validate()?;
        }
        self.children.iter().try_for_each(Deck::validate_settings)
    }

    /// Item count in this subtree
    pub fn total_items(&self) -> usize {
        self.items.len() + self.children.iter().map(Deck::total_items).sum::<usize>()
    }
}

/// Read-only view over a deck forest with a parent index
///
/// Built once per snapshot; lookups and ancestor walks do not rescan the tree.
#[derive(Debug)]
pub struct DeckTree<'a> {
    roots: &'a [Deck],
    decks: HashMap<&'a str, &'a Deck>,
    parents: HashMap<&'a str, &'a str>,
    item_owner: HashMap<&'a str, &'a str>,
}

impl<'a> DeckTree<'a> {
    pub fn new(roots: &'a [Deck]) -> Self {
        let mut tree = Self {
            roots,
            decks: HashMap::new(),
            parents: HashMap::new(),
            item_owner: HashMap::new(),
        };
        for root in roots {
            tree.index(root, None);
        }
        tree
    }

    fn index(&mut self, deck: &'a Deck, parent: Option<&'a str>) {
        // A duplicate is shadowed by the first deck with its id, but its
        // children stay reachable and hang off that first deck
        if self.decks.contains_key(deck.id.as_str()) {
            tracing::warn!(
                deck = %deck.id,
                children = deck.children.len(),
                "Duplicate deck id; keeping the first occurrence and indexing its children under it"
            );
        } else {
            self.decks.insert(deck.id.as_str(), deck);
            if let Some(parent) = parent {
                self.parents.insert(deck.id.as_str(), parent);
            }
            for item in &deck.items {
                self.item_owner
                    .entry(item.id.as_str())
                    .or_insert(deck.id.as_str());
            }
        }
        for child in &deck.children {
            self.index(child, Some(deck.id.as_str()));
        }
    }

    pub fn roots(&self) -> &'a [Deck] {
        self.roots
    }

    pub fn get(&self, deck_id: &str) -> Option<&'a Deck> {
        self.decks.get(deck_id).copied()
    }

    pub fn parent(&self, deck_id: &str) -> Option<&'a Deck> {
        self.parents.get(deck_id).and_then(|p| self.get(p))
    }

    /// The deck itself followed by its ancestors up to the root
    pub fn ancestors(&self, deck_id: &str) -> Vec<&'a Deck> {
        let mut chain = Vec::new();
        let mut current = self.get(deck_id);
        while let Some(deck) = current {
            chain.push(deck);
            current = self.parent(&deck.id);
        }
        chain
    }

    /// Locate an item and the deck that owns it
    pub fn find_item(&self, item_id: &str) -> Option<(&'a Item, &'a Deck)> {
        let deck = self.get(self.item_owner.get(item_id)?)?;
        let item = deck.items.iter().find(|i| i.id == item_id)?;
        Some((item, deck))
    }

    pub fn len(&self) -> usize {
        self.decks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decks.is_empty()
    }
}
