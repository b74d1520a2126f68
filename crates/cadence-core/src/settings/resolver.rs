//! Effective settings lookup by ancestor walk

use crate::card::DeckTree;

use super::Settings;

/// Where the effective settings came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsSource {
    Global,
    Deck { id: String, name: String },
}

impl SettingsSource {
    /// Display label: the owning deck's name, or "Global"
    pub fn label(&self) -> &str {
        match self {
            SettingsSource::Global => "Global",
            SettingsSource::Deck { name, .. } => name,
        }
    }
}

/// Settings in effect for one deck
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSettings<'a> {
    pub settings: &'a Settings,
    pub source: SettingsSource,
}

/// Resolve the settings for `deck_id`.
///
/// The closest deck (itself included) with an active override wins; its
/// settings replace everything above it. Otherwise the global default applies.
pub fn resolve<'a>(deck_id: &str, tree: &DeckTree<'a>, global: &'a Settings) -> ResolvedSettings<'a> {
    if tree.get(deck_id).is_none() {
        tracing::warn!(deck = %deck_id, "Unknown deck; using global settings");
    }

    for deck in tree.ancestors(deck_id) {
        if let Some(settings) = deck.override_settings() {
            return ResolvedSettings {
                settings,
                source: SettingsSource::Deck {
                    id: deck.id.clone(),
                    name: deck.name.clone(),
                },
            };
        }
    }

    ResolvedSettings {
        settings: global,
        source: SettingsSource::Global,
    }
}
