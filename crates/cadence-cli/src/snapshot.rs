//! JSON snapshot persistence
//!
//! A snapshot is the whole study collection in one file: global settings, the
//! deck forest with items and scheduling records, the introduced-today set
//! and the append-only review log.

use std::path::{Path, PathBuf};

use cadence_core::{
    ConfigError, Deck, IntroducedToday, Item, ItemKind, ReviewLog, Settings, StepList,
};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Environment variable naming the snapshot file
pub const SNAPSHOT_ENV: &str = "CADENCE_SNAPSHOT";

/// Snapshot error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Snapshot file missing
    #[error("Snapshot not found: {0} (run `cadence init` to create one)")]
    NotFound(PathBuf),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed JSON
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Invalid settings
    #[error("Invalid settings: {0}")]
    Config(#[from] ConfigError),
    /// Platform data directory unavailable
    #[error("Could not determine project directories")]
    NoDataDir,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub settings: Settings,
    pub decks: Vec<Deck>,
    pub introduced_today: IntroducedToday,
    pub review_log: Vec<ReviewLog>,
}

impl Snapshot {
    /// Read, parse and validate a snapshot
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        if !path.exists() {
            return Err(SnapshotError::NotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        snapshot.validate()?;
        tracing::debug!(
            path = %path.display(),
            decks = snapshot.decks.len(),
            "Loaded snapshot"
        );
        Ok(snapshot)
    }

    /// Validate global settings and every deck override
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.settings.validate()?;
        self.decks.iter().try_for_each(Deck::validate_settings)
    }

    /// Write through a temporary file so a failed write never truncates
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(self)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Mutable lookup of an item anywhere in the forest
    pub fn find_item_mut(&mut self, item_id: &str) -> Option<&mut Item> {
        self.decks
            .iter_mut()
            .find_map(|deck| deck.find_item_mut(item_id))
    }

    /// A small demo collection
    pub fn example() -> Self {
        let mut verbs = Deck::new("spanish::verbs", "Verbs");
        verbs.items = [("ser", "to be"), ("tener", "to have"), ("hacer", "to do")]
            .iter()
            .enumerate()
            .map(|(i, (front, back))| {
                let mut item = Item::with_id(format!("es-verb-{i}"));
                item.content = serde_json::json!({ "front": front, "back": back });
                item.new_card_order = i as u64;
                item.family_id = Some(format!("es-verb-note-{i}"));
                item.tags = vec!["verbs".into()];
                item
            })
            .collect();

        let mut quiz = Item::with_id("es-quiz-0");
        quiz.kind = ItemKind::MultipleChoice;
        quiz.content = serde_json::json!({
            "question": "Which verb means 'to be'?",
            "choices": ["ser", "tener", "hacer"],
            "answer": 0
        });
        quiz.new_card_order = 10;

        let mut spanish = Deck::new("spanish", "Spanish");
        spanish.items.push(quiz);
        spanish.children.push(verbs);
        spanish.has_custom_settings = true;
        spanish.custom_settings = Some(Settings {
            new_per_day: 10,
            learning_steps: StepList::from_minutes(vec![1, 10, 60]),
            ..Default::default()
        });

        let mut capitals = Deck::new("geography", "Geography");
        capitals.items = [("France", "Paris"), ("Japan", "Tokyo")]
            .iter()
            .enumerate()
            .map(|(i, (country, city))| {
                let mut item = Item::with_id(format!("geo-{i}"));
                item.content = serde_json::json!({ "front": country, "back": city });
                item.new_card_order = i as u64;
                item
            })
            .collect();

        Self {
            settings: Settings::default(),
            decks: vec![spanish, capitals],
            introduced_today: IntroducedToday::default(),
            review_log: Vec::new(),
        }
    }
}

/// Snapshot path: explicit flag, then `CADENCE_SNAPSHOT`, then the platform data dir
pub fn resolve_path(explicit: Option<PathBuf>) -> Result<PathBuf, SnapshotError> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    if let Ok(path) = std::env::var(SNAPSHOT_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    let proj_dirs = ProjectDirs::from("com", "cadence", "cli").ok_or(SnapshotError::NoDataDir)?;
    Ok(proj_dirs.data_dir().join("snapshot.json"))
}
