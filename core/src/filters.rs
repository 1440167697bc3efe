//! Two-phase filter staging with named presets.
//!
//! The store keeps two independent condition sets. `active` is what queries
//! run with; `pending` is an edit buffer the UI mutates while a filter dialog
//! is open. `apply_pending` is the single moment edits become query-visible,
//! which keeps the dialog cancellable without partial-apply artifacts.

use periscope_protocol::FilterCondition;
use periscope_protocol::FilterPatch;
use periscope_protocol::MatchMode;
use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Immutable snapshot of an active filter set, saved under a user-chosen
/// name. Later edits to the active set never touch a preset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilterPreset {
    pub id: String,
    pub name: String,
    pub filters: Vec<FilterCondition>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct FilterStore {
    active: Vec<FilterCondition>,
    pending: Vec<FilterCondition>,
    staging: bool,
    match_mode: MatchMode,
    presets: Vec<FilterPreset>,
}

impl FilterStore {
    pub fn active(&self) -> &[FilterCondition] {
        &self.active
    }

    pub fn pending(&self) -> &[FilterCondition] {
        &self.pending
    }

    pub fn staging(&self) -> bool {
        self.staging
    }

    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    pub fn presets(&self) -> &[FilterPreset] {
        &self.presets
    }

    pub fn add_active(&mut self, condition: FilterCondition) {
        self.active.push(condition);
    }

    /// Returns whether a condition with `id` existed and was updated.
    pub fn update_active(&mut self, id: &str, patch: FilterPatch) -> bool {
        update_in(&mut self.active, id, patch)
    }

    /// Returns whether a condition with `id` existed and was removed.
    pub fn remove_active(&mut self, id: &str) -> bool {
        remove_from(&mut self.active, id)
    }

    /// Enter edit mode: pending becomes an independent copy of active.
    pub fn open_staging(&mut self) {
        self.pending = self.active.clone();
        self.staging = true;
    }

    pub fn add_pending(&mut self, condition: FilterCondition) {
        self.pending.push(condition);
    }

    pub fn update_pending(&mut self, id: &str, patch: FilterPatch) -> bool {
        update_in(&mut self.pending, id, patch)
    }

    pub fn remove_pending(&mut self, id: &str) -> bool {
        remove_from(&mut self.pending, id)
    }

    /// Replace active with the edit buffer and leave edit mode.
    pub fn apply_pending(&mut self) {
        self.active = self.pending.clone();
        self.staging = false;
    }

    /// Throw the edit buffer away and leave edit mode; active is untouched.
    pub fn discard_pending(&mut self) {
        self.pending = self.active.clone();
        self.staging = false;
    }

    /// Returns whether the mode actually changed.
    pub fn set_match_mode(&mut self, mode: MatchMode) -> bool {
        if self.match_mode == mode {
            return false;
        }
        self.match_mode = mode;
        true
    }

    /// Snapshot the active set under `name`. Blank names are rejected as a
    /// no-op.
    pub fn save_preset(&mut self, name: &str) -> Option<&FilterPreset> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.presets.push(FilterPreset {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            filters: self.active.clone(),
            created_at: OffsetDateTime::now_utc(),
        });
        self.presets.last()
    }

    /// Replace active with a copy of the preset's filters. Unknown ids are a
    /// no-op, never an error. Returns whether anything was loaded.
    pub fn load_preset(&mut self, id: &str) -> bool {
        let Some(preset) = self.presets.iter().find(|preset| preset.id == id) else {
            return false;
        };
        self.active = preset.filters.clone();
        true
    }

    /// Returns whether a preset with `id` existed and was removed.
    pub fn delete_preset(&mut self, id: &str) -> bool {
        let before = self.presets.len();
        self.presets.retain(|preset| preset.id != id);
        self.presets.len() != before
    }

    /// Collection-change cascade: drop both condition sets, close staging,
    /// and return the match mode to its default. Presets survive.
    pub fn reset(&mut self) {
        self.active.clear();
        self.pending.clear();
        self.staging = false;
        self.match_mode = MatchMode::default();
    }
}

fn update_in(conditions: &mut [FilterCondition], id: &str, patch: FilterPatch) -> bool {
    match conditions.iter_mut().find(|condition| condition.id == id) {
        Some(condition) => {
            condition.apply(patch);
            true
        }
        None => false,
    }
}

fn remove_from(conditions: &mut Vec<FilterCondition>, id: &str) -> bool {
    let before = conditions.len();
    conditions.retain(|condition| condition.id != id);
    conditions.len() != before
}
