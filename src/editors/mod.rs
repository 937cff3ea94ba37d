//! Editor registry: the ordered collection of configured external editors.
//!
//! The registry owns the single-default invariant: a non-empty collection
//! always has exactly one default editor, an empty collection has none.
//! Every mutation persists through the [`SettingsStore`] seam so the host's
//! settings stay the source of truth across sessions.

mod store;


pub use store::{CachedSettings, MemorySettings, SettingsStore, TomlSettings};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::validate;

/// A configured external editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Immutable unique id, assigned on add.
    pub id: String,
    pub name: String,
    /// Path to the editor executable.
    pub path: String,
    #[serde(default)]
    pub is_default: bool,
    /// Editor family hint ("intellij", "webstorm", ...). Free-form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Immutable creation timestamp.
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`EditorRegistry::add`].
#[derive(Debug, Clone, Default)]
pub struct NewEditor {
    pub name: String,
    pub path: String,
    pub kind: Option<String>,
    pub make_default: bool,
}

/// Field changes for [`EditorRegistry::update`]. `None` leaves a field
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct EditorUpdate {
    pub name: Option<String>,
    pub path: Option<String>,
    pub kind: Option<String>,
}

/// Ordered editor collection with persistence.
pub struct EditorRegistry {
    editors: Vec<EditorConfig>,
    store: Box<dyn SettingsStore>,
}

impl EditorRegistry {
    /// Load the registry from a settings store, repairing the default
    /// invariant if the stored data violates it.
    pub fn open(store: Box<dyn SettingsStore>) -> Result<Self> {
        let editors = store.load()?;
        let mut registry = Self { editors, store };
        registry.ensure_single_default();
        Ok(registry)
    }

    /// Add an editor. The first editor added to an empty registry becomes
    /// the default regardless of `make_default`.
    pub fn add(&mut self, new: NewEditor) -> Result<EditorConfig> {
        if new.name.trim().is_empty() {
            return Err(Error::validation("editor name must not be empty"));
        }
        validate::non_empty_path(&new.path, "editor path")?;

        let now = Utc::now();
        let make_default = new.make_default || self.editors.is_empty();
        let mut editor = EditorConfig {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            path: new.path,
            is_default: false,
            kind: new.kind,
            created_at: now,
            updated_at: now,
        };
        if make_default {
            for existing in &mut self.editors {
                if existing.is_default {
                    existing.is_default = false;
                    existing.updated_at = now;
                }
            }
            editor.is_default = true;
        }
        let added = editor.clone();
        self.editors.push(editor);
        self.persist()?;
        Ok(added)
    }

    /// Apply field changes. Id and creation timestamp are immutable.
    pub fn update(&mut self, id: &str, changes: EditorUpdate) -> Result<EditorConfig> {
        if let Some(path) = &changes.path {
            validate::non_empty_path(path, "editor path")?;
        }
        if let Some(name) = &changes.name {
            if name.trim().is_empty() {
                return Err(Error::validation("editor name must not be empty"));
            }
        }
        let editor = self
            .editors
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::UnknownEditor { id: id.to_string() })?;
        if let Some(name) = changes.name {
            editor.name = name;
        }
        if let Some(path) = changes.path {
            editor.path = path;
        }
        if let Some(kind) = changes.kind {
            editor.kind = Some(kind);
        }
        editor.updated_at = Utc::now();
        let updated = editor.clone();
        self.persist()?;
        Ok(updated)
    }

    /// Remove an editor. When the default is removed and entries remain,
    /// the first remaining entry becomes the default.
    pub fn remove(&mut self, id: &str) -> Result<EditorConfig> {
        let position = self
            .editors
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| Error::UnknownEditor { id: id.to_string() })?;
        let removed = self.editors.remove(position);
        self.ensure_single_default();
        self.persist()?;
        Ok(removed)
    }

    /// Make `id` the single default editor.
    pub fn set_default(&mut self, id: &str) -> Result<()> {
        if !self.editors.iter().any(|e| e.id == id) {
            return Err(Error::UnknownEditor { id: id.to_string() });
        }
        self.mark_default(id);
        self.persist()
    }

    pub fn get(&self, id: &str) -> Option<&EditorConfig> {
        self.editors.iter().find(|e| e.id == id)
    }

    /// Resolve a user-supplied selector: exact id, id prefix, or name.
    pub fn resolve(&self, selector: &str) -> Option<&EditorConfig> {
        self.get(selector)
            .or_else(|| self.editors.iter().find(|e| e.name == selector))
            .or_else(|| {
                self.editors
                    .iter()
                    .find(|e| selector.len() >= 8 && e.id.starts_with(selector))
            })
    }

    pub fn default_editor(&self) -> Option<&EditorConfig> {
        self.editors.iter().find(|e| e.is_default)
    }

    pub fn list(&self) -> &[EditorConfig] {
        &self.editors
    }

    pub fn len(&self) -> usize {
        self.editors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.editors.is_empty()
    }

    fn mark_default(&mut self, id: &str) {
        for editor in &mut self.editors {
            let make_default = editor.id == id;
            if editor.is_default != make_default {
                editor.is_default = make_default;
                editor.updated_at = Utc::now();
            }
        }
    }

    /// Repair the invariant: exactly one default when non-empty, none when
    /// empty. Keeps the first default when the stored data carries several.
    fn ensure_single_default(&mut self) {
        let mut seen_default = false;
        for editor in &mut self.editors {
            if editor.is_default {
                if seen_default {
                    editor.is_default = false;
                }
                seen_default = true;
            }
        }
        if !seen_default {
            if let Some(first) = self.editors.first_mut() {
                first.is_default = true;
            }
        }
    }

    fn persist(&self) -> Result<()> {
        self.store.save(&self.editors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> EditorRegistry {
        EditorRegistry::open(Box::new(MemorySettings::default())).unwrap()
    }

    fn editor(name: &str) -> NewEditor {
        NewEditor {
            name: name.to_string(),
            path: format!("/opt/{name}/bin/{name}"),
            kind: None,
            make_default: false,
        }
    }

    #[test]
    fn first_added_editor_becomes_default() {
        let mut reg = registry();
        let idea = reg.add(editor("idea")).unwrap();
        assert!(idea.is_default);

        let clion = reg.add(editor("clion")).unwrap();
        assert!(!clion.is_default);
        assert_eq!(reg.default_editor().unwrap().name, "idea");
    }

    #[test]
    fn make_default_on_add_displaces_previous_default() {
        let mut reg = registry();
        reg.add(editor("idea")).unwrap();
        let mut second = editor("clion");
        second.make_default = true;
        reg.add(second).unwrap();

        assert_eq!(reg.default_editor().unwrap().name, "clion");
        assert_eq!(reg.list().iter().filter(|e| e.is_default).count(), 1);
    }

    #[test]
    fn removing_the_default_promotes_the_first_remaining() {
        let mut reg = registry();
        let idea = reg.add(editor("idea")).unwrap();
        reg.add(editor("clion")).unwrap();
        reg.add(editor("pycharm")).unwrap();

        reg.remove(&idea.id).unwrap();
        assert_eq!(reg.default_editor().unwrap().name, "clion");
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn removing_the_last_editor_leaves_no_default() {
        let mut reg = registry();
        let idea = reg.add(editor("idea")).unwrap();
        reg.remove(&idea.id).unwrap();
        assert!(reg.default_editor().is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn set_default_is_exclusive() {
        let mut reg = registry();
        reg.add(editor("idea")).unwrap();
        let clion = reg.add(editor("clion")).unwrap();

        reg.set_default(&clion.id).unwrap();
        assert_eq!(reg.default_editor().unwrap().id, clion.id);
        assert_eq!(reg.list().iter().filter(|e| e.is_default).count(), 1);

        assert!(reg.set_default("no-such-id").is_err());
    }

    #[test]
    fn update_bumps_updated_at_and_keeps_identity() {
        let mut reg = registry();
        let idea = reg.add(editor("idea")).unwrap();

        let updated = reg
            .update(
                &idea.id,
                EditorUpdate {
                    name: Some("IntelliJ IDEA".to_string()),
                    ..EditorUpdate::default()
                },
            )
            .unwrap();

        assert_eq!(updated.id, idea.id);
        assert_eq!(updated.created_at, idea.created_at);
        assert_eq!(updated.name, "IntelliJ IDEA");
        assert!(updated.updated_at >= idea.updated_at);
    }

    #[test]
    fn update_rejects_empty_fields() {
        let mut reg = registry();
        let idea = reg.add(editor("idea")).unwrap();
        assert!(reg
            .update(
                &idea.id,
                EditorUpdate {
                    path: Some(String::new()),
                    ..EditorUpdate::default()
                }
            )
            .is_err());
    }

    #[test]
    fn resolve_matches_id_name_and_id_prefix() {
        let mut reg = registry();
        let idea = reg.add(editor("idea")).unwrap();

        assert_eq!(reg.resolve(&idea.id).unwrap().id, idea.id);
        assert_eq!(reg.resolve("idea").unwrap().id, idea.id);
        assert_eq!(reg.resolve(&idea.id[..8]).unwrap().id, idea.id);
        assert!(reg.resolve("nope").is_none());
    }
}
