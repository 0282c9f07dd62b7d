//! A directory of user presets.
//!
//! [`PresetLibrary`] keeps one TOML file per preset under a root directory
//! chosen by the caller. Files are named after a slug of the preset name, so
//! `"Warm Lead #2"` lives in `warm_lead_2.toml`. Names are unique within a
//! library, and so are slugs.
//!
//! Libraries can be exchanged as a single JSON array with
//! [`export_json`](PresetLibrary::export_json) and
//! [`import_json`](PresetLibrary::import_json).
//!
//! # Example
//!
//! ```rust
//! use tonechain_config::{ImportPolicy, PresetLibrary, get_factory_preset};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let library = PresetLibrary::open(dir.path().join("presets")).unwrap();
//!
//! library.save(&get_factory_preset("crunch").unwrap()).unwrap();
//! assert!(library.contains("Crunch"));
//!
//! let json = library.export_json(&[]).unwrap();
//! let other = PresetLibrary::open(dir.path().join("other")).unwrap();
//! let report = other.import_json(&json, ImportPolicy::Skip).unwrap();
//! assert_eq!(report.imported, 1);
//! ```

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::ConfigError;
use crate::preset::Preset;

/// Extension of preset files inside a library.
const PRESET_EXTENSION: &str = "toml";

/// What [`PresetLibrary::import_json`] does with a preset whose name is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportPolicy {
    /// Keep the stored preset and count the import as skipped.
    #[default]
    Skip,
    /// Replace the stored preset.
    Overwrite,
    /// Record the clash in [`ImportReport::errors`].
    Reject,
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Presets written under a name that was free.
    pub imported: usize,
    /// Presets that replaced a stored one.
    pub overwritten: usize,
    /// Presets left out because the name was taken.
    pub skipped: usize,
    /// One message per preset that could not be imported.
    pub errors: Vec<String>,
}

/// File-backed collection of presets.
#[derive(Debug, Clone)]
pub struct PresetLibrary {
    root: PathBuf,
}

impl PresetLibrary {
    /// Open the library at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let root = root.into();
        if !root.exists() {
            std::fs::create_dir_all(&root).map_err(|e| ConfigError::create_dir(&root, e))?;
        }
        tracing::debug!(root = %root.display(), "preset library opened");
        Ok(Self { root })
    }

    /// Directory holding the preset files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File a preset called `name` is stored in.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root
            .join(preset_slug(name))
            .with_extension(PRESET_EXTENSION)
    }

    /// Preset files in the library directory, sorted by path.
    ///
    /// Returns an empty vector if the directory can't be read.
    pub fn files(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Vec::new();
        };
        let mut files: Vec<_> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext == PRESET_EXTENSION)
            })
            .collect();
        files.sort();
        files
    }

    /// Every readable preset, sorted by name ignoring case.
    ///
    /// Files that fail to load are logged and left out.
    pub fn presets(&self) -> Vec<Preset> {
        let mut presets: Vec<_> = self
            .files()
            .into_iter()
            .filter_map(|path| match Preset::load(&path) {
                Ok(preset) => Some(preset),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable preset");
                    None
                }
            })
            .collect();
        presets.sort_by_key(|p| p.name.to_lowercase());
        presets
    }

    /// Presets carrying any of `tags` and matching `search`, sorted by name.
    ///
    /// An empty tag list or a missing query does not filter.
    pub fn list(&self, tags: &[&str], search: Option<&str>) -> Vec<Preset> {
        self.presets()
            .into_iter()
            .filter(|p| tags.is_empty() || tags.iter().any(|t| p.has_tag(t)))
            .filter(|p| search.is_none_or(|q| p.matches_search(q)))
            .collect()
    }

    /// Names of every stored preset, sorted ignoring case.
    pub fn names(&self) -> Vec<String> {
        self.presets().into_iter().map(|p| p.name).collect()
    }

    /// Number of preset files, readable or not.
    pub fn len(&self) -> usize {
        self.files().len()
    }

    /// Whether the library holds no presets.
    pub fn is_empty(&self) -> bool {
        self.files().is_empty()
    }

    /// Whether a preset called exactly `name` is stored.
    pub fn contains(&self, name: &str) -> bool {
        self.stored(name).is_some()
    }

    /// Load the preset called `name`.
    pub fn get(&self, name: &str) -> Result<Preset, ConfigError> {
        self.stored(name)
            .ok_or_else(|| ConfigError::PresetNotFound(name.to_string()))
    }

    /// Store a new preset. Fails if its name, or its file, is already taken.
    pub fn save(&self, preset: &Preset) -> Result<PathBuf, ConfigError> {
        let path = self.path_for(&preset.name);
        if path.exists() {
            return Err(ConfigError::DuplicatePreset(preset.name.clone()));
        }
        preset.save(&path)?;
        tracing::info!(name = %preset.name, path = %path.display(), "preset saved");
        Ok(path)
    }

    /// Replace the preset called `name` with `preset`, stamping `modified_at`.
    ///
    /// `preset` may carry a new name as long as no other preset holds it.
    pub fn update(&self, name: &str, mut preset: Preset) -> Result<Preset, ConfigError> {
        let old_path = self.stored_path(name)?;
        let new_path = self.path_for(&preset.name);
        if new_path != old_path && new_path.exists() {
            return Err(ConfigError::DuplicatePreset(preset.name));
        }

        preset.touch();
        preset.save(&new_path)?;
        if new_path != old_path {
            std::fs::remove_file(&old_path).map_err(|e| ConfigError::write_file(&old_path, e))?;
        }
        tracing::info!(from = name, to = %preset.name, "preset updated");
        Ok(preset)
    }

    /// Delete the preset called `name`.
    pub fn delete(&self, name: &str) -> Result<(), ConfigError> {
        let path = self.stored_path(name)?;
        std::fs::remove_file(&path).map_err(|e| ConfigError::write_file(&path, e))?;
        tracing::info!(name, "preset deleted");
        Ok(())
    }

    /// Serialize presets as one pretty-printed JSON array.
    ///
    /// An empty `names` exports the whole library. Naming a preset that is
    /// not stored fails without exporting anything.
    pub fn export_json(&self, names: &[&str]) -> Result<String, ConfigError> {
        let presets = if names.is_empty() {
            self.presets()
        } else {
            names
                .iter()
                .map(|name| self.get(name))
                .collect::<Result<Vec<_>, _>>()?
        };
        tracing::debug!(count = presets.len(), "presets exported");
        Ok(serde_json::to_string_pretty(&presets)?)
    }

    /// Store every preset from a JSON array produced by [`export_json`](Self::export_json).
    ///
    /// A document that is not a JSON array fails as a whole. Individual
    /// presets that fail to parse or validate are reported in
    /// [`ImportReport::errors`] and do not stop the rest.
    pub fn import_json(&self, json: &str, policy: ImportPolicy) -> Result<ImportReport, ConfigError> {
        let entries: Vec<Value> = serde_json::from_str(json)?;
        let mut report = ImportReport::default();

        for entry in entries {
            let label = entry
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            if let Err(e) = self.import_one(entry, policy, &mut report) {
                report
                    .errors
                    .push(format!("failed to import preset '{label}': {e}"));
            }
        }

        tracing::info!(
            imported = report.imported,
            overwritten = report.overwritten,
            skipped = report.skipped,
            errors = report.errors.len(),
            "preset import finished"
        );
        Ok(report)
    }

    fn import_one(
        &self,
        entry: Value,
        policy: ImportPolicy,
        report: &mut ImportReport,
    ) -> Result<(), ConfigError> {
        let preset: Preset = serde_json::from_value(entry)?;
        preset.validate()?;

        let path = self.path_for(&preset.name);
        if !path.exists() {
            preset.save(&path)?;
            report.imported += 1;
            return Ok(());
        }
        match policy {
            ImportPolicy::Skip => report.skipped += 1,
            ImportPolicy::Overwrite => {
                preset.save(&path)?;
                report.overwritten += 1;
            }
            ImportPolicy::Reject => return Err(ConfigError::DuplicatePreset(preset.name)),
        }
        Ok(())
    }

    /// Path of the stored preset called exactly `name`.
    fn stored_path(&self, name: &str) -> Result<PathBuf, ConfigError> {
        self.stored(name)
            .map(|_| self.path_for(name))
            .ok_or_else(|| ConfigError::PresetNotFound(name.to_string()))
    }

    fn stored(&self, name: &str) -> Option<Preset> {
        let path = self.path_for(name);
        if !path.is_file() {
            return None;
        }
        Preset::load(&path).ok().filter(|p| p.name == name)
    }
}

/// File stem for a preset name: lowercase ASCII letters and digits, with
/// every other run of characters collapsed to one underscore.
///
/// ```rust
/// use tonechain_config::preset_slug;
///
/// assert_eq!(preset_slug("Warm Lead #2"), "warm_lead_2");
/// assert_eq!(preset_slug("  ???  "), "preset");
/// ```
pub fn preset_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("preset");
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect_config::EffectConfig;
    use tempfile::TempDir;

    fn library() -> (TempDir, PresetLibrary) {
        let dir = TempDir::new().unwrap();
        let library = PresetLibrary::open(dir.path().join("presets")).unwrap();
        (dir, library)
    }

    fn preset(name: &str, tags: &[&str]) -> Preset {
        let mut preset = Preset::new(name).with_effect(EffectConfig::new("boost"));
        for tag in tags {
            preset = preset.with_tag(*tag);
        }
        preset
    }

    #[test]
    fn slug_collapses_punctuation() {
        assert_eq!(preset_slug("Crunch"), "crunch");
        assert_eq!(preset_slug("My  Tone!!"), "my_tone");
        assert_eq!(preset_slug("__x--y__"), "x_y");
        assert_eq!(preset_slug("Ünïcode"), "n_code");
    }

    #[test]
    fn open_creates_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("a/b");
        let library = PresetLibrary::open(&root).unwrap();
        assert!(root.is_dir());
        assert!(library.is_empty());
        assert_eq!(library.path_for("Lead"), root.join("lead.toml"));
    }

    #[test]
    fn save_rejects_taken_names() {
        let (_dir, library) = library();
        library.save(&preset("Lead", &[])).unwrap();
        assert!(matches!(
            library.save(&preset("Lead", &[])),
            Err(ConfigError::DuplicatePreset(name)) if name == "Lead"
        ));
        // Different name, same file.
        assert!(matches!(
            library.save(&preset("lead", &[])),
            Err(ConfigError::DuplicatePreset(_))
        ));
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn save_rejects_invalid_preset() {
        let (_dir, library) = library();
        let bad = Preset::new("Bad").with_tag("two words");
        assert!(matches!(library.save(&bad), Err(ConfigError::Validation(_))));
        assert!(library.is_empty());
    }

    #[test]
    fn list_filters_and_sorts() {
        let (_dir, library) = library();
        library.save(&preset("zephyr", &["ambient"])).unwrap();
        library.save(&preset("Alpha", &["rhythm"])).unwrap();
        library
            .save(&preset("Mid", &["ambient", "lead"]).with_description("wide shimmer"))
            .unwrap();

        let names = |presets: Vec<Preset>| presets.into_iter().map(|p| p.name).collect::<Vec<_>>();
        assert_eq!(names(library.list(&[], None)), ["Alpha", "Mid", "zephyr"]);
        assert_eq!(names(library.list(&["AMBIENT"], None)), ["Mid", "zephyr"]);
        assert_eq!(names(library.list(&["rhythm", "lead"], None)), ["Alpha", "Mid"]);
        assert_eq!(names(library.list(&["ambient"], Some("shimmer"))), ["Mid"]);
        assert!(library.list(&["missing"], None).is_empty());
        assert_eq!(library.names(), ["Alpha", "Mid", "zephyr"]);
    }

    #[test]
    fn unreadable_files_are_skipped() {
        let (_dir, library) = library();
        library.save(&preset("Good", &[])).unwrap();
        std::fs::write(library.root().join("broken.toml"), "name = [").unwrap();
        std::fs::write(library.root().join("notes.txt"), "not a preset").unwrap();

        assert_eq!(library.files().len(), 2);
        assert_eq!(library.names(), ["Good"]);
    }

    #[test]
    fn get_and_delete() {
        let (_dir, library) = library();
        library.save(&preset("Lead", &["solo"])).unwrap();

        assert!(library.get("Lead").unwrap().has_tag("solo"));
        assert!(matches!(library.get("lead"), Err(ConfigError::PresetNotFound(_))));

        library.delete("Lead").unwrap();
        assert!(!library.contains("Lead"));
        assert!(matches!(library.delete("Lead"), Err(ConfigError::PresetNotFound(_))));
    }

    #[test]
    fn update_renames_and_guards_names() {
        let (_dir, library) = library();
        let original = preset("Lead", &[]);
        library.save(&original).unwrap();
        library.save(&preset("Rhythm", &[])).unwrap();

        let renamed = library
            .update("Lead", original.clone().with_description("now louder"))
            .unwrap();
        assert!(renamed.modified_at >= original.modified_at);
        assert_eq!(
            library.get("Lead").unwrap().description.as_deref(),
            Some("now louder")
        );

        let mut clash = original.clone();
        clash.name = "Rhythm".into();
        assert!(matches!(
            library.update("Lead", clash),
            Err(ConfigError::DuplicatePreset(_))
        ));

        let mut moved = original;
        moved.name = "Solo".into();
        library.update("Lead", moved).unwrap();
        assert_eq!(library.names(), ["Rhythm", "Solo"]);
        assert!(!library.path_for("Lead").exists());
    }

    #[test]
    fn export_selected_or_all() {
        let (_dir, library) = library();
        library.save(&preset("One", &[])).unwrap();
        library.save(&preset("Two", &[])).unwrap();

        let all: Vec<Preset> = serde_json::from_str(&library.export_json(&[]).unwrap()).unwrap();
        assert_eq!(all.len(), 2);
        let one: Vec<Preset> = serde_json::from_str(&library.export_json(&["Two"]).unwrap()).unwrap();
        assert_eq!(one, [library.get("Two").unwrap()]);
        assert!(matches!(
            library.export_json(&["Two", "Three"]),
            Err(ConfigError::PresetNotFound(name)) if name == "Three"
        ));
    }

    #[test]
    fn import_follows_policy() {
        let (_dir, source) = library();
        source.save(&preset("Shared", &["new"])).unwrap();
        source.save(&preset("Fresh", &[])).unwrap();
        let json = source.export_json(&[]).unwrap();

        let (_other_dir, target) = library();
        target.save(&preset("Shared", &["old"])).unwrap();

        let report = target.import_json(&json, ImportPolicy::Skip).unwrap();
        assert_eq!((report.imported, report.skipped, report.overwritten), (1, 1, 0));
        assert!(target.get("Shared").unwrap().has_tag("old"));

        let report = target.import_json(&json, ImportPolicy::Reject).unwrap();
        assert_eq!(report.imported, 0);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].contains("already exists"));

        let report = target.import_json(&json, ImportPolicy::Overwrite).unwrap();
        assert_eq!(report.overwritten, 2);
        assert!(target.get("Shared").unwrap().has_tag("new"));
        assert_eq!(target.len(), 2);
    }

    #[test]
    fn import_reports_bad_entries() {
        let (_dir, library) = library();
        let json = r#"[
            {"name": "Fine", "effects": [{"type": "delay"}]},
            {"name": "Loud", "effects": [{"type": "boost", "params": {"gain_db": "90dB"}}]},
            {"name": 7},
            {"effects": []}
        ]"#;
        let report = library.import_json(json, ImportPolicy::Skip).unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(report.errors.len(), 3);
        assert!(report.errors[0].contains("'Loud'"));
        assert!(report.errors[1].contains("'unknown'"));
        assert_eq!(library.names(), ["Fine"]);
    }

    #[test]
    fn import_requires_array() {
        let (_dir, library) = library();
        assert!(matches!(
            library.import_json(r#"{"name": "Solo"}"#, ImportPolicy::Skip),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            library.import_json("not json", ImportPolicy::Skip),
            Err(ConfigError::Json(_))
        ));
    }
}
