/// Story manifest: which CSV sources make up a game and where each starts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::core::loader::{self, DialogueGraph, LoadError, LoadOptions};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("unknown story: {0}")]
    UnknownStory(String),
    #[error("ending {ending} refers to unknown story {story}")]
    UnknownEndingStory { ending: String, story: String },
    #[error("failed to load story {story}: {source}")]
    Load {
        story: String,
        #[source]
        source: LoadError,
    },
}

/// One story source: a CSV file and the node it opens on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryEntry {
    pub path: String,
    pub start: String,
}

/// An ending reached by playing a story source to its end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndingEntry {
    pub id: String,
    pub story: String,
    #[serde(default)]
    pub title: String,
}

/// The manifest as authored in RON.
///
/// ```ron
/// (
///     default_story: "prologue",
///     stories: {
///         "prologue": (path: "prologue.csv", start: "pre_0001"),
///     },
///     endings: [(id: "end1", story: "end_failed", title: "Failed")],
///     strict: false,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryManifest {
    pub default_story: String,
    pub stories: BTreeMap<String, StoryEntry>,
    #[serde(default)]
    pub endings: Vec<EndingEntry>,
    /// Reject stories that load with warnings.
    #[serde(default)]
    pub strict: bool,
}

impl StoryManifest {
    /// Load a manifest from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<StoryManifest, ManifestError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a manifest from a RON string and check its cross references.
    pub fn parse_ron(input: &str) -> Result<StoryManifest, ManifestError> {
        let manifest: StoryManifest = ron::from_str(input)?;
        manifest.story(&manifest.default_story)?;
        for ending in &manifest.endings {
            if !manifest.stories.contains_key(&ending.story) {
                return Err(ManifestError::UnknownEndingStory {
                    ending: ending.id.clone(),
                    story: ending.story.clone(),
                });
            }
        }
        Ok(manifest)
    }

    pub fn story(&self, name: &str) -> Result<&StoryEntry, ManifestError> {
        self.stories
            .get(name)
            .ok_or_else(|| ManifestError::UnknownStory(name.to_string()))
    }

    /// The ending a story source represents, if any.
    pub fn ending_for(&self, story: &str) -> Option<&EndingEntry> {
        self.endings.iter().find(|e| e.story == story)
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            strict: self.strict,
        }
    }

    /// Read and load the named story. Paths resolve against `base_dir`.
    pub fn load_story(&self, name: &str, base_dir: &Path) -> Result<DialogueGraph, ManifestError> {
        let entry = self.story(name)?;
        let contents = std::fs::read_to_string(base_dir.join(&entry.path))?;
        loader::load_with(&contents, &self.load_options()).map_err(|source| ManifestError::Load {
            story: name.to_string(),
            source,
        })
    }
}
