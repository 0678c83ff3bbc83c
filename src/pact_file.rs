use crate::{data::Interaction, error::Error};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

lazy_static! {
    static ref NAME_SANITIZER: Regex = Regex::new("[^a-z0-9]+").unwrap();
}

pub const DEFAULT_SPEC_VERSION: &str = "2.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
}

impl Participant {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PactMetadata {
    #[serde(rename = "pactSpecVersion")]
    pub pact_spec_version: String,
}

/// A persisted contract: the ordered interactions agreed between one
/// consumer/provider pair. Read-only once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pact {
    pub consumer: Participant,
    pub provider: Participant,
    pub interactions: Vec<Interaction>,
    pub metadata: PactMetadata,
}

impl Pact {
    pub fn new<C: Into<String>, P: Into<String>, V: Into<String>>(
        consumer: C,
        provider: P,
        interactions: Vec<Interaction>,
        spec_version: V,
    ) -> Self {
        Self {
            consumer: Participant::new(consumer),
            provider: Participant::new(provider),
            interactions,
            metadata: PactMetadata {
                pact_spec_version: spec_version.into(),
            },
        }
    }

    /// The deterministic artifact name for a consumer/provider pair,
    /// e.g. `PactUI` + `Projects Provider` -> `pactui-projects_provider.json`.
    pub fn file_name(consumer: &str, provider: &str) -> String {
        format!("{}-{}.json", sanitize(consumer), sanitize(provider))
    }

    pub fn file_path<P: AsRef<Path>>(artifact_dir: P, consumer: &str, provider: &str) -> PathBuf {
        artifact_dir
            .as_ref()
            .join(Self::file_name(consumer, provider))
    }

    /// Writes the pact under its deterministic name, creating the
    /// artifact directory if necessary. The serialized form is stable,
    /// so writing the same pact twice yields identical files.
    pub fn save<P: AsRef<Path>>(&self, artifact_dir: P) -> Result<PathBuf, Error> {
        let path = Self::file_path(
            artifact_dir.as_ref(),
            &self.consumer.name,
            &self.provider.name,
        );

        let contents = serde_json::to_vec_pretty(self)?;
        fs::create_dir_all(artifact_dir.as_ref()).map_err(Error::Persist)?;
        fs::write(&path, contents).map_err(Error::Persist)?;

        Ok(path)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn load_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Self>, Error> {
        paths.iter().map(Self::load).collect()
    }
}

fn sanitize(name: &str) -> String {
    NAME_SANITIZER
        .replace_all(&name.to_lowercase(), "_")
        .trim_matches('_')
        .to_string()
}
