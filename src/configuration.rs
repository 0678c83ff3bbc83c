use crate::{matching::BodyMatching, pact_file};
use std::path::{Path, PathBuf};

/// Configuration for a mock session: where pact files land and which
/// specification version tag they carry.
#[derive(Debug, Clone)]
pub struct SessionConfiguration {
    artifact_dir: PathBuf,
    spec_version: String,
}

impl SessionConfiguration {
    pub fn new() -> Self {
        Self {
            artifact_dir: PathBuf::from("pacts"),
            spec_version: pact_file::DEFAULT_SPEC_VERSION.into(),
        }
    }

    pub fn set_artifact_dir<P: Into<PathBuf>>(&mut self, artifact_dir: P) {
        self.artifact_dir = artifact_dir.into();
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    pub fn set_spec_version<S: Into<String>>(&mut self, spec_version: S) {
        self.spec_version = spec_version.into();
    }

    pub fn spec_version(&self) -> &str {
        &self.spec_version
    }
}

impl Default for SessionConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameters of a provider verification run. Only `provider_base_url`
/// and at least one pact path are required; `consumer`/`provider` narrow
/// the run to matching artifacts, the state URLs enable the provider
/// state convention.
#[derive(Debug, Clone)]
pub struct VerifyConfiguration {
    provider_base_url: String,
    pact_urls: Vec<PathBuf>,
    consumer: Option<String>,
    provider: Option<String>,
    provider_states_url: Option<String>,
    provider_states_setup_url: Option<String>,
    body_matching: BodyMatching,
}

impl VerifyConfiguration {
    pub fn new<S: Into<String>>(provider_base_url: S) -> Self {
        Self {
            provider_base_url: provider_base_url.into(),
            pact_urls: Vec::new(),
            consumer: None,
            provider: None,
            provider_states_url: None,
            provider_states_setup_url: None,
            body_matching: BodyMatching::default(),
        }
    }

    pub fn add_pact_url<P: Into<PathBuf>>(&mut self, path: P) {
        self.pact_urls.push(path.into());
    }

    pub fn set_consumer<S: Into<String>>(&mut self, consumer: S) {
        self.consumer = Some(consumer.into());
    }

    pub fn set_provider<S: Into<String>>(&mut self, provider: S) {
        self.provider = Some(provider.into());
    }

    pub fn set_provider_states_url<S: Into<String>>(&mut self, url: S) {
        self.provider_states_url = Some(url.into());
    }

    pub fn set_provider_states_setup_url<S: Into<String>>(&mut self, url: S) {
        self.provider_states_setup_url = Some(url.into());
    }

    pub fn set_body_matching(&mut self, body_matching: BodyMatching) {
        self.body_matching = body_matching;
    }

    pub fn provider_base_url(&self) -> &str {
        &self.provider_base_url
    }

    pub fn pact_urls(&self) -> &[PathBuf] {
        &self.pact_urls
    }

    pub fn consumer(&self) -> Option<&str> {
        self.consumer.as_deref()
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    pub fn provider_states_url(&self) -> Option<&str> {
        self.provider_states_url.as_deref()
    }

    pub fn provider_states_setup_url(&self) -> Option<&str> {
        self.provider_states_setup_url.as_deref()
    }

    pub fn body_matching(&self) -> BodyMatching {
        self.body_matching
    }
}
