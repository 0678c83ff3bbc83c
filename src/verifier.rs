use crate::{
    configuration::VerifyConfiguration,
    data::{Interaction, RequestData},
    error::Error,
    http_client::{HttpClient, HyperHttpClient},
    matching::{self, MatchFailure},
    pact_file::Pact,
};
use std::{
    collections::HashMap,
    fmt::{self, Display},
    io,
    sync::Arc,
};

/// How one replayed interaction fared against the live provider.
#[derive(Debug, Clone)]
pub enum InteractionOutcome {
    Passed,
    /// The state hook answered non-2xx; the request was never issued.
    StateSetupFailed { state: String, status: u16 },
    /// The request itself could not be completed.
    RequestFailed(String),
    /// The response arrived but diverged from the expectation.
    Mismatched(Vec<MatchFailure>),
}

#[derive(Debug, Clone)]
pub struct InteractionResult {
    pub consumer: String,
    pub provider: String,
    pub description: String,
    pub state: Option<String>,
    pub outcome: InteractionOutcome,
}

impl InteractionResult {
    pub fn passed(&self) -> bool {
        matches!(self.outcome, InteractionOutcome::Passed)
    }
}

impl Display for InteractionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.description)?;
        match &self.outcome {
            InteractionOutcome::Passed => write!(f, "ok"),
            InteractionOutcome::StateSetupFailed { state, status } => {
                write!(f, "state setup for '{}' answered {}", state, status)
            }
            InteractionOutcome::RequestFailed(reason) => write!(f, "request failed: {}", reason),
            InteractionOutcome::Mismatched(failures) => {
                write!(f, "{} mismatch(es):", failures.len())?;
                for failure in failures {
                    write!(f, " {};", failure)?;
                }
                Ok(())
            }
        }
    }
}

/// Every per-interaction result of a verification run, in replay order.
#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub results: Vec<InteractionResult>,
}

impl VerificationReport {
    /// Success requires every interaction across every artifact to pass.
    pub fn success(&self) -> bool {
        self.results.iter().all(InteractionResult::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &InteractionResult> {
        self.results.iter().filter(|r| !r.passed())
    }

    /// Folds the run into a `Result` for callers that treat the whole
    /// run as one test unit. Mismatches across all interactions are
    /// aggregated into a single [`Error::Mismatch`].
    pub fn ensure_success(&self) -> Result<(), Error> {
        if self.success() {
            return Ok(());
        }

        let mismatches: Vec<MatchFailure> = self
            .results
            .iter()
            .filter_map(|result| match &result.outcome {
                InteractionOutcome::Mismatched(failures) => Some(failures.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        if !mismatches.is_empty() {
            return Err(Error::Mismatch(mismatches));
        }

        for result in self.failures() {
            match &result.outcome {
                InteractionOutcome::StateSetupFailed { state, status } => {
                    return Err(Error::StateSetup {
                        state: state.clone(),
                        status: *status,
                    })
                }
                InteractionOutcome::RequestFailed(reason) => {
                    return Err(Error::IoError(io::Error::new(
                        io::ErrorKind::Other,
                        reason.clone(),
                    )))
                }
                _ => {}
            }
        }

        unreachable!("a failed report has at least one failing outcome")
    }
}

impl Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}/{} interaction(s) passed",
            self.results.iter().filter(|r| r.passed()).count(),
            self.results.len()
        )?;
        for result in &self.results {
            writeln!(f, "  {}", result)?;
        }
        Ok(())
    }
}

/// Replays persisted pacts against a live provider, reconciling each
/// interaction's declared state with the provider's state-setup hook.
#[derive(Debug)]
pub struct ProviderVerifier {
    configuration: VerifyConfiguration,
    http_client: Arc<dyn HttpClient + Send + Sync>,
}

impl ProviderVerifier {
    pub fn new(configuration: VerifyConfiguration) -> Self {
        Self::with_http_client(configuration, Arc::new(HyperHttpClient::new()))
    }

    pub fn with_http_client(
        configuration: VerifyConfiguration,
        http_client: Arc<dyn HttpClient + Send + Sync>,
    ) -> Self {
        Self {
            configuration,
            http_client,
        }
    }

    /// Replays every interaction of every configured pact, strictly in
    /// artifact order and one at a time: state setup has side effects
    /// that must not interleave with the next interaction's cycle. One
    /// failing interaction never stops the traversal.
    pub async fn verify_pacts(&self) -> Result<VerificationReport, Error> {
        let pacts = Pact::load_paths(self.configuration.pact_urls())?;
        let mut results = Vec::new();

        for pact in &pacts {
            if let Some(consumer) = self.configuration.consumer() {
                if consumer != pact.consumer.name {
                    continue;
                }
            }
            if let Some(provider) = self.configuration.provider() {
                if provider != pact.provider.name {
                    continue;
                }
            }

            for interaction in &pact.interactions {
                let result = self.verify_interaction(pact, interaction).await;
                tracing::debug!(
                    description = %result.description,
                    passed = result.passed(),
                    "interaction replayed"
                );
                results.push(result);
            }
        }

        Ok(VerificationReport { results })
    }

    async fn verify_interaction(&self, pact: &Pact, interaction: &Interaction) -> InteractionResult {
        let mut result = InteractionResult {
            consumer: pact.consumer.name.clone(),
            provider: pact.provider.name.clone(),
            description: interaction.description.clone(),
            state: interaction.state.clone(),
            outcome: InteractionOutcome::Passed,
        };

        // An absent or empty state label issues no setup call.
        if let Some(state) = interaction.required_state() {
            match self.setup_provider_state(state).await {
                Ok(()) => {}
                Err(Error::StateSetup { state, status }) => {
                    result.outcome = InteractionOutcome::StateSetupFailed { state, status };
                    return result;
                }
                Err(e) => {
                    result.outcome = InteractionOutcome::RequestFailed(e.to_string());
                    return result;
                }
            }
        }

        let request_data = interaction.request.to_request_data();
        let actual = match self
            .http_client
            .make_request(self.configuration.provider_base_url(), &request_data)
            .await
        {
            Ok(actual) => actual,
            Err(e) => {
                result.outcome = InteractionOutcome::RequestFailed(e.to_string());
                return result;
            }
        };

        let failures = matching::match_response(
            &interaction.response,
            &actual,
            self.configuration.body_matching(),
        );

        if !failures.is_empty() {
            result.outcome = InteractionOutcome::Mismatched(failures);
        }

        result
    }

    async fn setup_provider_state(&self, state: &str) -> Result<(), Error> {
        let setup_url = self
            .configuration
            .provider_states_setup_url()
            .ok_or(Error::NotConfigured)?;

        let body = serde_json::json!({ "state": state }).to_string();
        let request_data = RequestData {
            method: "POST".into(),
            uri: String::new(),
            headers: [("Content-Type".to_string(), "application/json".to_string())]
                .iter()
                .cloned()
                .collect(),
            body,
        };

        let response = self.http_client.make_request(setup_url, &request_data).await?;

        // 201 is the convention, any 2xx is accepted.
        if (200..300).contains(&response.status_code) {
            Ok(())
        } else {
            Err(Error::StateSetup {
                state: state.into(),
                status: response.status_code,
            })
        }
    }

    /// Fetches the states the provider declares per consumer via
    /// `GET <providerStatesUrl>`. Purely informational; verification
    /// does not gate on it.
    pub async fn declared_states(&self) -> Result<HashMap<String, Vec<String>>, Error> {
        let states_url = self
            .configuration
            .provider_states_url()
            .ok_or(Error::NotConfigured)?;

        let request_data = RequestData {
            method: "GET".into(),
            uri: String::new(),
            headers: HashMap::new(),
            body: String::new(),
        };

        let response = self.http_client.make_request(states_url, &request_data).await?;
        Ok(serde_json::from_str(&response.body)?)
    }
}
