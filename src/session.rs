use crate::{
    configuration::SessionConfiguration, data::Interaction, error::Error, mock_server::MockServer,
    pact_file::Pact,
};
use futures::future::try_join_all;
use std::{future::Future, path::PathBuf};

/// Where in its lifecycle a session currently is. `Verified` may be
/// re-entered, `Finalized` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Started,
    Registering,
    ReadyForExercise,
    Verified,
    Finalized,
}

/// Owns the mock server for one consumer/provider pair: interactions are
/// registered, the consumer code under test is exercised against the
/// server, coverage is verified, and the recorded set is finalized into
/// a pact file.
#[derive(Debug)]
pub struct PactSession {
    consumer: String,
    provider: String,
    configuration: SessionConfiguration,
    server: MockServer,
    state: SessionState,
}

impl PactSession {
    /// Binds the mock server; fails with [`Error::ServerStart`] when the
    /// port is unavailable, which also enforces one session per port.
    pub fn start<C: Into<String>, P: Into<String>>(
        consumer: C,
        provider: P,
        port: u16,
        configuration: SessionConfiguration,
    ) -> Result<Self, Error> {
        let consumer = consumer.into();
        let provider = provider.into();
        let server = MockServer::start(port)?;

        tracing::debug!(%consumer, %provider, port, "pact session started");

        Ok(Self {
            consumer,
            provider,
            configuration,
            server,
            state: SessionState::Started,
        })
    }

    pub fn consumer(&self) -> &str {
        &self.consumer
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The base URL consumer code under test should be pointed at.
    pub fn server_url(&self) -> String {
        self.server.url()
    }

    /// Registers interactions with the mock server. Registration is
    /// order-independent so the requests are fired concurrently, but the
    /// call resolves only once every one of them is acknowledged.
    pub async fn add_interactions(&mut self, interactions: Vec<Interaction>) -> Result<(), Error> {
        if self.state == SessionState::Finalized {
            return Err(Error::SessionFinalized);
        }

        self.state = SessionState::Registering;
        let server = &self.server;
        let registrations: Vec<_> = interactions
            .into_iter()
            .map(|interaction| server.register(interaction))
            .collect();
        try_join_all(registrations).await?;
        self.state = SessionState::ReadyForExercise;

        Ok(())
    }

    /// Runs the caller-supplied request-issuing function. The session
    /// doesn't interpret what it does or how many requests it makes;
    /// coverage is judged by [`PactSession::verify`].
    pub async fn exercise<F, Fut, T>(&self, client_request_fn: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        client_request_fn().await
    }

    /// Asks the mock server whether every interaction was exercised and
    /// nothing unexpected arrived. May be called repeatedly; a failure
    /// here never blocks [`PactSession::finalize`].
    pub fn verify(&mut self) -> Result<(), Error> {
        let result = self.server.verify();

        if result.is_ok() && self.state != SessionState::Finalized {
            self.state = SessionState::Verified;
        }

        result
    }

    /// Flushes the recorded interaction set to the pact file. Terminal:
    /// later `add_interactions` calls are rejected, but finalize itself
    /// may run twice and produces identical artifacts when it does.
    pub fn finalize(&mut self) -> Result<PathBuf, Error> {
        let interactions = self.server.interactions()?;
        let pact = Pact::new(
            self.consumer.clone(),
            self.provider.clone(),
            interactions,
            self.configuration.spec_version(),
        );

        let path = pact.save(self.configuration.artifact_dir())?;
        self.state = SessionState::Finalized;
        tracing::debug!(path = %path.display(), "pact finalized");

        Ok(path)
    }

    /// Shuts the mock server down and joins its thread. Also runs on
    /// drop.
    pub fn stop(&mut self) {
        self.server.stop();
    }
}
