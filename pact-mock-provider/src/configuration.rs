use crate::{
    data::PactSpecVersion,
    readiness::{NoWait, ReadinessProbe},
};
use std::{env, path::PathBuf, sync::Arc, time::Duration};

pub const PACT_ROOT_DIR_ENV: &str = "PACT_ROOT_DIR";
pub const PACT_OVERWRITE_ENV: &str = "PACT_OVERWRITE";
pub const DEFAULT_PACT_DIRECTORY: &str = "target/pacts";
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct MockProviderConfig {
    hostname: String,
    port: u16,
    spec_version: PactSpecVersion,
    pact_directory: PathBuf,
    overwrite_pacts: bool,
    shutdown_grace: Duration,
    readiness_probe: Arc<dyn ReadinessProbe + Send + Sync>,
}

impl MockProviderConfig {
    pub fn new() -> Self {
        Self {
            hostname: String::from("127.0.0.1"),
            port: 0,
            spec_version: PactSpecVersion::default(),
            pact_directory: PathBuf::from(DEFAULT_PACT_DIRECTORY),
            overwrite_pacts: false,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            readiness_probe: Arc::new(NoWait),
        }
    }

    /// Defaults, with the pact directory and overwrite flag taken from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let mut config = Self::new();

        let directory = lookup(PACT_ROOT_DIR_ENV).filter(|value| !value.trim().is_empty());
        if let Some(directory) = directory {
            config.set_pact_directory(directory.trim());
        }

        if let Some(overwrite) = lookup(PACT_OVERWRITE_ENV) {
            let overwrite = overwrite.trim();
            config.set_overwrite_pacts(overwrite.eq_ignore_ascii_case("true") || overwrite == "1");
        }

        config
    }

    pub fn set_hostname<S: Into<String>>(&mut self, hostname: S) {
        self.hostname = hostname.into();
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn set_spec_version(&mut self, spec_version: PactSpecVersion) {
        self.spec_version = spec_version;
    }

    pub fn spec_version(&self) -> PactSpecVersion {
        self.spec_version
    }

    pub fn set_pact_directory<P: Into<PathBuf>>(&mut self, directory: P) {
        self.pact_directory = directory.into();
    }

    pub fn pact_directory(&self) -> &PathBuf {
        &self.pact_directory
    }

    pub fn set_overwrite_pacts(&mut self, value: bool) {
        self.overwrite_pacts = value;
    }

    pub fn overwrite_pacts(&self) -> bool {
        self.overwrite_pacts
    }

    pub fn set_shutdown_grace(&mut self, grace: Duration) {
        self.shutdown_grace = grace;
    }

    pub fn shutdown_grace(&self) -> Duration {
        self.shutdown_grace
    }

    pub fn set_readiness_probe(&mut self, probe: Arc<dyn ReadinessProbe + Send + Sync>) {
        self.readiness_probe = probe;
    }

    pub fn readiness_probe(&self) -> Arc<dyn ReadinessProbe + Send + Sync> {
        self.readiness_probe.clone()
    }
}

impl Default for MockProviderConfig {
    fn default() -> Self {
        Self::new()
    }
}
