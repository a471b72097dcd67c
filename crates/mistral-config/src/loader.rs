use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml_str(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// A missing credential is not a load error: the node reports it when
    /// it is invoked, so the rest of a graph can still be edited.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid section
    pub fn validate(&self) -> anyhow::Result<()> {
        self.node
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid node configuration: {e}"))?;
        self.retry
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid retry configuration: {e}"))?;

        if self.cache.max_entries == 0 {
            anyhow::bail!("invalid cache configuration: cache.max_entries must be greater than zero");
        }

        match self.mistral.base_url.scheme() {
            "http" | "https" => {}
            other => anyhow::bail!("invalid mistral configuration: unsupported base_url scheme `{other}`"),
        }

        Ok(())
    }
}
