use anyhow::Context;
use tablecopy_config::load_config;
use tablecopy_config::shared::RunnerConfig;

/// Loads and validates the runner configuration.
pub fn load_runner_config() -> anyhow::Result<RunnerConfig> {
    let config = load_config::<RunnerConfig>().context("loading runner configuration")?;
    config
        .validate()
        .context("validating runner configuration")?;

    Ok(config)
}
