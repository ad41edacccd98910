//! CLI command definitions and dispatch.

pub mod outputs;
pub mod plan;
pub mod synth;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use relaystack_common::config::{DeploymentConfig, EnvFile, SecretPolicy};
use relaystack_common::constants::{BIN_NAME, DEFAULT_ENV_FILE};
use relaystack_units::compute::ComputeOptions;
use relaystack_units::firewall::EgressPolicy;

/// relaystack — provisions a single-instance LiteLLM proxy.
#[derive(Parser, Debug)]
#[command(name = BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Configuration and composition options shared by every command.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to the `.env` configuration file.
    #[arg(long, global = true, default_value = DEFAULT_ENV_FILE)]
    pub env_file: PathBuf,

    /// Target region (overrides `AWS_REGION` in the configuration file).
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Use a non-functional placeholder master key when `LITELLM_KEY` is
    /// missing. Development only.
    #[arg(long, global = true)]
    pub insecure_placeholder_key: bool,

    /// Outbound firewall policy of the proxy instance.
    #[arg(long, global = true, value_enum, default_value_t = Egress::Unrestricted)]
    pub egress: Egress,
}

/// Command-line spelling of [`EgressPolicy`].
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Egress {
    /// Allow every outbound destination.
    Unrestricted,
    /// Allow outbound HTTP and HTTPS only.
    WebOnly,
}

impl From<Egress> for EgressPolicy {
    fn from(value: Egress) -> Self {
        match value {
            Egress::Unrestricted => Self::Unrestricted,
            Egress::WebOnly => Self::WebOnly,
        }
    }
}

impl GlobalArgs {
    /// Loads the configuration file and resolves region and master key.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or a required key cannot be
    /// resolved.
    pub fn load_config(&self) -> anyhow::Result<DeploymentConfig> {
        load_config(
            &self.env_file,
            self.region.as_deref(),
            self.insecure_placeholder_key,
        )
    }

    /// Compute options selected on the command line.
    #[must_use]
    pub fn compute_options(&self) -> ComputeOptions {
        ComputeOptions::new().egress(self.egress.into())
    }
}

fn load_config(
    env_file: &Path,
    region: Option<&str>,
    insecure_placeholder_key: bool,
) -> anyhow::Result<DeploymentConfig> {
    let env = EnvFile::load(env_file)?;
    let policy = if insecure_placeholder_key {
        SecretPolicy::AllowInsecurePlaceholder
    } else {
        SecretPolicy::Required
    };
    Ok(DeploymentConfig::resolve(&env, region, policy)?)
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compose the deployment and write the template to a file.
    Synth(synth::SynthArgs),
    /// Display the resources in apply order.
    Plan(plan::PlanArgs),
    /// List the outputs the deployment publishes.
    Outputs(outputs::OutputsArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Synth(args) => synth::execute(args, &cli.global),
        Command::Plan(args) => plan::execute(args, &cli.global),
        Command::Outputs(args) => outputs::execute(args, &cli.global),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "rlst",
            "plan",
            "--region",
            "us-west-2",
            "--egress",
            "web-only",
            "--insecure-placeholder-key",
        ])
        .expect("parse");
        assert!(matches!(cli.command, Command::Plan(_)));
        assert_eq!(cli.global.region.as_deref(), Some("us-west-2"));
        assert_eq!(cli.global.egress, Egress::WebOnly);
        assert!(cli.global.insecure_placeholder_key);
        assert_eq!(cli.global.env_file, PathBuf::from(".env"));
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
        assert_eq!(Cli::command().get_name(), BIN_NAME);
    }

    #[test]
    fn load_config_requires_secret_without_flag() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "AWS_REGION=us-east-1").expect("write");
        let err = load_config(file.path(), None, false).expect_err("missing key");
        assert!(err.to_string().contains("LITELLM_KEY"), "got: {err}");

        let config = load_config(file.path(), None, true).expect("placeholder");
        assert!(config.secret_key.is_placeholder());
    }

    #[test]
    fn load_config_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_config(&dir.path().join("absent.env"), Some("us-east-1"), true)
            .expect_err("missing file");
        assert!(err.to_string().contains("not found"), "got: {err}");
    }
}
