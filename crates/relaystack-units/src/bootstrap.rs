//! First-boot script for the proxy instance.
//!
//! The script runs once, unsupervised, as instance user data. It installs a
//! container runtime, writes the routing configuration and starts the proxy
//! container. Output is a pure function of region and master key: no
//! timestamps, no randomness, fixed ordering.

use std::fmt;

use relaystack_common::types::{Region, SecretKey};
use relaystack_synth::property::{PropertyValue, Sensitive};

/// A public model name and the backing model it routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelRoute {
    /// Name clients request.
    pub model_name: &'static str,
    /// Backing model identifier.
    pub model_id: &'static str,
}

/// Routes written into the proxy configuration, in order.
pub const MODEL_ROUTES: [ModelRoute; 3] = [
    ModelRoute {
        model_name: "bedrock-sonnet-3-5-v2",
        model_id: "anthropic.claude-3-5-sonnet-20241022-v2:0",
    },
    ModelRoute {
        model_name: "bedrock-claude-3-5-haiku",
        model_id: "anthropic.claude-3-5-haiku-20241022-v1:0",
    },
    ModelRoute {
        model_name: "bedrock-claude-3-haiku",
        model_id: "anthropic.claude-3-haiku-20240307-v1:0",
    },
];

/// Token limit applied to every route.
pub const MAX_TOKENS: u32 = 4096;
/// Sampling temperature applied to every route.
pub const TEMPERATURE: u32 = 0;

/// Proxy container image.
pub const PROXY_IMAGE: &str = "ghcr.io/berriai/litellm:main-v1.52.9";
/// Name given to the proxy container.
pub const CONTAINER_NAME: &str = "litellm";
/// Host directory holding the routing configuration.
pub const CONFIG_DIR: &str = "/data/litellm";
/// Routing configuration file on the host.
pub const CONFIG_PATH: &str = "/data/litellm/config.yaml";
/// Port exposed on the instance.
pub const HOST_PORT: u16 = 80;
/// Port the proxy listens on inside the container.
pub const CONTAINER_PORT: u16 = 4000;

const SHEBANG: &str = "#!/bin/bash";

/// Environment variable carrying the master key into the container.
pub const MASTER_KEY_VAR: &str = "LITELLM_MASTER_KEY";

/// Generated user data.
///
/// The text embeds the master key in plaintext, so `Debug` only reports the
/// number of commands. It is handed to the engine wrapped as a sensitive
/// property and never stored anywhere else.
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapScript {
    commands: Vec<String>,
}

impl BootstrapScript {
    /// Commands in execution order, without the interpreter line.
    #[must_use]
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Full script text: interpreter line, one command per line, trailing
    /// newline.
    #[must_use]
    pub fn render(&self) -> String {
        let mut text = String::from(SHEBANG);
        for command in &self.commands {
            text.push('\n');
            text.push_str(command);
        }
        text.push('\n');
        text
    }

    /// The script as instance user data.
    #[must_use]
    pub fn to_user_data(&self) -> PropertyValue {
        PropertyValue::Base64(Box::new(PropertyValue::Sensitive(Sensitive::new(
            self.render().into(),
        ))))
    }
}

impl fmt::Debug for BootstrapScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapScript")
            .field("commands", &self.commands.len())
            .finish_non_exhaustive()
    }
}

/// Renders the proxy routing configuration as YAML lines.
///
/// Every route points at `region`.
#[must_use]
pub fn routing_config_lines(region: &Region) -> Vec<String> {
    let mut lines = vec!["model_list:".to_string()];
    for route in &MODEL_ROUTES {
        lines.push(format!("  - model_name: {}", route.model_name));
        lines.push("    litellm_params:".to_string());
        lines.push(format!("      model: \"{}\"", route.model_id));
        lines.push(format!("      aws_region_name: \"{region}\""));
        lines.push(format!("      max_tokens: {MAX_TOKENS}"));
        lines.push(format!("      temperature: {TEMPERATURE}"));
    }
    lines
}

/// Builds the first-boot script for `region` with `secret` as master key.
///
/// Re-running the script is safe: package steps are no-ops once installed,
/// the configuration file is overwritten, and any previous proxy container
/// is removed before a new one is started.
#[must_use]
pub fn generate_bootstrap_script(region: &Region, secret: &SecretKey) -> BootstrapScript {
    let mut commands: Vec<String> = [
        "yum update -y",
        "yum install docker -y",
        "systemctl enable docker",
        "systemctl start docker",
    ]
    .into_iter()
    .map(str::to_string)
    .collect();

    commands.push(format!("mkdir -p {CONFIG_DIR}"));
    commands.push(format!("cd {CONFIG_DIR}"));
    commands.push(format!("touch {CONFIG_PATH}"));
    commands.push(format!("cat > {CONFIG_PATH} <<EOF"));
    commands.extend(routing_config_lines(region));
    commands.push("EOF".to_string());

    commands.push(format!("docker rm -f {CONTAINER_NAME} || true"));
    commands.push(format!(
        "docker run --restart=always -d --name {CONTAINER_NAME} \\"
    ));
    commands.push(format!("-v {CONFIG_PATH}:/app/config.yaml \\"));
    commands.push("-e STORE_MODEL_IN_DB=True \\".to_string());
    commands.push(format!("-e {MASTER_KEY_VAR}=\"{}\" \\", secret.expose()));
    commands.push(format!("-p {HOST_PORT}:{CONTAINER_PORT} \\"));
    commands.push(format!("{PROXY_IMAGE} \\"));
    commands.push("--config /app/config.yaml --detailed_debug".to_string());

    BootstrapScript { commands }
}
