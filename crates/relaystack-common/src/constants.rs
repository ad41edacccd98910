//! System-wide constants and defaults.

/// Application name used in CLI output and template descriptions.
pub const APP_NAME: &str = "relaystack";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "rlst";

/// Default configuration file read at startup.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Default path of the synthesized template.
pub const DEFAULT_TEMPLATE_FILE: &str = "relaystack.template.json";

/// Configuration key holding the proxy master key.
pub const SECRET_KEY_NAME: &str = "LITELLM_KEY";

/// Configuration key holding the deployment region.
pub const REGION_KEY_NAME: &str = "AWS_REGION";

/// Process environment variables consulted for the region, in order.
pub const REGION_ENV_FALLBACKS: [&str; 2] = ["CDK_DEFAULT_REGION", "AWS_REGION"];

/// Non-functional master key used only when the insecure placeholder is
/// explicitly enabled.
pub const INSECURE_PLACEHOLDER_KEY: &str = "sk-123";

/// Number of availability zones spanned by the reference network.
pub const DEFAULT_MAX_ZONES: u8 = 2;

/// Upper bound on zones a single network may span.
pub const MAX_ZONES_LIMIT: u8 = 16;
