//! `rlst synth` — Compose the deployment and write the template.

use std::fs::OpenOptions;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use clap::Args;
use relaystack_common::constants::DEFAULT_TEMPLATE_FILE;

use super::GlobalArgs;

/// Mode of the written template. It embeds the master key.
#[cfg(unix)]
const TEMPLATE_FILE_MODE: u32 = 0o600;

/// Arguments for the `synth` subcommand.
#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Where to write the template.
    #[arg(short, long, default_value = DEFAULT_TEMPLATE_FILE)]
    pub output: PathBuf,
}

/// Executes the `synth` command.
///
/// The template embeds the bootstrap script, master key included, inside
/// the instance launch configuration. It is written to an owner-only file
/// and never printed.
///
/// # Errors
///
/// Returns an error if configuration, composition, or the write fails.
pub fn execute(args: SynthArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = global.load_config()?;
    let engine = relaystack_units::root::synthesize(&config, &global.compute_options())?;
    let template = engine.template()?;
    let text = template.to_json_pretty()?;

    tracing::info!(path = %args.output.display(), "writing template");
    write_template(&args.output, &text)?;

    println!("Synthesized {} -> {}", config.region, args.output.display());
    println!("Resources: {}", template.resources.len());
    println!("Outputs: {}", template.outputs.len());
    println!("Fingerprint: {}", template.fingerprint()?);
    Ok(())
}

/// Writes `text` to `path`, readable by the owner only. An existing file is
/// truncated and its permissions tightened.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, written, or chmodded.
pub fn write_template(path: &Path, text: &str) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    let _ = options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    let _ = options.mode(TEMPLATE_FILE_MODE);
    let mut file = options.open(path)?;
    #[cfg(unix)]
    file.set_permissions(std::fs::Permissions::from_mode(TEMPLATE_FILE_MODE))?;
    file.write_all(text.as_bytes())?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_is_written_and_replaced() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("template.json");
        write_template(&path, "{\"first\": true}\n").expect("write");
        write_template(&path, "{}\n").expect("rewrite");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "{}\n");
    }

    #[cfg(unix)]
    #[test]
    fn template_is_owner_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("template.json");
        write_template(&path, "{}\n").expect("write");
        let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn existing_world_readable_file_is_tightened() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("template.json");
        std::fs::write(&path, "old").expect("seed");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).expect("chmod");
        write_template(&path, "{}\n").expect("write");
        let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
