//! critfix: command-line repair for `critical_data` phone backups.
//!
//! Usage:
//!   critfix --platform qualcomm --profile qualcomm_profile_1 \
//!       --input critical_data.txt --imei1 86753... --imei2 86753...
//!   critfix --platform mediatek --donor donor_backup.txt \
//!       --input critical_data.txt --imei1 86753... --imei2 86753...
//!   critfix --list-profiles [--platform <p>] [--json]
//!
//! The repaired backup is written next to the input as
//! `PATCHED_<input-name>` unless `--output` says otherwise.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use critfix_core::{
    list_profiles, parse_donor_keys, patch_document, resolve_key_bundle, Imei, Platform,
    ProfileSource,
};

#[derive(Parser, Debug)]
#[command(name = "critfix")]
#[command(about = "Repair IMEI fields and signatures in a critical_data backup")]
struct Args {
    /// Backup file to repair
    #[arg(long, required_unless_present = "list_profiles")]
    input: Option<PathBuf>,

    /// Baseband platform of the device: qualcomm or mediatek
    #[arg(long, required_unless_present = "list_profiles")]
    platform: Option<String>,

    /// Built-in signature profile key (Qualcomm repairs)
    #[arg(long)]
    profile: Option<String>,

    /// Donor backup to harvest signature keys from (MediaTek repairs)
    #[arg(long)]
    donor: Option<PathBuf>,

    /// New IMEI 1, 15 decimal digits
    #[arg(long, required_unless_present = "list_profiles")]
    imei1: Option<String>,

    /// New IMEI 2, 15 decimal digits
    #[arg(long, required_unless_present = "list_profiles")]
    imei2: Option<String>,

    /// Output path (defaults to PATCHED_<input-name> next to the input)
    #[arg(long)]
    output: Option<PathBuf>,

    /// List the built-in signature profiles and exit
    #[arg(long)]
    list_profiles: bool,

    /// Emit the profile listing as JSON
    #[arg(long, requires = "list_profiles")]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if args.list_profiles {
        let platform = args
            .platform
            .as_deref()
            .map(Platform::parse)
            .transpose()
            .map_err(anyhow::Error::msg)?;
        print_profiles(platform, args.json)
    } else {
        run_repair(&args)
    }
}

fn print_profiles(platform: Option<Platform>, json: bool) -> Result<()> {
    let profiles = list_profiles(platform);
    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
    } else {
        for p in &profiles {
            println!("{:<24} {:<12} {}", p.key, p.platform, p.name);
        }
    }
    Ok(())
}

/// Map the command-line arguments onto a profile source.
///
/// The platform policy itself (donor for MediaTek, built-in for Qualcomm)
/// is enforced by the resolver; this only decides which argument feeds it.
fn profile_source(platform: Platform, args: &Args) -> Result<Option<ProfileSource>> {
    match platform {
        Platform::Mediatek => match &args.donor {
            Some(path) => {
                let donor_text = fs::read_to_string(path)
                    .with_context(|| format!("reading donor file {}", path.display()))?;
                tracing::info!(file = %path.display(), "building key profile from donor backup");
                let bundle = parse_donor_keys(&donor_text)?;
                tracing::info!("key profile loaded from donor backup");
                Ok(Some(ProfileSource::Custom(bundle)))
            }
            None => Ok(None),
        },
        Platform::Qualcomm => Ok(args.profile.clone().map(ProfileSource::BuiltIn)),
    }
}

fn run_repair(args: &Args) -> Result<()> {
    let input = args.input.as_ref().context("--input is required")?;
    let platform = args
        .platform
        .as_deref()
        .context("--platform is required")?;
    let platform = Platform::parse(platform).map_err(anyhow::Error::msg)?;

    let imei1: Imei = args
        .imei1
        .as_deref()
        .context("--imei1 is required")?
        .parse()
        .context("--imei1")?;
    let imei2: Imei = args
        .imei2
        .as_deref()
        .context("--imei2 is required")?
        .parse()
        .context("--imei2")?;

    let source = profile_source(platform, args)?;
    let bundle = resolve_key_bundle(platform, source.as_ref())?;
    if let Some(ProfileSource::BuiltIn(key)) = &source {
        tracing::info!(profile = %key, "built-in profile loaded");
    }

    let original = fs::read_to_string(input)
        .with_context(|| format!("reading backup file {}", input.display()))?;
    tracing::info!(file = %input.display(), "backup file read");

    let patched = patch_document(&original, &imei1, &imei2, &bundle)?;

    let output = output_path(args, input);
    fs::write(&output, &patched)
        .with_context(|| format!("writing repaired backup {}", output.display()))?;
    tracing::info!(file = %output.display(), "repaired backup written");

    Ok(())
}

fn output_path(args: &Args, input: &Path) -> PathBuf {
    args.output.clone().unwrap_or_else(|| {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "critical_data.txt".to_owned());
        input.with_file_name(format!("PATCHED_{name}"))
    })
}
