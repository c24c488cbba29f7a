// SPDX-License-Identifier: MPL-2.0
//! Command-line entry point for local design and crop work.

use linkpage_studio::application::port::OwnerId;
use linkpage_studio::domain::geometry::{AspectRatio, Rotation};
use linkpage_studio::domain::patch::SettingsPatch;
use linkpage_studio::domain::settings::{AssetSlot, DesignSettings};
use linkpage_studio::domain::theme::ThemeCatalog;
use linkpage_studio::infrastructure::{self, MemoryAssetHost};
use linkpage_studio::media::{CropAdjustments, ImagePipeline};
use linkpage_studio::store::SyncStatus;
use linkpage_studio::{config, style, SettingsStore};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
const ENV_LOG: &str = "LINKPAGE_STUDIO_LOG";

const HELP: &str = "\
linkpage-studio

USAGE:
  linkpage-studio resolve <settings.toml>
  linkpage-studio show <owner>
  linkpage-studio crop <input> <output> [OPTIONS]

COMMANDS:
  resolve   Resolve a settings file against the built-in themes and print
            the effective style as TOML. The file holds flat `field = value`
            pairs; missing fields take the default theme's values.
  show      Load an owner's stored settings from the configured backend
            and print the effective style visitors see.
  crop      Validate, compress, crop and rasterize an image, writing the
            encoded result to <output>.

CROP OPTIONS:
  --slot <avatar|background>   Output surface and limits [default: avatar]
  --rotate <degrees>           Clockwise rotation
  --zoom <factor>              Zoom relative to the minimum [default: 1]
  --aspect <w:h>               Target aspect ratio

GLOBAL OPTIONS:
  --config <dir>               Directory holding engine.toml
  -h, --help                   Print this help
";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Args(#[from] pico_args::Error),
    #[error("{0}")]
    Engine(#[from] linkpage_studio::Error),
    #[error("{0}")]
    Usage(String),
}

fn main() -> ExitCode {
    init_tracing();
    match run(pico_args::Arguments::from_env()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(mut args: pico_args::Arguments) -> Result<(), CliError> {
    if args.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }
    let config_dir: Option<PathBuf> = args.opt_value_from_os_str("--config", |s| {
        Ok::<_, std::convert::Infallible>(PathBuf::from(s))
    })?;

    match args.subcommand()?.as_deref() {
        Some("resolve") => {
            let path: PathBuf = args.free_from_str()?;
            finish(args)?;
            resolve(&path)
        }
        Some("show") => {
            let owner: String = args.free_from_str()?;
            finish(args)?;
            show(config_dir, OwnerId::new(owner))
        }
        Some("crop") => {
            let slot: AssetSlot = args.opt_value_from_str("--slot")?.unwrap_or(AssetSlot::Avatar);
            let adjustments = CropAdjustments {
                aspect: args.opt_value_from_fn("--aspect", AspectRatio::parse)?,
                rotation: args
                    .opt_value_from_str::<_, f64>("--rotate")?
                    .map(Rotation::new),
                zoom: args.opt_value_from_str("--zoom")?,
                pan: None,
            };
            let input: PathBuf = args.free_from_str()?;
            let output: PathBuf = args.free_from_str()?;
            finish(args)?;
            crop(config_dir, slot, &input, &output, &adjustments)
        }
        Some(other) => Err(CliError::Usage(format!("unknown command '{other}'\n\n{HELP}"))),
        None => Err(CliError::Usage(HELP.to_string())),
    }
}

fn finish(args: pico_args::Arguments) -> Result<(), CliError> {
    let rest = args.finish();
    if rest.is_empty() {
        Ok(())
    } else {
        Err(CliError::Usage(format!("unexpected arguments: {rest:?}")))
    }
}

fn resolve(path: &Path) -> Result<(), CliError> {
    let text = std::fs::read_to_string(path).map_err(linkpage_studio::Error::from)?;
    let table: toml::Table = toml::from_str(&text).map_err(linkpage_studio::Error::from)?;

    let catalog = ThemeCatalog::builtin();
    let mut patch = SettingsPatch::default();
    for (name, value) in &table {
        let raw = match value {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        patch.set_field(name, &raw)?;
    }
    patch.validate(catalog)?;

    let defaults = DesignSettings::from_template(catalog.default_template());
    let mut settings = defaults.clone();
    patch
        .with_theme_defaults(catalog, &defaults)
        .apply_to(&mut settings, &defaults);

    let effective = style::resolve(&settings, catalog);
    let rendered = toml::to_string_pretty(&effective).map_err(linkpage_studio::Error::from)?;
    print!("{rendered}");
    Ok(())
}

fn show(config_dir: Option<PathBuf>, owner: OwnerId) -> Result<(), CliError> {
    let (engine_config, warning) = config::load_with_override(config_dir);
    if let Some(warning) = warning {
        tracing::warn!(key = config::LOAD_WARNING_KEY, "{warning}");
    }
    let backends = infrastructure::backends(&engine_config)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(linkpage_studio::Error::from)?;
    let store = runtime.block_on(SettingsStore::load(
        owner,
        backends.gateway,
        Arc::new(ThemeCatalog::builtin().clone()),
    ));
    if let SyncStatus::Unsynced { reason } = store.sync_status() {
        return Err(CliError::Usage(format!("settings could not be read: {reason}")));
    }
    let rendered =
        toml::to_string_pretty(&store.baseline_style()).map_err(linkpage_studio::Error::from)?;
    print!("{rendered}");
    Ok(())
}

fn crop(
    config_dir: Option<PathBuf>,
    slot: AssetSlot,
    input: &Path,
    output: &Path,
    adjustments: &CropAdjustments,
) -> Result<(), CliError> {
    let (engine_config, warning) = config::load_with_override(config_dir);
    if let Some(warning) = warning {
        tracing::warn!(key = config::LOAD_WARNING_KEY, "{warning}");
    }

    let bytes = std::fs::read(input).map_err(linkpage_studio::Error::from)?;
    let mime = image_rs::guess_format(&bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream");

    // Nothing is uploaded; the host only satisfies the pipeline's port.
    let pipeline = ImagePipeline::new(engine_config, Arc::new(MemoryAssetHost::new()));
    let prepared = pipeline.prepare(slot, bytes, mime)?;
    let mut session = pipeline.crop_session(&prepared)?;
    session.apply(adjustments);
    let rendered = pipeline.render(&prepared, &session)?;

    std::fs::write(output, &rendered.bytes).map_err(linkpage_studio::Error::from)?;
    println!(
        "{}: {}x{} {} ({} bytes)",
        output.display(),
        rendered.width,
        rendered.height,
        rendered.content_type,
        rendered.bytes.len()
    );
    Ok(())
}
