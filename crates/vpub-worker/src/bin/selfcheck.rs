//! Startup self-check: configuration, tools, credentials and, unless
//! `--offline` is given, a live listing of the source folder.

use std::path::Path;

use anyhow::{anyhow, Context};
use vpub_media::{check_ffmpeg, check_ffprobe};
use vpub_worker::pipeline::discover_eligible;
use vpub_worker::{PipelineConfig, Services};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        eprintln!("vpub-selfcheck: rustls crypto provider already installed");
    }
    dotenvy::dotenv().ok();

    let offline = std::env::args().any(|arg| arg == "--offline");
    let config = PipelineConfig::from_env();

    println!(
        "vpub-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );
    config.validate().map_err(|e| anyhow!("{}", e))?;
    ensure_workdir(&config.work_dir).await?;

    let ffmpeg = check_ffmpeg().context("ffmpeg not available")?;
    let ffprobe = check_ffprobe().context("ffprobe not available")?;
    println!("vpub-selfcheck: ffmpeg={} ffprobe={}", ffmpeg.display(), ffprobe.display());

    ensure_any_exists(
        "primary credentials",
        &[config.token_file.as_path(), config.credentials_file.as_path()],
    )?;
    if config.dual_upload {
        if let Err(e) = ensure_any_exists(
            "secondary credentials",
            &[config.second_credentials_file.as_path()],
        ) {
            println!("vpub-selfcheck: warning: {} (secondary uploads will be skipped)", e);
        }
    }
    if config.openai_api_key.is_none() {
        println!("vpub-selfcheck: warning: OPENAI_API_KEY not set, placeholder thumbnails will be used");
    }

    if offline {
        println!("vpub-selfcheck: ok (offline)");
        return Ok(());
    }

    let services = Services::from_config(&config)
        .await
        .map_err(|e| anyhow!("{}", e))?;
    let eligible = discover_eligible(
        services.drive(),
        &config.drive_folder_id,
        config.page_size,
        &config.video_extensions,
    )
    .await
    .context("listing source folder")?;

    println!(
        "vpub-selfcheck: folder {} has {} eligible file(s) in the next batch",
        config.drive_folder_id,
        eligible.len()
    );
    for file in eligible {
        println!("  {} ({})", file.name, file.id);
    }

    println!("vpub-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("creating {}", path.display()))?;
    Ok(())
}

fn ensure_any_exists(what: &str, paths: &[&Path]) -> anyhow::Result<()> {
    if paths.iter().any(|p| p.exists()) {
        return Ok(());
    }
    let names: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
    Err(anyhow!("{} not found (looked for {})", what, names.join(", ")))
}
