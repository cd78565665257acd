//! Hand an episode's audio URL to mpv and wait for it to finish.

use anyhow::{anyhow, bail, Context};
use pods_core::config::PlayerConfig;
use pods_core::platform;
use tracing::info;

fn mpv_args(config: &PlayerConfig, url: &str) -> Vec<String> {
    let mut args = config.mpv_args.clone();
    args.push(url.to_string());
    args
}

pub async fn play(config: &PlayerConfig, url: &str) -> anyhow::Result<()> {
    let mpv_binary = platform::find_mpv_binary()
        .ok_or_else(|| anyhow!("mpv not found; install it or set MPV_PATH"))?;

    info!("[player] launching {} for {}", mpv_binary.display(), url);
    let status = tokio::process::Command::new(&mpv_binary)
        .args(mpv_args(config, url))
        .kill_on_drop(true)
        .status()
        .await
        .with_context(|| format!("launching {}", mpv_binary.display()))?;

    if !status.success() {
        bail!("mpv exited with {}", status);
    }
    info!("[player] finished {}", url);
    Ok(())
}
