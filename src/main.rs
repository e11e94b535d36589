// The `rgb_to_composite` binary: asks for a game name, then composites every
// template in `{game}@RGB` into `{game}@Composite`.

use anyhow::{Context, Result, bail};
use log::info;
use sprite_composite::config::{EnvSettings, RunConfig, prompt_game_name, sanitize_game_name};
use sprite_composite::error::error_chain;
use sprite_composite::parallel_pipeline::ParallelCompositor;
use sprite_composite::pipeline::ConsoleProgress;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = EnvSettings::from_lookup(|key| std::env::var(key).ok())
        .context("Failed to read COMPOSITE_* settings")?;

    let game_name = prompt_game_name(std::io::stdin().lock(), std::io::stdout())?;
    let config = RunConfig::resolve(&settings, &sanitize_game_name(&game_name));
    info!(
        "game {:?}, error policy {}, {} workers",
        config.game_name, config.error_policy, config.workers
    );

    let compositor = ParallelCompositor::new(config);
    let report = compositor
        .process_directory(&mut ConsoleProgress::stdout())
        .await
        .with_context(|| {
            format!(
                "Failed to composite {}",
                compositor.config().input_dir.display()
            )
        })?;

    if !report.is_clean() {
        for failure in &report.failures {
            eprintln!("{}: {}", failure.path.display(), error_chain(&failure.error));
        }
        bail!("{}", report.summary());
    }

    println!(
        "Processing complete ({}). Output saved to {}",
        report.summary(),
        compositor.config().output_dir.display()
    );
    Ok(())
}
