use std::time::Duration;

use anyhow::Result;
use crtconfig::CrtSettings;
use renderer::{ContentSource, RenderPolicy, Renderer, RendererConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::config::LoadedConfig;
use crate::paths::AppPaths;

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let loaded = LoadedConfig::load(&paths, args.config.as_deref())?;
    tracing::debug!(
        config_dir = %paths.config_dir().display(),
        config_file = %loaded.path.display(),
        from_file = loaded.from_file,
        "resolved cathode paths"
    );

    let settings = loaded.resolve_settings(args.preset.as_deref(), &args.overrides())?;
    let renderer_config = build_renderer_config(&args, &loaded, settings);
    tracing::info!(
        size = ?renderer_config.surface_size,
        content = ?renderer_config.content,
        preset = args.preset.as_deref().unwrap_or("-"),
        presets = renderer_config.presets.len(),
        "launching CRT preview"
    );

    let mut renderer = Renderer::new(renderer_config);
    renderer.run()
}

/// Logs go to stderr so subcommand output on stdout stays machine-readable.
pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_renderer_config(
    args: &RunArgs,
    loaded: &LoadedConfig,
    settings: CrtSettings,
) -> RendererConfig {
    let mut config = RendererConfig {
        content: args
            .image
            .clone()
            .map_or(ContentSource::TestPattern, ContentSource::Image),
        shader_source: args.shader.clone(),
        settings,
        presets: loaded.config.resolved_presets(),
        antialiasing: args.antialias,
        color_space: args.color_space,
        policy: render_policy(args),
        crossfade: Duration::from_millis(args.crossfade_ms),
        crossfade_curve: args.crossfade_curve,
        ..RendererConfig::default()
    };
    if let Some(size) = args.size {
        config.surface_size = size;
    }
    config
}

fn render_policy(args: &RunArgs) -> RenderPolicy {
    match args.still {
        Some(time) => RenderPolicy::Still { time },
        None => RenderPolicy::Animate {
            target_fps: args.fps.filter(|fps| *fps > 0.0),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use crtconfig::{CathodeConfig, SettingsOverride};
    use std::path::PathBuf;

    fn parse_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["cathode"];
        argv.extend_from_slice(extra);
        Cli::try_parse_from(argv).unwrap().run
    }

    fn loaded() -> LoadedConfig {
        let config = CathodeConfig::from_toml_str(
            "version = 1\n[presets.dim]\nvignette_intensity = 1.6\n",
        )
        .unwrap();
        LoadedConfig {
            path: PathBuf::from("cathode.toml"),
            from_file: true,
            config,
        }
    }

    #[test]
    fn defaults_animate_uncapped_with_test_pattern() {
        let args = parse_args(&[]);
        let config = build_renderer_config(&args, &loaded(), CrtSettings::default());
        assert_eq!(config.surface_size, (1280, 720));
        assert_eq!(config.content, ContentSource::TestPattern);
        assert_eq!(config.policy, RenderPolicy::Animate { target_fps: None });
        assert_eq!(config.crossfade, Duration::from_millis(600));
        assert_eq!(config.presets.len(), 1);
        assert_eq!(config.presets[0].0, "dim");
    }

    #[test]
    fn still_wins_over_fps() {
        let args = parse_args(&["--fps", "30", "--still", "12.5"]);
        assert_eq!(render_policy(&args), RenderPolicy::Still { time: 12.5 });
        let args = parse_args(&["--fps", "0"]);
        assert_eq!(render_policy(&args), RenderPolicy::Animate { target_fps: None });
    }

    #[test]
    fn carries_run_flags_through() {
        let args = parse_args(&[
            "--image",
            "screen.png",
            "--size",
            "800x600",
            "--crossfade-ms",
            "0",
            "--set",
            "grid_opacity=0.9",
        ]);
        let loaded = loaded();
        let settings = loaded
            .resolve_settings(None, &args.overrides())
            .unwrap();
        let config = build_renderer_config(&args, &loaded, settings);
        assert_eq!(config.surface_size, (800, 600));
        assert_eq!(
            config.content,
            ContentSource::Image(PathBuf::from("screen.png"))
        );
        assert!(config.crossfade.is_zero());
        assert_eq!(config.settings.grid_opacity, 0.9);
        assert_eq!(
            loaded
                .resolve_settings(Some("dim"), &SettingsOverride::new())
                .unwrap()
                .vignette_intensity,
            1.6
        );
    }
}
