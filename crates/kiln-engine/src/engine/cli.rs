use clap::Parser;

use super::EngineConfig;
use crate::render::BackendKind;

// === Clap === //

#[derive(Debug, Clone, Parser)]
#[command(about = "kiln engine runtime", long_about = None)]
pub struct CliArgs {
    /// Window title.
    #[arg(long)]
    pub title: Option<String>,

    /// Initial window width in logical pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Initial window height in logical pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Logic ticks per second (0 = uncapped).
    #[arg(long = "tick-rate", default_value_t = 60)]
    pub tick_rate: u32,

    /// Pending render jobs above which best-effort jobs are skipped.
    #[arg(long = "overload-threshold", default_value_t = 256)]
    pub overload_threshold: usize,

    /// GPU backend to try; repeat to build a priority list.
    #[arg(long = "backend", value_enum)]
    pub backends: Vec<BackendKind>,

    /// Log filter in env_logger syntax, e.g. "info,kiln_engine=debug".
    #[arg(long = "log")]
    pub log: Option<String>,
}

// === Config === //

impl CliArgs {
    /// Applies the flags on top of `EngineConfig::default()`.
    pub fn into_config(self) -> EngineConfig {
        let mut config = EngineConfig::default();

        if let Some(title) = self.title {
            config.window.title = title;
        }
        if let Some(width) = self.width {
            config.window.width = width;
        }
        if let Some(height) = self.height {
            config.window.height = height;
        }
        config.tick_rate = self.tick_rate;
        config.overload_threshold = self.overload_threshold;
        if !self.backends.is_empty() {
            config.backend_priority = self.backends;
        }
        config.logging.env_filter = self.log;

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> EngineConfig {
        CliArgs::try_parse_from(std::iter::once("kiln").chain(args.iter().copied()))
            .unwrap()
            .into_config()
    }

    #[test]
    fn no_flags_gives_defaults() {
        let config = parse(&[]);
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.overload_threshold, 256);
        assert_eq!(config.backend_priority, BackendKind::default_priority().to_vec());
        assert_eq!(config.window.title, "kiln");
        assert!(config.logging.env_filter.is_none());
    }

    #[test]
    fn repeated_backend_flags_replace_priority_list() {
        let config = parse(&["--backend", "gl", "--backend", "vulkan"]);
        assert_eq!(config.backend_priority, vec![BackendKind::Gl, BackendKind::Vulkan]);
    }

    #[test]
    fn window_and_rate_flags_apply() {
        let config = parse(&[
            "--title", "demo", "--width", "640", "--height", "480", "--tick-rate", "0",
            "--overload-threshold", "32", "--log", "debug",
        ]);
        assert_eq!(config.window.title, "demo");
        assert_eq!((config.window.width, config.window.height), (640, 480));
        assert_eq!(config.tick_rate, 0);
        assert_eq!(config.overload_threshold, 32);
        assert_eq!(config.logging.env_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(CliArgs::try_parse_from(["kiln", "--backend", "glide"]).is_err());
    }
}
