use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use quadshade_engine::core::LoopConfig;
use quadshade_engine::device::GpuInit;
use quadshade_engine::logging::{init_logging, LoggingConfig};
use quadshade_engine::window::{Runtime, RuntimeConfig};

/// Renders a WGSL fragment shader over a fullscreen quad.
///
/// The shaders receive `u_resolution` (window size in pixels) and `u_time`
/// (seconds since start). Press Escape or close the window to quit.
#[derive(Debug, Parser)]
#[command(name = "quadshade", version)]
struct Cli {
    /// Window width in pixels.
    #[arg(long, default_value_t = 2560, value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,

    /// Window height in pixels.
    #[arg(long, default_value_t = 1440, value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,

    /// Directory containing `vertex.wgsl` and `fragment.wgsl`.
    #[arg(long, default_value = "shaders")]
    shaders: PathBuf,

    /// Present frames as fast as the driver allows instead of waiting for vsync.
    #[arg(long)]
    no_vsync: bool,

    /// Log filter in `env_logger` syntax; overrides `RUST_LOG`.
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,
}

impl Cli {
    fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            render: LoopConfig {
                window_size: (self.width, self.height),
                shader_dir: self.shaders.clone(),
            },
            ..RuntimeConfig::default()
        }
    }

    fn gpu_init(&self) -> GpuInit {
        let present_mode = if self.no_vsync {
            wgpu::PresentMode::AutoNoVsync
        } else {
            wgpu::PresentMode::Fifo
        };
        GpuInit {
            present_mode,
            ..GpuInit::default()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..LoggingConfig::default()
    });

    log::debug!("{cli:?}");
    Runtime::run(cli.runtime_config(), cli.gpu_init())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_the_reference_setup() {
        let cli = Cli::parse_from(["quadshade"]);
        let config = cli.runtime_config();
        assert_eq!(config.render.window_size, (2560, 1440));
        assert_eq!(config.render.shader_dir, PathBuf::from("shaders"));
        assert_eq!(cli.gpu_init().present_mode, wgpu::PresentMode::Fifo);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "quadshade", "--width", "800", "--height", "600", "--shaders", "demo", "--no-vsync",
        ]);
        let config = cli.runtime_config();
        assert_eq!(config.render.window_size, (800, 600));
        assert_eq!(config.render.shader_dir, PathBuf::from("demo"));
        assert_eq!(cli.gpu_init().present_mode, wgpu::PresentMode::AutoNoVsync);
    }

    #[test]
    fn zero_sized_window_is_rejected() {
        assert!(Cli::try_parse_from(["quadshade", "--width", "0"]).is_err());
    }
}
