//! 离线查看示例 render graph：打印执行计划、回放若干帧、导出 DOT
//!
//! 用法: `rg-plan [config.toml]`，默认读取 `config/rg-plan.toml`，不存在时使用默认配置

use anyhow::Result;
use tessera_crate_tools::init_log::init_log;
use tessera_crate_tools::resource::TesseraPath;
use tessera_render_graph::example::deferred_example;
use tessera_render_graph::{RgDebugConfig, RgFrameInfo, RgRecordingCommands};

use ash::vk;
use ash::vk::Handle;

fn load_config() -> Result<RgDebugConfig> {
    let config_path = match std::env::args().nth(1) {
        Some(path) => TesseraPath::resolve(path),
        None => {
            let path = TesseraPath::config_path("rg-plan.toml");
            if !path.exists() {
                log::info!("{:?} 不存在，使用默认配置", path);
                return Ok(RgDebugConfig::default());
            }
            path
        }
    };

    log::info!("加载配置 {:?}", config_path);
    RgDebugConfig::from_file(config_path)
}

fn main() -> Result<()> {
    init_log();
    tracy_client::Client::start();
    tracy_client::set_thread_name!("RgPlanThread");

    let mut config = load_config()?;
    if config.dot_path.is_none() {
        config.dot_path = Some(TesseraPath::output_path("render_graph.dot").to_string_lossy().into_owned());
    }

    let (mut graph, _) = deferred_example();
    graph.apply_debug_config(&config)?;

    let frame_info = RgFrameInfo::new(vk::Extent2D { width: 1920, height: 1080 }, 0)
        .with_swapchain(vk::Image::from_raw(0xffff), vk::ImageView::from_raw(0x1_ffff));
    let mut cmd = RgRecordingCommands::new();
    for _ in 0..config.frames {
        let mut frame = graph.begin_frame(frame_info, &mut cmd);
        for _ in 0..frame.graph().pass_count() {
            frame.record_pass(|pass, _| log::debug!("record pass \"{}\"", pass.name()));
        }
        frame.end_frame();
        tracy_client::frame_mark();

        log::info!(
            "frame {}: {} rendering regions, {} barriers in {} batches",
            graph.frame_index(),
            cmd.rendering_count(),
            cmd.barrier_count(),
            cmd.barrier_batches().count()
        );
        cmd.take();
    }

    Ok(())
}
