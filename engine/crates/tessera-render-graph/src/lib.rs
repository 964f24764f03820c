//! Tessera RenderGraph - 从声明式 pass 描述推导 Vulkan 同步命令
//!
//! 每个 pass 声明它引用了哪些图像、以什么方式使用；graph 负责推导 layout、
//! 在 pass 之间插入 image barrier，并把可以共享 tile 数据的相邻 pass 合并进同一个
//! rendering region（dynamic rendering + local read）。
//!
//! # 核心概念
//!
//! - **RgImageHandle / RgImageId**: 导入图像的句柄，swapchain 是一个固定的特殊 id
//! - **RgImageUsage**: 用法标记（color / depth / input / sampled ...），推导默认状态
//! - **RgPassDesc**: pass 声明，引用列表的顺序决定能否与相邻 pass 合并
//! - **RgUseChain**: 每张图像的使用链，O(1) 查询下一个使用者
//! - **RenderGraph / RgFrame**: 构建结果和每帧回放
//!
//! # 使用示例
//!
//! ```ignore
//! use tessera_render_graph::*;
//!
//! let mut builder = RgGraphBuilder::new();
//! let color = builder.import_image("color", image, view, vk::Format::R8G8B8A8_UNORM, vk::ImageAspectFlags::COLOR);
//!
//! builder
//!     .add_pass(RgPassDesc::new("draw").use_image(color, RgImageUsage::COLOR_ATTACHMENT | RgImageUsage::CLEARED))
//!     .add_pass(
//!         RgPassDesc::new("present")
//!             .use_image(RgImageId::Swapchain, RgImageUsage::COLOR_ATTACHMENT)
//!             .use_image(color, RgImageUsage::SAMPLED),
//!     );
//! let mut graph = builder.build();
//!
//! // 每帧
//! let frame_info = RgFrameInfo::new(extent, queue_family_index).with_swapchain(swapchain_image, swapchain_view);
//! let mut frame = graph.begin_frame(frame_info, &mut cmd);
//! for _ in 0..2 {
//!     let pass = frame.begin_pass();
//!     // 录制绘制命令...
//!     frame.end_pass();
//! }
//! frame.end_frame();
//! ```
//!
//! # 模块结构
//!
//! - `resource_*` / `image_*`: 图像、句柄、状态与用法标记
//! - `pass`: pass 声明与规范化
//! - `merge`: 相邻 pass 合并
//! - `use_chain`: 使用链
//! - `graph`: 构建与 barrier 计算
//! - `executor`: 每帧回放
//! - `debug` / `config`: 执行计划、DOT 导出和调试配置

pub mod barrier;
pub mod commands;
pub mod config;
pub mod debug;
pub mod example;
pub mod executor;
pub mod graph;
pub mod image_resource;
pub mod image_usage;
pub mod merge;
pub mod pass;
pub mod resource_handle;
pub mod resource_registry;
pub mod resource_state;
pub mod use_chain;

// Re-exports
pub use barrier::RgImageBarrierDesc;
pub use commands::{RgCommands, RgRecordedCommand, RgRecordingCommands};
pub use config::RgDebugConfig;
pub use debug::{format_access_flags, format_pipeline_stage};
pub use executor::{RgFrame, RgFrameInfo};
pub use graph::{RenderGraph, RgGraphBuilder};
pub use image_resource::RgImageResource;
pub use image_usage::RgImageUsage;
pub use merge::{RgMergeRejection, RgMergedAttachments};
pub use pass::{MAX_COLOR_ATTACHMENTS, MAX_INPUT_ATTACHMENTS, RgImageRef, RgImageRefDesc, RgPass, RgPassDesc};
pub use resource_handle::{RgImageHandle, RgImageId};
pub use resource_registry::RgResourceRegistry;
pub use resource_state::RgImageState;
pub use use_chain::{RgImageUse, RgUseChain};
