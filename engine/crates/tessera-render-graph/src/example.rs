//! 延迟渲染示例图
//!
//! 阴影、G-Buffer、大气、光照、bloom、合成、GUI 七个 pass。
//! 图像句柄是占位值，只用于打印执行计划、导出 DOT 和测试。

use ash::vk;
use ash::vk::Handle;

use crate::graph::{RenderGraph, RgGraphBuilder};
use crate::image_resource::RgImageResource;
use crate::image_usage::RgImageUsage;
use crate::pass::{RgImageRefDesc, RgPassDesc};
use crate::resource_handle::{RgImageHandle, RgImageId};

/// 示例图导入的图像
#[derive(Clone, Copy, Debug)]
pub struct RgDeferredImages {
    pub color: RgImageHandle,
    pub depth: RgImageHandle,
    pub gbuffer: [RgImageHandle; 3],
    pub shadow: RgImageHandle,
}

fn import(builder: &mut RgGraphBuilder, name: &str, raw: u64, format: vk::Format) -> RgImageHandle {
    builder.import_image(
        name,
        vk::Image::from_raw(raw),
        vk::ImageView::from_raw(raw | 0x1000),
        format,
        RgImageResource::infer_aspect(format),
    )
}

/// 构建示例图
///
/// 合并结果：atmosphere 和 lighting 共用一个 region，composite 和 gui 共用一个 region
pub fn deferred_example() -> (RenderGraph, RgDeferredImages) {
    let mut builder = RgGraphBuilder::new();

    let images = RgDeferredImages {
        color: import(&mut builder, "Color 0", 1, vk::Format::R16G16B16A16_SFLOAT),
        depth: import(&mut builder, "Depth 0", 2, vk::Format::D32_SFLOAT),
        gbuffer: [
            import(&mut builder, "GBuffer 0", 3, vk::Format::R8G8B8A8_SRGB),
            import(&mut builder, "GBuffer 1", 4, vk::Format::R8G8B8A8_UNORM),
            import(&mut builder, "GBuffer 2", 5, vk::Format::R8G8B8A8_SRGB),
        ],
        shadow: import(&mut builder, "Shadow 0", 6, vk::Format::D32_SFLOAT),
    };
    let color_input = RgImageUsage::COLOR_ATTACHMENT | RgImageUsage::INPUT_ATTACHMENT;

    builder
        .add_pass(
            RgPassDesc::new("shadow")
                .image_ref(
                    RgImageRefDesc::new(images.shadow, RgImageUsage::DEPTH_ATTACHMENT | RgImageUsage::CLEARED)
                        .with_clear_depth(1.0, 0),
                )
                .with_render_area(vk::Rect2D {
                    offset: vk::Offset2D::default(),
                    extent: vk::Extent2D { width: 2048, height: 2048 },
                }),
        )
        .add_pass(
            RgPassDesc::new("hdr geometry")
                .image_ref(
                    RgImageRefDesc::new(images.depth, RgImageUsage::DEPTH_ATTACHMENT | RgImageUsage::CLEARED)
                        .with_clear_depth(1.0, 0),
                )
                .use_image(images.gbuffer[0], RgImageUsage::COLOR_ATTACHMENT | RgImageUsage::NO_READ)
                .use_image(images.gbuffer[1], RgImageUsage::COLOR_ATTACHMENT | RgImageUsage::NO_READ)
                .use_image(images.gbuffer[2], RgImageUsage::COLOR_ATTACHMENT | RgImageUsage::NO_READ),
        )
        .add_pass(
            RgPassDesc::new("hdr atmosphere")
                .image_ref(
                    RgImageRefDesc::new(images.color, color_input | RgImageUsage::CLEARED)
                        .with_clear_color([0.0, 0.0, 0.0, 1.0]),
                )
                .use_image(images.depth, RgImageUsage::DEPTH_ATTACHMENT),
        )
        .add_pass(
            RgPassDesc::new("hdr lighting")
                .use_image(images.color, color_input)
                .use_image(images.depth, RgImageUsage::INPUT_ATTACHMENT)
                .use_image(images.gbuffer[0], RgImageUsage::INPUT_ATTACHMENT)
                .use_image(images.gbuffer[1], RgImageUsage::INPUT_ATTACHMENT)
                .use_image(images.gbuffer[2], RgImageUsage::INPUT_ATTACHMENT)
                .use_image(images.shadow, RgImageUsage::SAMPLED),
        )
        .add_pass(
            RgPassDesc::new("bloom")
                .image_ref(
                    RgImageRefDesc::new(images.color, RgImageUsage::SAMPLED)
                        .with_final_layout(vk::ImageLayout::GENERAL),
                ),
        )
        .add_pass(
            RgPassDesc::new("sdr composite")
                .use_image(RgImageId::Swapchain, RgImageUsage::COLOR_ATTACHMENT | RgImageUsage::NO_READ)
                .use_image(images.color, RgImageUsage::INPUT_ATTACHMENT)
                .use_image(images.depth, RgImageUsage::INPUT_ATTACHMENT),
        )
        .add_pass(RgPassDesc::new("sdr gui").use_image(RgImageId::Swapchain, RgImageUsage::COLOR_ATTACHMENT));

    (builder.build(), images)
}
