use ash::vk;

/// graph 追踪的图像
///
/// 只保存句柄，不拥有图像和视图，生命周期由外部的资源分配器管理
#[derive(Clone, Debug)]
pub struct RgImageResource {
    /// 调试名称
    pub name: String,
    pub image: vk::Image,
    pub view: vk::ImageView,
    pub format: vk::Format,
    /// barrier 的 subresource aspect
    pub aspect: vk::ImageAspectFlags,
}

// new & init
impl RgImageResource {
    pub fn new(
        name: impl Into<String>,
        image: vk::Image,
        view: vk::ImageView,
        format: vk::Format,
        aspect: vk::ImageAspectFlags,
    ) -> Self {
        Self {
            name: name.into(),
            image,
            view,
            format,
            aspect,
        }
    }

    /// aspect 由格式推断
    pub fn with_inferred_aspect(name: impl Into<String>, image: vk::Image, view: vk::ImageView, format: vk::Format) -> Self {
        Self::new(name, image, view, format, Self::infer_aspect(format))
    }

    /// swapchain 占位：句柄在每帧 `begin_frame` 时绑定
    pub(crate) fn swapchain() -> Self {
        Self::new(
            "Swapchain",
            vk::Image::null(),
            vk::ImageView::null(),
            vk::Format::UNDEFINED,
            vk::ImageAspectFlags::COLOR,
        )
    }

    /// 从格式推断 aspect
    pub fn infer_aspect(format: vk::Format) -> vk::ImageAspectFlags {
        match format {
            vk::Format::D16_UNORM | vk::Format::D32_SFLOAT | vk::Format::X8_D24_UNORM_PACK32 => {
                vk::ImageAspectFlags::DEPTH
            }
            vk::Format::S8_UINT => vk::ImageAspectFlags::STENCIL,
            vk::Format::D16_UNORM_S8_UINT | vk::Format::D24_UNORM_S8_UINT | vk::Format::D32_SFLOAT_S8_UINT => {
                vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
            }
            _ => vk::ImageAspectFlags::COLOR,
        }
    }
}
