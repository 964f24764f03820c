use ash::vk;
use slotmap::SlotMap;

use crate::image_resource::RgImageResource;
use crate::resource_handle::{RgImageHandle, RgImageId};

/// 资源注册表
///
/// 管理 graph 中所有导入的图像，外加一个固定的 swapchain 槽位。
/// 图像存放在 SlotMap 中，句柄稳定，扩容不会使已有句柄失效。
pub struct RgResourceRegistry {
    /// 图像资源表
    images: SlotMap<RgImageHandle, RgImageResource>,
    /// swapchain 槽位，句柄每帧重新绑定
    swapchain: RgImageResource,
}

impl Default for RgResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// new & init
impl RgResourceRegistry {
    pub fn new() -> Self {
        Self {
            images: SlotMap::with_key(),
            swapchain: RgImageResource::swapchain(),
        }
    }
}

// register
impl RgResourceRegistry {
    pub fn register_image(&mut self, rg_image_resource: RgImageResource) -> RgImageHandle {
        self.images.insert(rg_image_resource)
    }

    /// 绑定本帧 acquire 到的 swapchain 图像
    pub fn bind_swapchain(&mut self, image: vk::Image, view: vk::ImageView) {
        self.swapchain.image = image;
        self.swapchain.view = view;
    }
}

// getter & iter
impl RgResourceRegistry {
    /// 获取图像资源
    #[inline]
    pub fn get_image(&self, handle: RgImageHandle) -> Option<&RgImageResource> {
        self.images.get(handle)
    }

    /// 按引用 id 获取图像
    ///
    /// # Panics
    /// 句柄不属于这个注册表
    #[inline]
    pub fn resolve(&self, id: RgImageId) -> &RgImageResource {
        match id {
            RgImageId::Image(handle) => self
                .images
                .get(handle)
                .unwrap_or_else(|| panic!("RenderGraph: image handle {:?} is not registered", handle)),
            RgImageId::Swapchain => &self.swapchain,
        }
    }

    #[inline]
    pub fn contains(&self, id: RgImageId) -> bool {
        match id {
            RgImageId::Image(handle) => self.images.contains_key(handle),
            RgImageId::Swapchain => true,
        }
    }

    /// 获取图像数量，不含 swapchain
    #[inline]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// 迭代所有图像资源，不含 swapchain
    #[inline]
    pub fn iter_images(&self) -> impl Iterator<Item = (RgImageHandle, &RgImageResource)> {
        self.images.iter()
    }

    /// 按注册顺序迭代所有图像 id，最后是 swapchain
    #[inline]
    pub fn iter_ids(&self) -> impl Iterator<Item = RgImageId> + '_ {
        self.images.keys().map(RgImageId::Image).chain(std::iter::once(RgImageId::Swapchain))
    }
}
