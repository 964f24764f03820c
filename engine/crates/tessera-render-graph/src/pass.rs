//! Pass 描述与规范化
//!
//! 用户用 [`RgPassDesc`] 声明 pass 引用了哪些图像、怎么用；
//! [`RgPass::from_desc`] 把用法标记展开成完整的 layout/stage/access/load op，
//! 并检查附件配置是否合法。非法配置属于编程错误，直接 panic。

use std::fmt;

use ash::vk;
use itertools::Itertools;

use crate::image_usage::RgImageUsage;
use crate::resource_handle::RgImageId;
use crate::resource_state::RgImageState;

/// 单个 pass 的颜色附件上限
pub const MAX_COLOR_ATTACHMENTS: usize = 8;
/// 单个 pass 的 input attachment 上限
pub const MAX_INPUT_ATTACHMENTS: usize = 8;

/// pass 对一张图像的引用声明
///
/// 除 `image` 和 `usage` 外都是可选覆盖项，未设置时由 usage 推导
#[derive(Clone, Copy)]
pub struct RgImageRefDesc {
    pub image: RgImageId,
    pub usage: RgImageUsage,
    pub layout: Option<vk::ImageLayout>,
    pub final_layout: Option<vk::ImageLayout>,
    pub stage: Option<vk::PipelineStageFlags2>,
    pub access: Option<vk::AccessFlags2>,
    /// 只有 usage 包含 CLEARED 时才有意义
    pub clear_value: vk::ClearValue,
}

// new & builder
impl RgImageRefDesc {
    pub fn new(image: impl Into<RgImageId>, usage: RgImageUsage) -> Self {
        Self {
            image: image.into(),
            usage,
            layout: None,
            final_layout: None,
            stage: None,
            access: None,
            clear_value: vk::ClearValue::default(),
        }
    }

    /// builder
    #[inline]
    pub fn with_layout(mut self, layout: vk::ImageLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// builder
    ///
    /// pass 结束后图像停留的 layout，例如 compute 写入后留在 GENERAL
    #[inline]
    pub fn with_final_layout(mut self, final_layout: vk::ImageLayout) -> Self {
        self.final_layout = Some(final_layout);
        self
    }

    /// builder
    #[inline]
    pub fn with_stage(mut self, stage: vk::PipelineStageFlags2) -> Self {
        self.stage = Some(stage);
        self
    }

    /// builder
    #[inline]
    pub fn with_access(mut self, access: vk::AccessFlags2) -> Self {
        self.access = Some(access);
        self
    }

    /// builder
    #[inline]
    pub fn with_clear_value(mut self, clear_value: vk::ClearValue) -> Self {
        self.clear_value = clear_value;
        self
    }

    /// builder
    #[inline]
    pub fn with_clear_color(self, color: [f32; 4]) -> Self {
        self.with_clear_value(vk::ClearValue {
            color: vk::ClearColorValue { float32: color },
        })
    }

    /// builder
    #[inline]
    pub fn with_clear_depth(self, depth: f32, stencil: u32) -> Self {
        self.with_clear_value(vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue { depth, stencil },
        })
    }
}

impl fmt::Debug for RgImageRefDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RgImageRefDesc")
            .field("image", &self.image)
            .field("usage", &self.usage)
            .field("layout", &self.layout)
            .field("final_layout", &self.final_layout)
            .field("stage", &self.stage)
            .field("access", &self.access)
            .finish_non_exhaustive()
    }
}

/// pass 声明
#[derive(Clone, Debug)]
pub struct RgPassDesc {
    pub name: String,
    /// 顺序有意义：相邻 pass 的引用列表按下标对齐时才能合并
    pub image_refs: Vec<RgImageRefDesc>,
    /// 为空或宽度为 0 时使用每帧传入的 render area
    pub render_area: Option<vk::Rect2D>,
    /// compute pass 不开启 rendering region
    pub compute: bool,
}

// new & builder
impl RgPassDesc {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image_refs: Vec::new(),
            render_area: None,
            compute: false,
        }
    }

    /// builder
    #[inline]
    pub fn image_ref(mut self, image_ref: RgImageRefDesc) -> Self {
        self.image_refs.push(image_ref);
        self
    }

    /// builder
    #[inline]
    pub fn use_image(self, image: impl Into<RgImageId>, usage: RgImageUsage) -> Self {
        self.image_ref(RgImageRefDesc::new(image, usage))
    }

    /// builder
    #[inline]
    pub fn with_render_area(mut self, render_area: vk::Rect2D) -> Self {
        self.render_area = Some(render_area);
        self
    }

    /// builder
    #[inline]
    pub fn compute(mut self) -> Self {
        self.compute = true;
        self
    }
}

/// 规范化后的图像引用
#[derive(Clone, Copy)]
pub struct RgImageRef {
    pub image: RgImageId,
    pub usage: RgImageUsage,
    pub initial_layout: vk::ImageLayout,
    pub final_layout: vk::ImageLayout,
    pub stage: vk::PipelineStageFlags2,
    pub access: vk::AccessFlags2,
    pub load_op: vk::AttachmentLoadOp,
    pub store_op: vk::AttachmentStoreOp,
    pub clear_value: vk::ClearValue,
}

impl RgImageRef {
    fn from_desc(desc: &RgImageRefDesc) -> Self {
        let usage = desc.usage.effective();
        // 占位引用忽略全部覆盖项
        let desc = if usage.contains(RgImageUsage::FAKE) { RgImageRefDesc::new(desc.image, usage) } else { *desc };
        let initial_layout = desc.layout.unwrap_or_else(|| usage.default_layout());

        Self {
            image: desc.image,
            usage,
            initial_layout,
            final_layout: desc.final_layout.unwrap_or(initial_layout),
            stage: desc.stage.unwrap_or_else(|| usage.default_stage()),
            access: desc.access.unwrap_or_else(|| usage.default_access()),
            load_op: usage.load_op(),
            store_op: vk::AttachmentStoreOp::STORE,
            clear_value: desc.clear_value,
        }
    }

    /// pass 开始时需要的状态
    #[inline]
    pub fn initial_state(&self) -> RgImageState {
        RgImageState::new(self.stage, self.access, self.initial_layout)
    }

    /// pass 结束后的状态
    #[inline]
    pub fn final_state(&self) -> RgImageState {
        RgImageState::new(self.stage, self.access, self.final_layout)
    }

    /// 占位引用不参与同步
    #[inline]
    pub fn is_fake(&self) -> bool {
        self.usage.contains(RgImageUsage::FAKE)
    }
}

impl fmt::Debug for RgImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RgImageRef")
            .field("image", &self.image)
            .field("usage", &self.usage)
            .field("initial_layout", &self.initial_layout)
            .field("final_layout", &self.final_layout)
            .field("stage", &self.stage)
            .field("access", &self.access)
            .field("load_op", &self.load_op)
            .field("store_op", &self.store_op)
            .finish_non_exhaustive()
    }
}

/// 规范化后的 pass
#[derive(Clone, Debug)]
pub struct RgPass {
    pub(crate) name: String,
    pub(crate) image_refs: Vec<RgImageRef>,
    /// 颜色附件在 `image_refs` 中的下标，升序
    pub(crate) color_attachments: Vec<usize>,
    /// input attachment 在 `image_refs` 中的下标，升序
    pub(crate) input_attachments: Vec<usize>,
    pub(crate) depth_attachment: Option<usize>,
    /// 采样读取的引用下标，升序；合并后覆盖整个 run
    pub(crate) sampled_refs: Vec<usize>,
    pub(crate) render_area: Option<vk::Rect2D>,
    pub(crate) compute: bool,
    pub(crate) merged_with_prev: bool,
    pub(crate) merged_with_next: bool,
}

// new & init
impl RgPass {
    /// 展开默认值并校验附件配置
    ///
    /// # Panics
    /// - 同一个引用既是颜色附件又是深度附件
    /// - 声明了第二个深度附件
    /// - 颜色附件或 input attachment 超过上限
    pub fn from_desc(desc: &RgPassDesc) -> Self {
        let mut color_attachments = Vec::new();
        let mut input_attachments = Vec::new();
        let mut depth_attachment = None;

        for (ref_index, ref_desc) in desc.image_refs.iter().enumerate() {
            let usage = ref_desc.usage.effective();
            assert!(
                !usage.contains(RgImageUsage::COLOR_ATTACHMENT | RgImageUsage::DEPTH_ATTACHMENT),
                "RenderGraph: pass \"{}\" uses image #{} as both a color and a depth attachment",
                desc.name,
                ref_index
            );

            if usage.contains(RgImageUsage::COLOR_ATTACHMENT) {
                color_attachments.push(ref_index);
            }
            if usage.contains(RgImageUsage::INPUT_ATTACHMENT) {
                input_attachments.push(ref_index);
            }
            if usage.contains(RgImageUsage::DEPTH_ATTACHMENT) {
                if let Some(prev) = depth_attachment {
                    panic!(
                        "RenderGraph: pass \"{}\" declares a second depth attachment (#{} after #{})",
                        desc.name, ref_index, prev
                    );
                }
                depth_attachment = Some(ref_index);
            }
        }

        assert!(
            color_attachments.len() <= MAX_COLOR_ATTACHMENTS,
            "RenderGraph: pass \"{}\" has {} color attachments, at most {} are supported",
            desc.name,
            color_attachments.len(),
            MAX_COLOR_ATTACHMENTS
        );
        assert!(
            input_attachments.len() <= MAX_INPUT_ATTACHMENTS,
            "RenderGraph: pass \"{}\" has {} input attachments, at most {} are supported",
            desc.name,
            input_attachments.len(),
            MAX_INPUT_ATTACHMENTS
        );

        let image_refs = desc.image_refs.iter().map(RgImageRef::from_desc).collect_vec();
        let sampled_refs =
            image_refs.iter().positions(|image_ref| image_ref.initial_state().is_sampled_read()).collect_vec();

        Self {
            name: desc.name.clone(),
            image_refs,
            color_attachments,
            input_attachments,
            depth_attachment,
            sampled_refs,
            render_area: desc.render_area.filter(|area| area.extent.width != 0),
            compute: desc.compute,
            merged_with_prev: false,
            merged_with_next: false,
        }
    }
}

// getters
impl RgPass {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn image_refs(&self) -> &[RgImageRef] {
        &self.image_refs
    }

    #[inline]
    pub fn color_attachments(&self) -> &[usize] {
        &self.color_attachments
    }

    #[inline]
    pub fn input_attachments(&self) -> &[usize] {
        &self.input_attachments
    }

    #[inline]
    pub fn depth_attachment(&self) -> Option<usize> {
        self.depth_attachment
    }

    #[inline]
    pub fn sampled_refs(&self) -> &[usize] {
        &self.sampled_refs
    }

    #[inline]
    pub fn render_area(&self) -> Option<vk::Rect2D> {
        self.render_area
    }

    #[inline]
    pub fn is_compute(&self) -> bool {
        self.compute
    }

    #[inline]
    pub fn merged_with_prev(&self) -> bool {
        self.merged_with_prev
    }

    #[inline]
    pub fn merged_with_next(&self) -> bool {
        self.merged_with_next
    }

    /// 第一个引用该图像的非占位引用
    pub fn find_ref(&self, image: RgImageId) -> Option<usize> {
        self.image_refs.iter().position(|image_ref| image_ref.image == image && !image_ref.is_fake())
    }
}
