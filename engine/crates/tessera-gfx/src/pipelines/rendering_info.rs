use std::fmt;

use ash::vk;

/// dynamic rendering 的 attachment 描述
///
/// 和 `vk::RenderingAttachmentInfo` 一一对应，但不带生命周期，方便保存和比较
#[derive(Clone, Copy)]
pub struct GfxRenderingAttachment {
    pub image_view: vk::ImageView,
    pub image_layout: vk::ImageLayout,
    pub load_op: vk::AttachmentLoadOp,
    pub store_op: vk::AttachmentStoreOp,
    pub clear_value: vk::ClearValue,
}

// ClearValue 是 union，没有 Debug
impl fmt::Debug for GfxRenderingAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GfxRenderingAttachment")
            .field("image_view", &self.image_view)
            .field("image_layout", &self.image_layout)
            .field("load_op", &self.load_op)
            .field("store_op", &self.store_op)
            .finish_non_exhaustive()
    }
}

impl GfxRenderingAttachment {
    #[inline]
    pub fn attachment_info(&self) -> vk::RenderingAttachmentInfo<'static> {
        vk::RenderingAttachmentInfo::default()
            .image_view(self.image_view)
            .image_layout(self.image_layout)
            .load_op(self.load_op)
            .store_op(self.store_op)
            .clear_value(self.clear_value)
    }
}

/// `vkCmdBeginRendering` 需要的全部信息
#[derive(Clone, Debug)]
pub struct GfxRenderingInfo {
    color_attachments: Vec<GfxRenderingAttachment>,
    depth_attachment: Option<GfxRenderingAttachment>,
    render_area: vk::Rect2D,

    color_attach_infos: Vec<vk::RenderingAttachmentInfo<'static>>,
    depth_attach_info: Option<vk::RenderingAttachmentInfo<'static>>,
}

// new & init
impl GfxRenderingInfo {
    pub fn new(
        color_attachments: Vec<GfxRenderingAttachment>,
        depth_attachment: Option<GfxRenderingAttachment>,
        render_area: vk::Rect2D,
    ) -> Self {
        Self {
            color_attach_infos: color_attachments.iter().map(GfxRenderingAttachment::attachment_info).collect(),
            depth_attach_info: depth_attachment.as_ref().map(GfxRenderingAttachment::attachment_info),
            color_attachments,
            depth_attachment,
            render_area,
        }
    }
}

// getters
impl GfxRenderingInfo {
    #[inline]
    pub fn color_attachments(&self) -> &[GfxRenderingAttachment] {
        &self.color_attachments
    }

    #[inline]
    pub fn depth_attachment(&self) -> Option<&GfxRenderingAttachment> {
        self.depth_attachment.as_ref()
    }

    #[inline]
    pub fn render_area(&self) -> vk::Rect2D {
        self.render_area
    }

    /// 借用内部的 attachment 数组，生成 `vk::RenderingInfo`
    pub fn rendering_info(&self) -> vk::RenderingInfo<'_> {
        let mut info = vk::RenderingInfo::default()
            .layer_count(1)
            .render_area(self.render_area)
            .color_attachments(&self.color_attach_infos);
        if let Some(depth_attach) = &self.depth_attach_info {
            info = info.depth_attachment(depth_attach);
        }
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(layout: vk::ImageLayout, load_op: vk::AttachmentLoadOp) -> GfxRenderingAttachment {
        GfxRenderingAttachment {
            image_view: vk::ImageView::null(),
            image_layout: layout,
            load_op,
            store_op: vk::AttachmentStoreOp::STORE,
            clear_value: vk::ClearValue::default(),
        }
    }

    #[test]
    fn test_rendering_info_counts() {
        let area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: vk::Extent2D { width: 64, height: 32 },
        };
        let info = GfxRenderingInfo::new(
            vec![
                attachment(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL, vk::AttachmentLoadOp::CLEAR),
                attachment(vk::ImageLayout::GENERAL, vk::AttachmentLoadOp::LOAD),
            ],
            Some(attachment(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL, vk::AttachmentLoadOp::DONT_CARE)),
            area,
        );

        let vk_info = info.rendering_info();
        assert_eq!(vk_info.color_attachment_count, 2);
        assert_eq!(vk_info.layer_count, 1);
        assert_eq!(vk_info.render_area.extent.width, 64);
        assert!(!vk_info.p_depth_attachment.is_null());
        assert_eq!(info.color_attachments()[1].image_layout, vk::ImageLayout::GENERAL);
    }

    #[test]
    fn test_attachment_debug_skips_clear_value() {
        let text = format!("{:?}", attachment(vk::ImageLayout::GENERAL, vk::AttachmentLoadOp::CLEAR));
        assert!(text.contains("GENERAL"));
        assert!(text.contains("CLEAR"));
        assert!(!text.contains("clear_value"));
        assert!(text.ends_with(".. }"));
    }

    #[test]
    fn test_rendering_info_without_depth() {
        let info = GfxRenderingInfo::new(vec![], None, vk::Rect2D::default());
        assert!(info.rendering_info().p_depth_attachment.is_null());
        assert!(info.depth_attachment().is_none());
    }
}
