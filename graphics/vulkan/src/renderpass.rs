use std::sync::Arc;

use ash::vk;
use smallvec::SmallVec;

use emberline_core::gpu::{
    Framebuffer,
    FramebufferAttachmentInfo,
    FramebufferInfo,
    GPUError,
    LoadOp,
    Texture,
    TextureLayout,
};

use crate::{
    aspect_mask,
    format_to_vk,
    samples_to_vk,
    vk_error,
    RawVkDevice,
    VkBackend,
    VkImage,
};

pub(crate) struct VkAttachment {
    pub(crate) image: Arc<VkImage>,
    pub(crate) mip_level: u32,
    pub(crate) array_layer: u32,
    view: vk::ImageView,
}

impl VkAttachment {
    pub(crate) fn layout(&self) -> TextureLayout {
        if self.image.format.is_depth() {
            TextureLayout::DepthStencilReadWrite
        } else {
            TextureLayout::RenderTarget
        }
    }
}

/// A framebuffer together with the two render passes it is used with,
/// one clearing every attachment and one loading them.
pub struct VkFramebuffer {
    framebuffer: vk::Framebuffer,
    clear_pass: vk::RenderPass,
    load_pass: vk::RenderPass,
    attachments: SmallVec<[VkAttachment; 5]>,
    color_target_count: u32,
    has_depth_target: bool,
    width: u32,
    height: u32,
    device: Arc<RawVkDevice>,
}

impl VkFramebuffer {
    pub(crate) unsafe fn new(device: &Arc<RawVkDevice>, info: &FramebufferInfo<VkBackend>) -> Result<Self, GPUError> {
        let Some(first) = info.color_targets.first().or(info.depth_target.as_ref()) else {
            return Err(GPUError::Unsupported("framebuffers without attachments"));
        };
        let extent = first.texture.info().mip_extent(first.mip_level);

        let mut framebuffer = Self {
            framebuffer: vk::Framebuffer::null(),
            clear_pass: vk::RenderPass::null(),
            load_pass: vk::RenderPass::null(),
            attachments: SmallVec::new(),
            color_target_count: info.color_targets.len() as u32,
            has_depth_target: info.depth_target.is_some(),
            width: extent.width,
            height: extent.height,
            device: device.clone(),
        };
        // Everything created so far is released by Drop if a later step fails.
        for attachment in info.color_targets.iter().chain(info.depth_target.iter()) {
            framebuffer.attachments.push(create_attachment(device, attachment)?);
        }
        framebuffer.clear_pass = create_render_pass(device, info, vk::AttachmentLoadOp::CLEAR)?;
        framebuffer.load_pass = create_render_pass(device, info, vk::AttachmentLoadOp::LOAD)?;

        let views: SmallVec<[vk::ImageView; 5]> = framebuffer.attachments.iter().map(|attachment| attachment.view).collect();
        framebuffer.framebuffer = device
            .create_framebuffer(
                &vk::FramebufferCreateInfo {
                    render_pass: framebuffer.load_pass,
                    attachment_count: views.len() as u32,
                    p_attachments: views.as_ptr(),
                    width: extent.width,
                    height: extent.height,
                    layers: 1,
                    ..Default::default()
                },
                None,
            )
            .map_err(vk_error)?;
        Ok(framebuffer)
    }

    pub fn handle(&self) -> vk::Framebuffer {
        self.framebuffer
    }

    /// Both passes are compatible with the framebuffer, they only differ in
    /// their load operations.
    pub(crate) fn render_pass(&self, load_op: LoadOp) -> vk::RenderPass {
        match load_op {
            LoadOp::Clear => self.clear_pass,
            LoadOp::Load => self.load_pass,
        }
    }

    pub(crate) fn attachments(&self) -> &[VkAttachment] {
        &self.attachments
    }
}

unsafe fn create_attachment(
    device: &Arc<RawVkDevice>,
    attachment: &FramebufferAttachmentInfo<VkBackend>,
) -> Result<VkAttachment, GPUError> {
    let Some((image, mip_level, array_layer)) = attachment.texture.image_for(attachment.mip_level, attachment.array_layer) else {
        return Err(GPUError::Unsupported("attachment subresource does not exist"));
    };
    let view = device
        .create_image_view(
            &vk::ImageViewCreateInfo {
                image: image.image,
                view_type: vk::ImageViewType::TYPE_2D,
                format: format_to_vk(image.format),
                subresource_range: vk::ImageSubresourceRange {
                    aspect_mask: aspect_mask(image.format),
                    base_mip_level: mip_level,
                    level_count: 1,
                    base_array_layer: array_layer,
                    layer_count: 1,
                },
                ..Default::default()
            },
            None,
        )
        .map_err(vk_error)?;
    Ok(VkAttachment {
        image: image.clone(),
        mip_level,
        array_layer,
        view,
    })
}

unsafe fn create_render_pass(
    device: &RawVkDevice,
    info: &FramebufferInfo<VkBackend>,
    load_op: vk::AttachmentLoadOp,
) -> Result<vk::RenderPass, GPUError> {
    let describe = |attachment: &FramebufferAttachmentInfo<VkBackend>, layout: vk::ImageLayout| {
        let texture_info = attachment.texture.info();
        vk::AttachmentDescription {
            format: format_to_vk(texture_info.format),
            samples: samples_to_vk(texture_info.samples),
            load_op,
            store_op: vk::AttachmentStoreOp::STORE,
            stencil_load_op: load_op,
            stencil_store_op: vk::AttachmentStoreOp::STORE,
            initial_layout: layout,
            final_layout: layout,
            ..Default::default()
        }
    };

    let mut descriptions = SmallVec::<[vk::AttachmentDescription; 5]>::new();
    let mut color_references = SmallVec::<[vk::AttachmentReference; 4]>::new();
    for attachment in info.color_targets {
        color_references.push(vk::AttachmentReference {
            attachment: descriptions.len() as u32,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        });
        descriptions.push(describe(attachment, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL));
    }
    let depth_reference = info.depth_target.as_ref().map(|attachment| {
        let reference = vk::AttachmentReference {
            attachment: descriptions.len() as u32,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };
        descriptions.push(describe(attachment, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL));
        reference
    });

    let subpass = vk::SubpassDescription {
        pipeline_bind_point: vk::PipelineBindPoint::GRAPHICS,
        color_attachment_count: color_references.len() as u32,
        p_color_attachments: color_references.as_ptr(),
        p_depth_stencil_attachment: depth_reference
            .as_ref()
            .map_or(std::ptr::null(), |reference| reference as *const vk::AttachmentReference),
        ..Default::default()
    };
    device
        .create_render_pass(
            &vk::RenderPassCreateInfo {
                attachment_count: descriptions.len() as u32,
                p_attachments: descriptions.as_ptr(),
                subpass_count: 1,
                p_subpasses: &subpass,
                ..Default::default()
            },
            None,
        )
        .map_err(vk_error)
}

impl Drop for VkFramebuffer {
    fn drop(&mut self) {
        unsafe {
            if self.framebuffer != vk::Framebuffer::null() {
                self.device.destroy_framebuffer(self.framebuffer, None);
            }
            if self.clear_pass != vk::RenderPass::null() {
                self.device.destroy_render_pass(self.clear_pass, None);
            }
            if self.load_pass != vk::RenderPass::null() {
                self.device.destroy_render_pass(self.load_pass, None);
            }
            for attachment in &self.attachments {
                self.device.destroy_image_view(attachment.view, None);
            }
        }
    }
}

impl Framebuffer for VkFramebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn color_target_count(&self) -> u32 {
        self.color_target_count
    }

    fn has_depth_target(&self) -> bool {
        self.has_depth_target
    }
}
