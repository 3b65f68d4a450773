/// Main render pass - Vulkan translation of `MainPassDesc`

use ash::vk;
use lumen_gfx::lumen::device::{AttachmentDesc, AttachmentFormat, AttachmentRef, MainPassDesc};
use lumen_gfx::lumen::Result;

use crate::vulkan_format::{
    access_to_vk, color_format_to_vk, depth_format_to_vk, image_layout_to_vk, load_op_to_vk,
    stages_to_vk, store_op_to_vk, subpass_to_vk, vk_error,
};

fn attachment_to_vk(desc: &AttachmentDesc) -> vk::AttachmentDescription {
    let format = match desc.format {
        AttachmentFormat::Color(format) => color_format_to_vk(format),
        AttachmentFormat::Depth(format) => depth_format_to_vk(format),
    };

    vk::AttachmentDescription::default()
        .format(format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(load_op_to_vk(desc.load_op))
        .store_op(store_op_to_vk(desc.store_op))
        .stencil_load_op(load_op_to_vk(desc.stencil_load_op))
        .stencil_store_op(store_op_to_vk(desc.stencil_store_op))
        .initial_layout(image_layout_to_vk(desc.initial_layout))
        .final_layout(image_layout_to_vk(desc.final_layout))
}

fn reference_to_vk(reference: &AttachmentRef) -> vk::AttachmentReference {
    vk::AttachmentReference::default()
        .attachment(reference.attachment)
        .layout(image_layout_to_vk(reference.layout))
}

pub(crate) fn create_render_pass(device: &ash::Device, desc: &MainPassDesc) -> Result<vk::RenderPass> {
    let attachments = desc.attachments().map(|attachment| attachment_to_vk(&attachment));

    let color_refs = [reference_to_vk(&desc.subpass().color)];
    let depth_ref = reference_to_vk(&desc.subpass().depth);

    let subpasses = [vk::SubpassDescription::default()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(&color_refs)
        .depth_stencil_attachment(&depth_ref)];

    let dependency = desc.dependency();
    let dependencies = [vk::SubpassDependency::default()
        .src_subpass(subpass_to_vk(dependency.src_subpass))
        .dst_subpass(subpass_to_vk(dependency.dst_subpass))
        .src_stage_mask(stages_to_vk(dependency.src_stages))
        .dst_stage_mask(stages_to_vk(dependency.dst_stages))
        .src_access_mask(access_to_vk(dependency.src_access))
        .dst_access_mask(access_to_vk(dependency.dst_access))];

    let render_pass_info = vk::RenderPassCreateInfo::default()
        .attachments(&attachments)
        .subpasses(&subpasses)
        .dependencies(&dependencies);

    unsafe {
        device
            .create_render_pass(&render_pass_info, None)
            .map_err(|e| vk_error("vkCreateRenderPass", e))
    }
}
