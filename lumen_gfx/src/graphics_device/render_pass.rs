/// Render pass description - how the main pass loads, stores and transitions
/// its attachments
///
/// The description is backend-agnostic. Backends translate it once at startup;
/// it is never rebuilt on swapchain recreation.

use bitflags::bitflags;
use crate::graphics_device::{ColorFormat, DepthFormat};

/// Index of the color attachment in the main pass
pub const COLOR_ATTACHMENT: u32 = 0;
/// Index of the depth attachment in the main pass
pub const DEPTH_ATTACHMENT: u32 = 1;

/// Load operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    /// Load existing content
    Load,
    /// Clear the content
    Clear,
    /// Don't care about existing content
    DontCare,
}

/// Store operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    /// Store the rendered content
    Store,
    /// Don't care about storing the content
    DontCare,
}

/// Image layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLayout {
    /// Undefined layout (initial state)
    Undefined,
    /// Layout for color attachment
    ColorAttachment,
    /// Layout for depth/stencil attachment
    DepthStencilAttachment,
    /// Layout for presenting to swapchain
    PresentSrc,
}

bitflags! {
    /// Pipeline stages used in synchronization scopes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PipelineStages: u32 {
        const TOP_OF_PIPE = 1 << 0;
        const EARLY_FRAGMENT_TESTS = 1 << 1;
        const LATE_FRAGMENT_TESTS = 1 << 2;
        const COLOR_ATTACHMENT_OUTPUT = 1 << 3;
        const BOTTOM_OF_PIPE = 1 << 4;
    }
}

bitflags! {
    /// Memory access types used in synchronization scopes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        const COLOR_ATTACHMENT_READ = 1 << 0;
        const COLOR_ATTACHMENT_WRITE = 1 << 1;
        const DEPTH_STENCIL_ATTACHMENT_READ = 1 << 2;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 1 << 3;
    }
}

/// Format of one attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentFormat {
    Color(ColorFormat),
    Depth(DepthFormat),
}

/// Descriptor for a single attachment in a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentDesc {
    pub format: AttachmentFormat,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub stencil_load_op: LoadOp,
    pub stencil_store_op: StoreOp,
    pub initial_layout: ImageLayout,
    pub final_layout: ImageLayout,
}

/// Reference from a subpass to an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentRef {
    pub attachment: u32,
    pub layout: ImageLayout,
}

/// Single graphics subpass with one color and one depth attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubpassDesc {
    pub color: AttachmentRef,
    pub depth: AttachmentRef,
}

/// Subpass on either side of a dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubpassRef {
    /// Commands outside the render pass
    External,
    Index(u32),
}

/// Execution and memory dependency between subpasses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubpassDependency {
    pub src_subpass: SubpassRef,
    pub dst_subpass: SubpassRef,
    pub src_stages: PipelineStages,
    pub dst_stages: PipelineStages,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
}

/// The main render pass: color + depth, one subpass, one external dependency
///
/// Immutable once built; attachment 0 is always color and attachment 1 depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MainPassDesc {
    attachments: [AttachmentDesc; 2],
    subpass: SubpassDesc,
    dependency: SubpassDependency,
}

impl MainPassDesc {
    pub fn new(color_format: ColorFormat, depth_format: DepthFormat) -> Self {
        let color = AttachmentDesc {
            format: AttachmentFormat::Color(color_format),
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            stencil_load_op: LoadOp::DontCare,
            stencil_store_op: StoreOp::DontCare,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::PresentSrc,
        };

        let depth = AttachmentDesc {
            format: AttachmentFormat::Depth(depth_format),
            load_op: LoadOp::Clear,
            store_op: StoreOp::DontCare,
            stencil_load_op: LoadOp::DontCare,
            stencil_store_op: StoreOp::DontCare,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::DepthStencilAttachment,
        };

        let stages = PipelineStages::COLOR_ATTACHMENT_OUTPUT | PipelineStages::EARLY_FRAGMENT_TESTS;

        Self {
            attachments: [color, depth],
            subpass: SubpassDesc {
                color: AttachmentRef {
                    attachment: COLOR_ATTACHMENT,
                    layout: ImageLayout::ColorAttachment,
                },
                depth: AttachmentRef {
                    attachment: DEPTH_ATTACHMENT,
                    layout: ImageLayout::DepthStencilAttachment,
                },
            },
            dependency: SubpassDependency {
                src_subpass: SubpassRef::External,
                dst_subpass: SubpassRef::Index(0),
                src_stages: stages,
                dst_stages: stages,
                src_access: AccessFlags::empty(),
                dst_access: AccessFlags::COLOR_ATTACHMENT_WRITE
                    | AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            },
        }
    }

    pub fn attachments(&self) -> &[AttachmentDesc; 2] {
        &self.attachments
    }

    pub fn subpass(&self) -> &SubpassDesc {
        &self.subpass
    }

    pub fn dependency(&self) -> &SubpassDependency {
        &self.dependency
    }

    pub fn color_format(&self) -> ColorFormat {
        match self.attachments[COLOR_ATTACHMENT as usize].format {
            AttachmentFormat::Color(format) => format,
            AttachmentFormat::Depth(_) => unreachable!("main pass attachment 0 is always color"),
        }
    }

    pub fn depth_format(&self) -> DepthFormat {
        match self.attachments[DEPTH_ATTACHMENT as usize].format {
            AttachmentFormat::Depth(format) => format,
            AttachmentFormat::Color(_) => unreachable!("main pass attachment 1 is always depth"),
        }
    }
}

#[cfg(test)]
#[path = "render_pass_tests.rs"]
mod tests;
