use std::collections::HashMap;

use crate::models::qr_record::{QrRecord, list_element_id, modal_element_id};
use crate::services::renderer::{self, LIST_SIZE, MODAL_SIZE, RenderError};

/// Where a rendering is mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List,
    Modal,
}

/// A rendered QR code currently on display
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNode {
    pub element_id: String,
    pub svg: String,
    pub background: String,
    pub size: u32,
}

/// The set of QR renderings currently mounted, addressed by element id.
///
/// Mounting under an existing id replaces the previous node, so when two
/// records share a `createdAt` the last one mounted is the one exported.
#[derive(Debug, Default)]
pub struct RenderSurface {
    nodes: HashMap<String, RenderedNode>,
    // Element id of the generated code that was not saved, if any
    preview: Option<String>,
}

impl RenderSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(&mut self, node: RenderedNode) {
        log::debug!("Mounting {} ({}px)", node.element_id, node.size);
        self.nodes.insert(node.element_id.clone(), node);
    }

    /// Render a record for a view and mount it
    pub fn mount_record(
        &mut self,
        record: &QrRecord,
        view: View,
        size: u32,
    ) -> Result<&RenderedNode, RenderError> {
        let element_id = match view {
            View::List => list_element_id(record.created_at),
            View::Modal => modal_element_id(record.created_at),
        };
        let svg = renderer::render_record(record, size)?;
        self.mount(RenderedNode {
            element_id: element_id.clone(),
            svg,
            background: record.background_color.clone(),
            size,
        });
        Ok(&self.nodes[&element_id])
    }

    pub fn mount_list(&mut self, record: &QrRecord) -> Result<&RenderedNode, RenderError> {
        self.mount_record(record, View::List, LIST_SIZE)
    }

    pub fn mount_modal(&mut self, record: &QrRecord) -> Result<&RenderedNode, RenderError> {
        self.mount_record(record, View::Modal, MODAL_SIZE)
    }

    /// Mount a code that is not kept in the history. Only one such preview
    /// exists at a time; mounting another drops the previous one.
    pub fn mount_preview(
        &mut self,
        record: &QrRecord,
        size: u32,
    ) -> Result<&RenderedNode, RenderError> {
        let element_id = list_element_id(record.created_at);
        if let Some(previous) = self.preview.take() {
            if previous != element_id {
                self.unmount(&previous);
            }
        }
        self.preview = Some(element_id);
        self.mount_record(record, View::List, size)
    }

    pub fn unmount(&mut self, element_id: &str) -> Option<RenderedNode> {
        if self.preview.as_deref() == Some(element_id) {
            self.preview = None;
        }
        self.nodes.remove(element_id)
    }

    /// Remove both the list and the modal rendering of a record
    pub fn unmount_record(&mut self, created_at: i64) {
        self.unmount(&list_element_id(created_at));
        self.unmount(&modal_element_id(created_at));
    }

    pub fn get(&self, element_id: &str) -> Option<&RenderedNode> {
        self.nodes.get(element_id)
    }

    /// Find the rendering to export for a record. The modal copy is larger,
    /// so it wins over the list copy when both are mounted.
    pub fn locate(&self, created_at: i64) -> Option<&RenderedNode> {
        self.get(&modal_element_id(created_at))
            .or_else(|| self.get(&list_element_id(created_at)))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
