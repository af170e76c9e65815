//! UI components for Docshelf

pub mod block_renderer;
pub mod document_list;
pub mod preview;
pub mod sidebar;
