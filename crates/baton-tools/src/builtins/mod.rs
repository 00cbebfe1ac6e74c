//! Builtins - Embedded tools shipped with Baton
//!
//! - File tools: file_read, file_write, file_list
//! - Blackboard tools: state_get, state_set

mod file;
mod state;

pub use file::{FileListTool, FileReadTool, FileWriteTool};
pub use state::{StateGetTool, StateSetTool};

use crate::registry::ToolRegistry;
use std::sync::Arc;

/// Register all built-in tools with the registry
pub fn register_builtins(registry: &mut ToolRegistry) {
    registry.register(Arc::new(FileReadTool::new()));
    registry.register(Arc::new(FileWriteTool::new()));
    registry.register(Arc::new(FileListTool::new()));

    registry.register(Arc::new(StateGetTool::new()));
    registry.register(Arc::new(StateSetTool::new()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_builtins() {
        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry);

        assert_eq!(
            registry.list_names(),
            vec!["file_list", "file_read", "file_write", "state_get", "state_set"]
        );
    }
}
