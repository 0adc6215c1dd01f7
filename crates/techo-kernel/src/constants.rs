//! Kernel constants.

/// Default number of undo steps kept before the oldest is dropped.
pub const MAX_HISTORY: usize = 50;

/// Directory under the platform config dir holding techo's files.
pub const CONFIG_DIR_NAME: &str = "techo";

/// Config file name inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// File stem suggested when saving a notebook with an empty title.
pub const UNTITLED_FILE_STEM: &str = "untitled-notebook";

/// Extension of saved notebooks.
pub const NOTEBOOK_EXTENSION: &str = "json";
