//! Filesystem utilities for packaged model directories.

pub mod path;

pub use path::{
    ScratchDir, build_shadow_target_directory, build_target_directory, copy_file_path,
    copy_tree_or_file, copy_tree_path, max_modified_time_of_dir, models_root,
    remove_ignored_files, remove_tree_path, shadow_dirname,
};
