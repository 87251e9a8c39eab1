pub mod archive;
pub mod workspace;

pub use archive::{extract, is_valid_archive, project_root, ArchiveFormat, ExtractError};
pub use workspace::JobWorkspace;
