pub mod types;
pub mod repository;

pub use types::{Attachment, AttachmentRow, NewAttachment};
pub use repository::{AttachmentRepository, SqliteAttachmentRepository};
