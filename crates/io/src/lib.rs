// File and database I/O

pub mod decode;
pub mod error;
pub mod export;
pub mod repository;
pub mod upload;

pub use decode::read_file_as_utf8;
pub use error::IoError;
pub use export::{export_file_name, write_missing_csv};
pub use repository::ActeRepository;
pub use upload::{validate_upload, UploadInfo};
