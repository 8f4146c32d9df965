pub mod archive_file;
pub mod sensor;
