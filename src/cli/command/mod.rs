pub mod download;
pub mod find_start_date;
pub mod process;

pub use download::download;
pub use find_start_date::find_start_date;
pub use process::process;
