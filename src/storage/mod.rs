pub mod record_files;

pub use record_files::{
    latest_record_file, list_record_files, read_record_set, resolve_record_file,
    write_record_set,
};
