pub mod admin_handler;
pub mod file_record_handler;

pub use admin_handler::{__path_admin_list_files, admin_list_files};
pub use file_record_handler::{
    __path_create_file, __path_delete_file, __path_get_file, __path_list_files,
    __path_replace_file, __path_update_file, create_file, delete_file, get_file, list_files,
    replace_file, update_file,
};
