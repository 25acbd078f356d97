pub mod admin_handler;
pub mod folder_handler;

pub use admin_handler::{__path_admin_list_folders, admin_list_folders};
pub use folder_handler::{
    __path_add_file, __path_create_folder, __path_delete_folder, __path_get_folder,
    __path_list_folders, __path_replace_folder, __path_update_folder, add_file, create_folder,
    delete_folder, get_folder, list_folders, replace_folder, update_folder,
};
