pub mod admin_handler;
pub mod section_handler;

pub use admin_handler::{__path_admin_list_sections, admin_list_sections};
pub use section_handler::{
    __path_add_folder, __path_create_section, __path_delete_section, __path_get_section,
    __path_get_tree, __path_list_sections, __path_replace_section, __path_update_section,
    add_folder, create_section, delete_section, get_section, get_tree, list_sections,
    replace_section, update_section,
};
