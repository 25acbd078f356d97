pub mod admin_handler;
pub mod upload_handler;

pub use admin_handler::{
    __path_admin_delete_upload, __path_admin_download_upload, __path_admin_get_upload,
    __path_admin_list_uploads, admin_delete_upload, admin_download_upload, admin_get_upload,
    admin_list_uploads,
};
pub use upload_handler::{__path_upload_file, upload_file, upload_method_not_allowed};
