pub mod auth_handler;

pub use auth_handler::{__path_get_csrf_token, __path_get_user_info, get_csrf_token, get_user_info};
