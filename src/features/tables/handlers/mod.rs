pub mod table_handler;

pub use table_handler::{
    __path_delete_table, __path_get_table, __path_list_tables, delete_table, get_table,
    list_tables,
};
