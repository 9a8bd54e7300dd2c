//! Process-level runtime glue.

pub mod shutdown;

pub use shutdown::install_ctrl_c_handler;
