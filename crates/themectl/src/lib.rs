//! Library half of `themectl`, split out so the commands are testable.

pub mod cmd_dump;
pub mod cmd_list;
pub mod cmd_show;
pub mod common;
