pub mod create;
pub mod destroy;
pub mod list;
pub mod logs;
pub mod restart;
pub mod start;
pub mod stop;
