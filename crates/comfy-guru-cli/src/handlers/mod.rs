pub mod find;
pub mod init;
pub mod logs;
pub mod serve;
pub mod tail;
