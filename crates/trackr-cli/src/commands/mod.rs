pub mod audit;
pub mod dispatch;
pub mod init;
pub mod issue;
pub mod member;
pub mod project;
pub mod shared;
pub mod user;
