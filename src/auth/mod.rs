pub mod cookie;
pub mod jwt;
pub mod password;
