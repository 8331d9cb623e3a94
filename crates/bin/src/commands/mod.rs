pub mod health;
pub mod serve;
pub mod whoami;
