pub mod authz;
pub mod claims;
pub mod cli;
pub mod config;
pub mod deploy;
pub mod dispatcher;
pub mod executor;
pub mod flags;
pub mod permissions;
pub mod response;
pub mod role;
pub mod server;
