//! Command implementations for the Banana CLI

pub mod build;
pub mod completions;
pub mod decrypt;
pub mod helpers;
pub mod init;
pub mod keygen;
pub mod vendor;
pub mod version;
