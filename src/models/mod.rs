// src/models/mod.rs

pub mod company;
pub mod user;

// Re-exports

pub use company::CompanyInfo;
pub use user::UserRecord;
