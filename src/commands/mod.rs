pub mod build;
pub mod deps;
pub mod envs;
pub mod release;
pub mod standards;
pub mod version;
