pub mod config;
pub mod groups;
pub mod info;
pub mod policy_args;
pub mod run;
