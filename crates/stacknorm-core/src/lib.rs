pub mod clahe;
pub mod consts;
pub mod error;
pub mod grouping;
pub mod io;
pub mod metadata;
pub mod naming;
pub mod pipeline;
pub mod policy;
pub mod preview;
pub mod stack;
pub mod transform;
