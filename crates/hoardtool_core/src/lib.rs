pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod preview;
pub mod probe;
pub mod record;
