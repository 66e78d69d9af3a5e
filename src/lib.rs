pub mod colors;
pub mod config;
pub mod error;
pub mod farthest_point;
pub mod frame;
pub mod interleave;
pub mod io;
pub mod logger;
pub mod outlier;
pub mod point3d;
pub mod projection;
pub mod record;
pub mod runner;
pub mod sample_pipeline;
pub mod segment;
pub mod source;
