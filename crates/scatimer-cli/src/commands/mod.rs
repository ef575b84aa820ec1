pub mod config;
pub mod feedback;
pub mod run;
pub mod serve;
pub mod sound;
