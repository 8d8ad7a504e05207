//! subsync - subtitle segmentation and translation realignment
//!
//! Turns word-level speech recognition output into readable SRT subtitles and
//! translates them page by page, mapping each whole-page translation back onto
//! the original time-coded blocks.

pub mod cli;
pub mod config;
pub mod error;
pub mod page;
pub mod segment;
pub mod similarity;
pub mod subtitle;
pub mod sync;
pub mod transcript;
pub mod translate;
pub mod workflow;
pub mod wrap;
