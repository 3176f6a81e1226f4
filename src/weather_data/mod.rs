pub mod data_loader;
pub mod error;
pub mod frame_fetcher;
pub mod monthly_frame;
