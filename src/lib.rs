pub mod app;
pub mod artwork;
pub mod display;
pub mod player;
pub mod sync;
