pub mod app;
pub mod hover_bar;
pub mod player;
pub mod seek_bar;


pub use app::*;
