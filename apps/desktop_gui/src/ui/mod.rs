//! UI layer for the desktop GUI: the board window and its rows.

pub mod app;

pub use app::PostBoardApp;
