pub mod auth;
pub mod editor;
pub mod run;
