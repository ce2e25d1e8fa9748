pub mod event;
pub mod level;
pub mod state;
pub mod step;
pub mod view;
pub mod world;
