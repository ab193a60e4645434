//! Prompt input feature slice.

mod render;
mod state;
mod update;

pub use render::{input_height, render_input};
pub use state::InputState;
pub use update::{handle_main_key, handle_paste};
