pub mod colorize;
pub mod evaluate;
pub mod logs;
pub mod matrix;
pub mod pixels;
