pub mod camera;
pub mod export;
pub mod history;
pub mod renderer;
pub mod scanner;
pub mod share;
pub mod surface;
