pub mod app;
pub mod controller;
pub mod error;
pub mod frame_task;
pub mod generators;
pub mod maze;
pub mod render;
pub mod solvers;
pub mod stepper;
