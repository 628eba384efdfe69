//! Display abstraction traits and shared components for the 84VID player
//!
//! This crate provides:
//! - `DisplayBackend` trait for text output and presenting a frame
//! - `GraphicsDisplayBackend` trait exposing the two-tone fill-rect primitive
//! - `FrameBuffer`, a 1-bit-per-pixel 320x240 buffer implementing both traits
//! - `Screen`, a text buffer used for the start and error prompts
//! - `InputSource` trait for the "press any key" prompt
//!
//! # Architecture
//!
//! The player core only ever talks to the traits. A board renders into a
//! `FrameBuffer` and pushes it to its panel in `flush`, or implements the
//! traits directly on top of a panel driver that can fill rectangles itself.

#![no_std]
#![deny(unsafe_code)]

pub mod backend;
pub mod framebuffer;
pub mod input;
pub mod screen;

// Re-export key types
pub use backend::{DisplayBackend, DisplayError, GraphicsDisplayBackend, Tone};
pub use framebuffer::{DirtyRegion, FrameBuffer, DISPLAY_HEIGHT, DISPLAY_WIDTH};
pub use input::{wait_for_any_key, InputSource};
pub use screen::{Screen, SCREEN_COLS, SCREEN_ROWS};
