#[macro_use]
extern crate bitflags;

#[cfg(target_arch = "wasm32")]
extern crate wasm_bindgen;

pub mod bindings;
pub mod config;
pub mod devices;
