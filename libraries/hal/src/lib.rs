#![no_std]
#![allow(async_fn_in_trait)]
extern crate nalgebra;

mod accel;
mod types;

pub use accel::*;
pub use types::*;
