#![allow(dead_code)]

pub mod sprites;
