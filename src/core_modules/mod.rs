pub mod composite;
pub mod image_helper;
pub mod pixel;
