pub mod decoder;
pub mod density;
pub mod growth;
pub mod pixel;
pub mod pixel_buffer;
pub mod threshold;
