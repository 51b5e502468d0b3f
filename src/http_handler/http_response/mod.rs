pub mod landing_target;
pub mod mount_orientation;
pub mod response_common;
