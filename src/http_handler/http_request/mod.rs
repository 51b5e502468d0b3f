use super::http_response::{landing_target, mount_orientation};

pub mod landing_target_post;
pub mod mount_orientation_get;
pub mod request_common;
