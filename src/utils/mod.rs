// Utility modules for PlaceMap Core

pub mod image;
pub mod service_error;
pub mod share_key;
pub mod validation;

pub use image::{resize_image, ImageError, MAX_PHOTO_DIMENSION};
pub use service_error::ServiceError;
pub use share_key::{generate_share_token, is_valid_key};
pub use validation::{trim_and_validate_field, trim_optional_field};
