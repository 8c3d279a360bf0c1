//! Request body and query validation
//!
//! Failures are reported per field in the shape the frontend already
//! understands; see [`FieldErrors`].

mod field;
mod payloads;
mod sanitize;

pub use field::{FieldError, FieldErrors, FieldLocation};
pub use payloads::{
    location_type, new_user_vis, new_view, new_workspace, user_vis_patch, view_patch,
    workspace_patch, Body,
};
pub use sanitize::{escape_html, is_hex_colour, json_blob};
