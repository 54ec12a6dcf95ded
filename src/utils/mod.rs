//! Small shared helpers: constants and URL utilities.

pub mod constants;
pub mod url_utils;
