pub mod constants;
pub mod string_utils;
pub mod url_utils;

pub use constants::*;
pub use string_utils::{collapse_whitespace, safe_truncate_chars};
pub use url_utils::{canonicalize_url, extract_domain, is_valid_url, resolve_url};
