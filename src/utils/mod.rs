pub mod logging;
pub mod test_utils;
pub mod url;
