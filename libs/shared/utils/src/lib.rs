pub mod extractor;
pub mod jwt;
pub mod test_utils;
pub mod validation;
