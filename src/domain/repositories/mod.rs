pub mod price_source;
pub mod screen_driver;
