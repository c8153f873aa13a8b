pub mod appium_client;
pub mod dexscreener_client;
