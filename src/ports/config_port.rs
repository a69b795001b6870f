//! Configuration access port trait.
//!
//! Values are addressed as `[section] key`, matching the INI layout.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
}
