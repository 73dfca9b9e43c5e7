//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `None` when the key is absent or blank, `Some(Err)` when it does not
    /// parse as an integer.
    fn get_optional_int(&self, section: &str, key: &str) -> Option<Result<i64, String>> {
        self.get_string(section, key)
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse::<i64>()
                    .map_err(|_| format!("'{}' is not an integer", s.trim()))
            })
    }

    /// `None` when the key is absent or blank, `Some(Err)` when it does not
    /// parse as a number.
    fn get_optional_double(&self, section: &str, key: &str) -> Option<Result<f64, String>> {
        self.get_string(section, key)
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse::<f64>()
                    .map_err(|_| format!("'{}' is not a number", s.trim()))
            })
    }
}
