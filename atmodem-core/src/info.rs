/// Strings reported by `ATI0`, `ATI1` and `ATI2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModemInfo {
    pub identity: String,
    pub version: String,
    pub url: String,
}

impl Default for ModemInfo {
    fn default() -> Self {
        Self {
            identity: String::from("atmodem 115200"),
            version: format!("v{}", env!("CARGO_PKG_VERSION")),
            url: String::from("https://github.com/stblassitude/tcpatmodem"),
        }
    }
}

impl ModemInfo {
    /// String for `ATIn`, if `n` names one.
    pub fn get(&self, index: u32) -> Option<&str> {
        match index {
            0 => Some(&self.identity),
            1 => Some(&self.version),
            2 => Some(&self.url),
            _ => None,
        }
    }
}
