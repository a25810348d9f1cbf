use std::fmt;

/// One "device installed apps" event parsed from a log line
#[derive(Debug, Clone, PartialEq)]
pub struct AppsInstalled {
    pub dev_type: String,
    pub dev_id: String,
    /// Geo coordinates are best-effort; `None` when the field did not parse
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub apps: Vec<u32>,
}

impl AppsInstalled {
    /// Backend key for this device
    pub fn key(&self) -> ShardKey {
        ShardKey::new(&self.dev_type, &self.dev_id)
    }
}

/// Backend key of the form `{dev_type}:{dev_id}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShardKey(String);

impl ShardKey {
    pub fn new(dev_type: &str, dev_id: &str) -> Self {
        Self(format!("{dev_type}:{dev_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ShardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
