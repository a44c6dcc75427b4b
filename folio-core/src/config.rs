use serde::{Deserialize, Serialize};

/// Site-wide settings that reach the templates.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SiteConfig {
    /// Prefix for `abs_url`. Empty means links stay site-relative.
    pub base_url: String,
}

impl SiteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Point absolute URLs at the local preview server.
    pub fn dev(&mut self, host: String, port: u16) {
        self.base_url = format!("http://{}:{}/", host, port);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_url_is_empty() {
        assert_eq!(SiteConfig::default().base_url, "");
    }

    #[test]
    fn dev_points_at_local_server() {
        let mut config = SiteConfig::new("https://example.com/site/");
        config.dev("127.0.0.1".to_string(), 3000);
        assert_eq!(config.base_url, "http://127.0.0.1:3000/");
    }
}
