/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::time::Duration;

use crate::{dkim::DEFAULT_SELECTOR, Config};

impl Default for Config {
    fn default() -> Self {
        Config {
            lookup_timeout: Duration::from_secs(5),
            cache_capacity: 128,
            dkim_selectors: vec![DEFAULT_SELECTOR.to_string()],
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upper bound for a single TXT lookup. A lookup that takes longer is
    /// treated as a missing record.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// DKIM selectors looked up at `<selector>._domainkey.<domain>`. DKIM is
    /// reported present if any of them resolves.
    pub fn with_dkim_selectors<T: Into<String>>(
        mut self,
        selectors: impl IntoIterator<Item = T>,
    ) -> Self {
        self.dkim_selectors = selectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn lookup_timeout(&self) -> Duration {
        self.lookup_timeout
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    pub fn dkim_selectors(&self) -> &[String] {
        &self.dkim_selectors
    }
}

pub(crate) mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if secs.is_finite() && secs >= 0.0 {
            Ok(Duration::from_secs_f64(secs))
        } else {
            Err(serde::de::Error::custom(format!(
                "invalid lookup timeout {secs}"
            )))
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use crate::Config;

    #[test]
    fn config_defaults() {
        let config = Config::default();
        assert_eq!(config.lookup_timeout(), Duration::from_secs(5));
        assert_eq!(config.cache_capacity(), 128);
        assert_eq!(config.dkim_selectors(), ["default".to_string()]);
    }

    #[test]
    fn config_deserialize() {
        let config: Config = serde_json::from_str(r#"{"lookup_timeout": 2.5}"#).unwrap();
        assert_eq!(config.lookup_timeout(), Duration::from_millis(2500));
        assert_eq!(config.cache_capacity(), 128);
        assert_eq!(config.dkim_selectors(), ["default".to_string()]);

        let config: Config = serde_json::from_str(
            r#"{"cache_capacity": 16, "dkim_selectors": ["google", "selector1"]}"#,
        )
        .unwrap();
        assert_eq!(config.lookup_timeout(), Duration::from_secs(5));
        assert_eq!(config.cache_capacity(), 16);
        assert_eq!(
            config.dkim_selectors(),
            ["google".to_string(), "selector1".to_string()]
        );

        assert!(serde_json::from_str::<Config>(r#"{"lookup_timeout": -1}"#).is_err());
    }

    #[test]
    fn config_builder() {
        let config = Config::new()
            .with_lookup_timeout(Duration::from_secs(1))
            .with_cache_capacity(8)
            .with_dkim_selectors(["default", "mail"]);
        assert_eq!(config.lookup_timeout(), Duration::from_secs(1));
        assert_eq!(config.cache_capacity(), 8);
        assert_eq!(config.dkim_selectors().len(), 2);
    }
}
