// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::DEFAULT_LIST_PAGE_SIZE;
use crate::error::{Result, RolloutError};
use std::env;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Only watch secrets in this namespace; all namespaces when unset
    pub watch_namespace: Option<String>,
    /// Upper bound on concurrent workload updates in one pass; unbounded when unset
    pub max_concurrent_updates: Option<usize>,
    /// Page size used when listing workloads
    pub list_page_size: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let watch_namespace = lookup("WATCH_NAMESPACE").filter(|ns| !ns.is_empty());

        // 0 means unbounded, same as leaving it unset
        let max_concurrent_updates = match lookup("MAX_CONCURRENT_UPDATES") {
            Some(v) => Some(parse_number::<usize>("MAX_CONCURRENT_UPDATES", &v)?).filter(|n| *n > 0),
            None => None,
        };

        let list_page_size = match lookup("LIST_PAGE_SIZE") {
            Some(v) => parse_number::<u32>("LIST_PAGE_SIZE", &v)?,
            None => DEFAULT_LIST_PAGE_SIZE,
        };
        if list_page_size == 0 {
            return Err(RolloutError::Config(
                "LIST_PAGE_SIZE must be greater than 0".to_string(),
            ));
        }

        Ok(Config {
            watch_namespace,
            max_concurrent_updates,
            list_page_size,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        RolloutError::Config(format!("{} must be a non-negative integer, got '{}'", key, value))
    })
}
