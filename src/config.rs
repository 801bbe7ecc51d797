//! Environment-driven configuration with logged defaults.

use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

/// When an order's total is added to the customer's running spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpendPolicy {
    /// At order creation, regardless of payment status.
    OnCreation,
    /// When the order's payment status moves to `paid`.
    OnPayment,
}

impl FromStr for SpendPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on-creation" => Ok(SpendPolicy::OnCreation),
            "on-payment" => Ok(SpendPolicy::OnPayment),
            other => Err(format!(
                "unknown spend policy {other:?}, expected on-creation or on-payment"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Channel capacity for the store actor.
    pub store_buffer: usize,
    /// Channel capacity for the notification dispatcher.
    pub notify_buffer: usize,
    /// How many times a read-then-write transaction re-executes on a
    /// version conflict before giving up.
    pub max_commit_attempts: u32,
    pub spend_policy: SpendPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_buffer: 32,
            notify_buffer: 32,
            max_commit_attempts: 5,
            spend_policy: SpendPolicy::OnCreation,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        Self {
            store_buffer: try_load("BACKOFFICE_STORE_BUFFER", "32"),
            notify_buffer: try_load("BACKOFFICE_NOTIFY_BUFFER", "32"),
            max_commit_attempts: try_load("BACKOFFICE_COMMIT_ATTEMPTS", "5"),
            spend_policy: try_load("BACKOFFICE_SPEND_POLICY", "on-creation"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        info!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spend_policy_parses() {
        assert_eq!("on-creation".parse(), Ok(SpendPolicy::OnCreation));
        assert_eq!("on-payment".parse(), Ok(SpendPolicy::OnPayment));
        assert!("sometimes".parse::<SpendPolicy>().is_err());
    }
}
