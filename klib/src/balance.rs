use std::future::Future;

use log::debug;
use reqwest::header::{
    ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION, REFERER, USER_AGENT,
};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::headers::RequestHeaders;

pub const DEFAULT_ENDPOINT: &str = "https://api.blockcypher.com/v1/btc/main/addrs";

const SATS_PER_COIN: f64 = 100_000_000.0;

/// Anything that can resolve an address to an amount of coins. The pipeline
/// only sees this trait, so tests can swap the HTTP client out.
pub trait Lookup: Clone + Send + Sync + 'static {
    fn fetch(&self, address: &str) -> impl Future<Output = Result<f64>> + Send;
}

#[derive(Debug, Clone)]
pub struct BalanceClient {
    http: reqwest::Client,
    base: String,
}

#[derive(Debug, Clone, Deserialize)]
struct BalanceBody {
    balance: i64,
}

impl BalanceClient {
    pub fn new(base: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(Error::Transport)?;

        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    /// One GET per call, never retried. The response body is expected to be a
    /// JSON object carrying an integer `balance` in base units.
    async fn fetch_balance(&self, address: &str) -> Result<f64> {
        let url = format!("{}/{}/balance", self.base, address);
        let headers = RequestHeaders::random();

        debug!("querying {url}");
        let response = self
            .http
            .get(&url)
            .header(USER_AGENT, headers.user_agent)
            .header(ACCEPT, headers.accept)
            .header(ACCEPT_ENCODING, headers.accept_encoding)
            .header(ACCEPT_LANGUAGE, headers.accept_language)
            .header(CONNECTION, headers.connection)
            .header(REFERER, headers.referer)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Remote { status });
        }

        let body = response.text().await.map_err(Error::Transport)?;
        parse_amount(&body)
    }
}

impl Lookup for BalanceClient {
    fn fetch(&self, address: &str) -> impl Future<Output = Result<f64>> + Send {
        self.fetch_balance(address)
    }
}

fn parse_amount(body: &str) -> Result<f64> {
    let parsed: BalanceBody =
        serde_json::from_str(body).map_err(|e| Error::Parse(e.to_string()))?;

    if parsed.balance < 0 {
        return Err(Error::Parse(format!(
            "negative balance {}",
            parsed.balance
        )));
    }

    Ok(parsed.balance as f64 / SATS_PER_COIN)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn converts_base_units_to_coins() {
        let amount = parse_amount(r#"{"balance": 150000000}"#).unwrap();
        assert_eq!(1.5, amount);
    }

    #[test]
    fn zero_balance_is_zero_coins() {
        let amount = parse_amount(r#"{"balance": 0}"#).unwrap();
        assert_eq!(0.0, amount);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let body = r#"{"address": "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH", "balance": 42, "n_tx": 7}"#;
        let amount = parse_amount(body).unwrap();
        assert_eq!(0.00000042, amount);
    }

    #[test]
    fn rejects_negative_balance() {
        let err = parse_amount(r#"{"balance": -1}"#).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn rejects_missing_field() {
        let err = parse_amount(r#"{"final_balance": 10}"#).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn rejects_non_json_body() {
        let err = parse_amount("<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = BalanceClient::new("https://example.com/api/").unwrap();
        assert_eq!("https://example.com/api", client.base);
    }
}
