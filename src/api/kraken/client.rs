use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;

use crate::api::{
    client::{
        AssetPair, ExchangeClient, LedgerPage, LedgerQuery, RateLimitConfig, TradesPage,
        TradesQuery,
    },
    error::ApiError,
    rate_limiter::RateLimiter,
};
use crate::models::Settings;

use super::{
    mapper::{map_asset_pair, map_ledger_entry, map_trade},
    nonce::NonceGenerator,
    signature::{encode_payload, sign_request},
    types::{AssetPairsResult, KrakenResponse, LedgersResult, TradesHistoryResult},
};

pub const LEDGERS_ENDPOINT: &str = "/0/private/Ledgers";
pub const TRADES_HISTORY_ENDPOINT: &str = "/0/private/TradesHistory";
pub const ASSET_PAIRS_ENDPOINT: &str = "/0/public/AssetPairs";

/// Kraken's starter tier allows a burst of ~7 ledger queries before the counter trips
const DEFAULT_RATE_LIMIT: RateLimitConfig = RateLimitConfig {
    requests_per_second: 1,
    burst_size: 5,
};

pub struct KrakenClient {
    api_key: String,
    api_secret: String,
    base_url: String,
    http_client: reqwest::Client,
    rate_limiter: RateLimiter,
    nonce: NonceGenerator,
}

impl KrakenClient {
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        Self::with_rate_limit(settings, DEFAULT_RATE_LIMIT)
    }

    pub fn with_rate_limit(settings: &Settings, rate_limit: RateLimitConfig) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("kraken-export/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
            base_url: settings.api_url.clone(),
            http_client,
            rate_limiter: RateLimiter::new(rate_limit),
            nonce: NonceGenerator::new(),
        })
    }

    /// Build authenticated headers for a private call
    fn build_headers(&self, signature: &str) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded; charset=utf-8"),
        );
        headers.insert(
            "API-Key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| ApiError::AuthenticationError(format!("Invalid API key: {}", e)))?,
        );
        headers.insert(
            "API-Sign",
            HeaderValue::from_str(signature)
                .map_err(|e| ApiError::AuthenticationError(format!("Invalid signature: {}", e)))?,
        );

        Ok(headers)
    }

    /// Signed POST to a private endpoint. A fresh nonce is prepended to `params`.
    pub async fn post_private<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Vec<(String, String)>,
    ) -> Result<T, ApiError> {
        self.rate_limiter.acquire().await;

        let mut payload = Vec::with_capacity(params.len() + 1);
        payload.push(("nonce".to_string(), self.nonce.next().to_string()));
        payload.extend(params);

        let signature = sign_request(path, &payload, &self.api_secret)?;
        let headers = self.build_headers(&signature)?;

        debug!("POST {} ({} params)", path, payload.len());

        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, path))
            .headers(headers)
            .body(encode_payload(&payload))
            .send()
            .await?;

        self.parse_response(path, response).await.inspect_err(|e| {
            if e.is_invalid_nonce() {
                warn!("Kraken rejected the nonce: another client may be using this API key, or its nonce window is too small");
            }
        })
    }

    /// Unauthenticated GET to a public endpoint
    pub async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        debug!("GET {} {:?}", path, query);

        let response = self
            .http_client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await?;

        self.parse_response(path, response).await
    }

    async fn parse_response<T: DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if status == 429 {
            return Err(ApiError::RateLimitError(
                "Rate limit exceeded. Please wait before retrying.".to_string(),
            ));
        }

        if status == 401 || status == 403 {
            return Err(ApiError::AuthenticationError(
                "Invalid API credentials or permissions".to_string(),
            ));
        }

        let response_text = response.text().await?;
        let api_response: KrakenResponse<T> = serde_json::from_str(&response_text).map_err(|e| {
            ApiError::ParseError(format!("Failed to parse response: {} - Body: {}", e, response_text))
        })?;

        api_response.into_result().inspect_err(|e| {
            error!("Error while retrieving {}: {}", path, e);
        })
    }
}

fn window_params(start: Option<i64>, end: Option<i64>, ofs: Option<u64>) -> Vec<(String, String)> {
    let mut params = Vec::new();
    if let Some(start) = start {
        params.push(("start".to_string(), start.to_string()));
    }
    if let Some(end) = end {
        params.push(("end".to_string(), end.to_string()));
    }
    if let Some(ofs) = ofs {
        params.push(("ofs".to_string(), ofs.to_string()));
    }
    params
}

#[async_trait]
impl ExchangeClient for KrakenClient {
    async fn fetch_ledger(&self, query: LedgerQuery) -> Result<LedgerPage, ApiError> {
        let result: LedgersResult = self
            .post_private(LEDGERS_ENDPOINT, window_params(query.start, query.end, query.ofs))
            .await?;

        Ok(LedgerPage {
            entries: result
                .ledger
                .into_iter()
                .map(|(id, entry)| map_ledger_entry(&id, entry))
                .collect(),
            count: result.count,
        })
    }

    async fn fetch_trades(&self, query: TradesQuery) -> Result<TradesPage, ApiError> {
        let mut params = vec![("trades".to_string(), "true".to_string())];
        params.extend(window_params(query.start, query.end, query.ofs));

        let result: TradesHistoryResult = self.post_private(TRADES_HISTORY_ENDPOINT, params).await?;

        Ok(TradesPage {
            trades: result
                .trades
                .into_iter()
                .map(|(id, trade)| map_trade(&id, trade))
                .collect(),
            count: result.count,
        })
    }

    async fn fetch_asset_pair(&self, pair: &str) -> Result<AssetPair, ApiError> {
        let mut result: AssetPairsResult = self.get_public(ASSET_PAIRS_ENDPOINT, &[("pair", pair)]).await?;

        // Kraken may answer under the pair's canonical code rather than the one requested
        let (code, info) = match result.shift_remove_entry(pair) {
            Some(entry) => entry,
            None => result
                .into_iter()
                .next()
                .ok_or_else(|| ApiError::ParseError(format!("Unknown asset pair: {}", pair)))?,
        };

        Ok(map_asset_pair(&code, info))
    }
}
