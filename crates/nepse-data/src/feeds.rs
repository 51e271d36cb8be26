//! 업스트림 시장 데이터 피드 클라이언트.
//!
//! 각 피드는 JSON을 반환하는 HTTP GET이며, 페이로드 스키마는 소스 고유로
//! 취급합니다. 여기서는 알려진 소수 필드(`response[0].market_live`,
//! `data.content`, 시세 배열의 `ticker`/`ltp`)만 풀어내는 헬퍼를 제공합니다.
//!
//! 모든 요청에는 요청별 데드라인이 걸리며, 초과는 [`FetchError::Timeout`]으로
//! 분류되어 작업 시간이 무한정 늘어나는 것을 막습니다.

use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::{json, Value};

use nepse_core::{IpoEntry, TickerQuote};

use crate::{cache::CacheStore, error::FetchError};

/// NEPSE 지수 데이터 기본 URL (기간 접미사 추가 사용).
pub const INDICES_BASE_URL: &str = "https://www.onlinekhabar.com/smtm/home/indices-data/nepse";

/// 종목 상세 페이지 API 기본 URL.
pub const TICKER_BASE_URL: &str = "https://www.onlinekhabar.com/smtm/ticker-page";

/// 기본 요청 데드라인 (초).
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// 고정 URL 업스트림 피드 소스.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedSource {
    /// 진행 중 IPO 목록
    OngoingIpos,
    /// 예정 IPO 목록
    UpcomingIpos,
    /// 실시간 시세
    Tickers,
    /// 증시 뉴스
    News,
    /// NEPSE 지수 (일간)
    IndicesDaily,
    /// 섹터별 등락
    SectorPerformance,
    /// 시장 개장 여부
    MarketStatus,
    /// 관심 급증 종목
    TrendingStocks,
}

impl FeedSource {
    /// 캐시 키.
    pub fn cache_key(&self) -> &'static str {
        match self {
            FeedSource::OngoingIpos => "ongoing-ipos",
            FeedSource::UpcomingIpos => "upcoming-ipos",
            FeedSource::Tickers => "tickers",
            FeedSource::News => "news",
            FeedSource::IndicesDaily => "indices-1d",
            FeedSource::SectorPerformance => "sector-performance",
            FeedSource::MarketStatus => "market-status",
            FeedSource::TrendingStocks => "trending-stocks",
        }
    }

    /// 업스트림 URL.
    pub fn url(&self) -> &'static str {
        match self {
            FeedSource::OngoingIpos => {
                "https://www.nepalipaisa.com/api/GetIpos?stockSymbol=&pageNo=1&itemsPerPage=10&pagePerDisplay=5"
            }
            FeedSource::UpcomingIpos => "https://www.onlinekhabar.com/smtm/home/ipo-corner-upcoming",
            FeedSource::Tickers => "https://www.onlinekhabar.com/smtm/stock_live/live-trading",
            FeedSource::News => {
                "https://www.onlinekhabar.com/wp-json/okapi/v1/category-posts?category=share-market"
            }
            FeedSource::IndicesDaily => {
                "https://www.onlinekhabar.com/smtm/home/indices-data/nepse/1d"
            }
            FeedSource::SectorPerformance => {
                "https://www.onlinekhabar.com/smtm/stock_live/sector-performance"
            }
            FeedSource::MarketStatus => "https://www.onlinekhabar.com/smtm/home/market-status",
            FeedSource::TrendingStocks => "https://www.onlinekhabar.com/smtm/home/trending",
        }
    }
}

/// 지수 데이터 URL (기간: "1d", "1w" 등).
pub fn indices_url(period: &str) -> String {
    format!("{}/{}", INDICES_BASE_URL, period)
}

/// 지수 데이터 캐시 키.
pub fn indices_cache_key(period: &str) -> String {
    format!("indices-{}", period)
}

/// 업스트림 피드 HTTP 클라이언트.
pub struct FeedClient {
    client: reqwest::Client,
    timeout: Duration,
    /// 소스별 URL 재지정 (스테이징/테스트 엔드포인트)
    overrides: std::collections::HashMap<FeedSource, String>,
}

impl FeedClient {
    /// 요청별 데드라인을 적용한 클라이언트 생성.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self {
            client,
            timeout,
            overrides: std::collections::HashMap::new(),
        })
    }

    /// 기본 데드라인으로 클라이언트 생성.
    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS))
    }

    /// 특정 소스의 URL을 재지정합니다.
    pub fn with_override(mut self, source: FeedSource, url: impl Into<String>) -> Self {
        self.overrides.insert(source, url.into());
        self
    }

    /// 소스의 실효 URL.
    pub fn url_for(&self, source: FeedSource) -> &str {
        self.overrides
            .get(&source)
            .map(String::as_str)
            .unwrap_or_else(|| source.url())
    }

    /// 고정 소스 조회.
    pub async fn fetch(&self, source: FeedSource) -> Result<Value, FetchError> {
        let url = self.url_for(source).to_string();
        self.fetch_url(&url).await
    }

    /// 임의 URL 조회.
    pub async fn fetch_url(&self, url: &str) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify_transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.classify_transport_error(url, e))?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            source: e,
        })
    }

    /// 종목 상세 데이터 조회.
    ///
    /// 다섯 엔드포인트를 캐시를 경유해 동시에 조회하고 하나의 객체로
    /// 합칩니다. 하나라도 실패하면 전체가 실패합니다.
    pub async fn fetch_ticker_detail(
        &self,
        cache: &CacheStore,
        ttl: Duration,
        ticker: &str,
    ) -> Result<Value, FetchError> {
        let info_url = format!("{}/ticker-info/{}", TICKER_BASE_URL, ticker);
        let range_url = format!("{}/market-range/{}", TICKER_BASE_URL, ticker);
        let stats_url = format!("{}/ticker-stats/{}", TICKER_BASE_URL, ticker);
        let quick_url = format!("{}/ticker-quick-view/{}", TICKER_BASE_URL, ticker);
        let technical_url = format!("{}/ticker-technical-indicator/{}", TICKER_BASE_URL, ticker);

        let info_key = format!("ticker-info-{}", ticker);
        let range_key = format!("market-range-{}", ticker);
        let stats_key = format!("ticker-stats-{}", ticker);
        let quick_key = format!("ticker-quick-view-{}", ticker);
        let technical_key = format!("ticker-technical-indicator-{}", ticker);

        let (info, market_range, stats, quick_view, technical_indicator) = futures::try_join!(
            cache.get_or_fetch(&info_key, ttl, || self.fetch_url(&info_url)),
            cache.get_or_fetch(&range_key, ttl, || self.fetch_url(&range_url)),
            cache.get_or_fetch(&stats_key, ttl, || self.fetch_url(&stats_url)),
            cache.get_or_fetch(&quick_key, ttl, || self.fetch_url(&quick_url)),
            cache.get_or_fetch(&technical_key, ttl, || self.fetch_url(&technical_url)),
        )?;

        Ok(json!({
            "ticker": ticker,
            "info": strip_ticker_field(&info),
            "marketRange": strip_ticker_field(&market_range),
            "stats": strip_ticker_field(&stats),
            "quickView": strip_ticker_field(&quick_view),
            "technicalIndicator": strip_ticker_field(&technical_indicator),
        }))
    }

    fn classify_transport_error(&self, url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

impl std::fmt::Debug for FeedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedClient")
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ==================== 알려진 필드 풀기 ====================

/// `response` 내부에서 중복 `ticker` 필드 제거.
///
/// 상세 엔드포인트들이 모두 같은 ticker 필드를 되돌려주므로 합친 결과에서는
/// 한 번만 싣습니다.
fn strip_ticker_field(payload: &Value) -> Value {
    match payload.get("response") {
        Some(Value::Object(response)) => {
            let mut rest = response.clone();
            rest.remove("ticker");
            Value::Object(rest)
        }
        _ => payload.clone(),
    }
}

/// 시장 개장 여부 (`response[0].market_live`).
///
/// 스키마 드리프트에 대비해 bool 외에 0/1 숫자도 허용합니다.
pub fn market_live(payload: &Value) -> Option<bool> {
    let field = payload
        .get("response")?
        .as_array()?
        .first()?
        .get("market_live")?;
    match field {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        _ => None,
    }
}

/// IPO 목록 항목 추출 (`data.content`, 폴백으로 `data` 또는 루트 배열).
pub fn ipo_entries(payload: &Value) -> Vec<IpoEntry> {
    let items = payload
        .get("data")
        .and_then(|d| d.get("content"))
        .and_then(Value::as_array)
        .or_else(|| payload.get("data").and_then(Value::as_array))
        .or_else(|| payload.as_array());

    let Some(items) = items else {
        return Vec::new();
    };

    items.iter().map(IpoEntry::from_value).collect()
}

/// 실시간 시세 추출 (루트 배열, 폴백으로 `response`/`data` 배열).
///
/// `ticker`나 `ltp`가 없는 항목은 조용히 버립니다.
pub fn ticker_quotes(payload: &Value) -> Vec<TickerQuote> {
    let items = payload
        .as_array()
        .or_else(|| payload.get("response").and_then(Value::as_array))
        .or_else(|| payload.get("data").and_then(Value::as_array));

    let Some(items) = items else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let ticker = item.get("ticker")?.as_str()?.to_string();
            let ltp = decimal_field(item.get("ltp")?)?;
            Some(TickerQuote { ticker, ltp })
        })
        .collect()
}

fn decimal_field(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => s.replace(',', "").parse().ok(),
        _ => None,
    }
}
