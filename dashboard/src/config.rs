use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;

use lib_board::configs::{BoardConfig, PollConfig, PushConfig, RetryConfig, StorageConfig, defaults};
use lib_board::markets::{ExchangeLink, ListingIndex, SectorMap};
use lib_board::{FilterState, PriceBucket, SortDirection, SortKey, SortSpec};

const DEFAULT_CONFIG_FILE: &str = "tickerboard.conf";

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default)]
#[clap(about = "Headless crypto ticker board", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "TICKERBOARD_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "TICKERBOARD_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "TICKERBOARD_LOG_LEVEL", help = "Logging level (off, trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "TICKERBOARD_LOG_KEEP", help = "Log files to keep, counting the current run's.")]
    pub log_keep: Option<usize>,

    #[clap(long, env = "TICKERBOARD_POLL_URL", help = "REST ticker endpoint. Unset disables polling.")]
    pub poll_url: Option<String>,

    #[clap(long, env = "TICKERBOARD_PUSH_URL", help = "Event-stream endpoint. Unset disables the push feed.")]
    pub push_url: Option<String>,

    #[clap(long, env = "TICKERBOARD_POLL_INTERVAL_SECONDS", help = "Seconds between REST polls.")]
    pub poll_interval_seconds: Option<u64>,

    #[clap(long, env = "TICKERBOARD_REQUEST_TIMEOUT_SECONDS", help = "Timeout in seconds for one REST request.")]
    pub request_timeout_seconds: Option<u64>,

    #[clap(long, env = "TICKERBOARD_RETRY_BASE_DELAY_MS", help = "Base delay in milliseconds for REST retries.")]
    pub retry_base_delay_ms: Option<u64>,

    #[clap(long, env = "TICKERBOARD_RETRY_MAX_MULTIPLIER", help = "Cap on the linear retry multiplier.")]
    pub retry_max_multiplier: Option<u32>,

    #[clap(long, env = "TICKERBOARD_RETRY_MAX_RETRIES", help = "Retries per REST poll before the error is shown.")]
    pub retry_max_retries: Option<u32>,

    #[clap(long, env = "TICKERBOARD_RECONNECT_DELAY_MS", help = "Delay in milliseconds before reconnecting the event stream.")]
    pub reconnect_delay_ms: Option<u64>,

    #[clap(long, env = "TICKERBOARD_IDLE_TIMEOUT_SECONDS", help = "Seconds of stream silence before reconnecting (0 disables).")]
    pub idle_timeout_seconds: Option<u64>,

    #[clap(long, env = "TICKERBOARD_REFRESH_INTERVAL_MS", help = "Milliseconds between board refreshes.")]
    pub refresh_interval_ms: Option<u64>,

    #[clap(long, env = "TICKERBOARD_STORAGE_PATH", help = "JSON file holding persisted favorites.")]
    pub storage_path: Option<PathBuf>,

    #[clap(long, env = "TICKERBOARD_VIEWPORT_WIDTH", help = "Viewport width in px; below 768 the board scrolls instead of paging.")]
    pub viewport_width: Option<f64>,

    #[clap(long, env = "TICKERBOARD_PAGE_SIZE", help = "Rows per page.")]
    pub page_size: Option<usize>,

    #[clap(long, env = "TICKERBOARD_SEARCH", help = "Initial search term.")]
    pub search: Option<String>,

    #[clap(long, env = "TICKERBOARD_SORT", help = "Sort key: volume, price, changeRate, name.")]
    pub sort: Option<String>,

    #[clap(long, env = "TICKERBOARD_SORT_DIRECTION", help = "Sort direction: asc or desc.")]
    pub sort_direction: Option<String>,

    #[clap(long, env = "TICKERBOARD_PRICE_RANGE", help = "Price range: all, under1000, under10000, under100000, over100000.")]
    pub price_range: Option<String>,

    #[clap(long, env = "TICKERBOARD_SECTOR", help = "Canonical sector to show.")]
    pub sector: Option<String>,

    #[clap(long, env = "TICKERBOARD_FAVORITES_ONLY", help = "Only show favorited symbols.")]
    pub favorites_only: Option<bool>,

    #[clap(long, env = "TICKERBOARD_TOGGLE_FAVORITE", help = "Toggle a symbol in the favorites list at startup.")]
    pub toggle_favorite: Option<String>,

    /// Per-target level overrides, e.g. `{"reqwest": "warn"}`. File only.
    #[clap(skip)]
    pub log_targets: Option<BTreeMap<String, String>>,

    /// Extra sector consolidations, raw tag -> canonical names. File only.
    #[clap(skip)]
    pub sector_overrides: Option<BTreeMap<String, Vec<String>>>,

    /// Secondary exchange -> listed symbols. File only.
    #[clap(skip)]
    pub listings: Option<BTreeMap<String, Vec<String>>>,

    /// Secondary exchange -> trading page template with `{symbol}`. File only.
    #[clap(skip)]
    pub link_templates: Option<BTreeMap<String, String>>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            log_keep: other.log_keep.or(self.log_keep),
            log_targets: other.log_targets.or(self.log_targets),
            poll_url: other.poll_url.or(self.poll_url),
            push_url: other.push_url.or(self.push_url),
            poll_interval_seconds: other.poll_interval_seconds.or(self.poll_interval_seconds),
            request_timeout_seconds: other.request_timeout_seconds.or(self.request_timeout_seconds),
            retry_base_delay_ms: other.retry_base_delay_ms.or(self.retry_base_delay_ms),
            retry_max_multiplier: other.retry_max_multiplier.or(self.retry_max_multiplier),
            retry_max_retries: other.retry_max_retries.or(self.retry_max_retries),
            reconnect_delay_ms: other.reconnect_delay_ms.or(self.reconnect_delay_ms),
            idle_timeout_seconds: other.idle_timeout_seconds.or(self.idle_timeout_seconds),
            refresh_interval_ms: other.refresh_interval_ms.or(self.refresh_interval_ms),
            storage_path: other.storage_path.or(self.storage_path),
            viewport_width: other.viewport_width.or(self.viewport_width),
            page_size: other.page_size.or(self.page_size),
            search: other.search.or(self.search),
            sort: other.sort.or(self.sort),
            sort_direction: other.sort_direction.or(self.sort_direction),
            price_range: other.price_range.or(self.price_range),
            sector: other.sector.or(self.sector),
            favorites_only: other.favorites_only.or(self.favorites_only),
            toggle_favorite: other.toggle_favorite.or(self.toggle_favorite),
            sector_overrides: other.sector_overrides.or(self.sector_overrides),
            listings: other.listings.or(self.listings),
            link_templates: other.link_templates.or(self.link_templates),
        }
    }

    fn defaults() -> Config {
        Config {
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            log_keep: Some(1),
            // Connection pool chatter drowns out the feed logs at debug.
            log_targets: Some(BTreeMap::from([
                ("hyper_util".to_string(), "warn".to_string()),
                ("reqwest".to_string(), "warn".to_string()),
            ])),
            poll_interval_seconds: Some(defaults::POLL_INTERVAL.as_secs()),
            request_timeout_seconds: Some(defaults::REQUEST_TIMEOUT.as_secs()),
            retry_base_delay_ms: Some(defaults::RETRY_BASE_DELAY.as_millis() as u64),
            retry_max_multiplier: Some(defaults::RETRY_MAX_MULTIPLIER),
            retry_max_retries: Some(defaults::RETRY_MAX_RETRIES),
            reconnect_delay_ms: Some(defaults::RECONNECT_DELAY.as_millis() as u64),
            idle_timeout_seconds: Some(defaults::IDLE_TIMEOUT.as_secs()),
            refresh_interval_ms: Some(1000),
            viewport_width: Some(1280.0),
            page_size: Some(defaults::PAGE_SIZE),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub dir: PathBuf,
    pub level: LevelFilter,
    pub targets: Vec<(String, LevelFilter)>,
    pub keep: usize,
}

/// Everything the runner needs, with defaults applied and inputs validated.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LogSettings,
    pub poll: Option<PollConfig>,
    pub push: Option<PushConfig>,
    pub refresh_interval: Duration,
    pub storage: StorageConfig,
    pub board: BoardConfig,
    pub viewport_width: f64,
    pub filters: FilterState,
    pub toggle_favorite: Option<String>,
    pub sectors: SectorMap,
    pub listings: ListingIndex,
    pub links: Vec<ExchangeLink>,
}

impl Config {
    pub fn resolve(self) -> Result<Settings> {
        let config = Config::defaults().merge(self);

        let logging = LogSettings {
            dir: config.log_dir.unwrap_or_else(|| PathBuf::from("./logs")),
            level: parse_level(config.log_level.as_deref().unwrap_or("info"))?,
            targets: config
                .log_targets
                .unwrap_or_default()
                .into_iter()
                .map(|(target, level)| parse_level(&level).map(|level| (target, level)))
                .collect::<Result<Vec<_>>>()?,
            keep: config.log_keep.unwrap_or(1).max(1),
        };

        let retry = RetryConfig {
            base_delay: Duration::from_millis(config.retry_base_delay_ms.unwrap_or_default()),
            max_multiplier: config.retry_max_multiplier.unwrap_or(defaults::RETRY_MAX_MULTIPLIER),
            max_retries: config.retry_max_retries.unwrap_or(defaults::RETRY_MAX_RETRIES),
        };

        let poll = config.poll_url.filter(|u| !u.trim().is_empty()).map(|url| {
            let mut poll = PollConfig::new(url);
            poll.interval = secs_or(config.poll_interval_seconds, defaults::POLL_INTERVAL);
            poll.request_timeout = secs_or(config.request_timeout_seconds, defaults::REQUEST_TIMEOUT);
            poll.retry = retry;
            poll
        });

        let push = config.push_url.filter(|u| !u.trim().is_empty()).map(|url| {
            let mut push = PushConfig::new(url);
            push.reconnect_delay = config
                .reconnect_delay_ms
                .map_or(defaults::RECONNECT_DELAY, Duration::from_millis);
            push.idle_timeout = match config.idle_timeout_seconds {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => Some(defaults::IDLE_TIMEOUT),
            };
            push
        });

        let storage = match config.storage_path {
            Some(path) => StorageConfig { path },
            None => StorageConfig::default(),
        };

        let board = BoardConfig {
            page_size: config.page_size.unwrap_or(defaults::PAGE_SIZE).max(1),
            ..BoardConfig::default()
        };

        let mut sort = SortSpec::default();
        if let Some(key) = &config.sort {
            sort.key = key.parse::<SortKey>().map_err(anyhow::Error::msg)?;
        }
        if let Some(direction) = &config.sort_direction {
            sort.direction = direction.parse::<SortDirection>().map_err(anyhow::Error::msg)?;
        }

        let price_range = match &config.price_range {
            Some(id) => id.parse::<PriceBucket>().map_err(anyhow::Error::msg)?,
            None => PriceBucket::All,
        };

        let filters = FilterState {
            search: config.search.unwrap_or_default(),
            sort,
            favorites_only: config.favorites_only.unwrap_or(false),
            sector: config.sector.filter(|s| !s.trim().is_empty()),
            price_range,
        };

        let sectors = config
            .sector_overrides
            .unwrap_or_default()
            .iter()
            .fold(SectorMap::default(), |map, (raw, canonical)| {
                let names: Vec<&str> = canonical.iter().map(String::as_str).collect();
                map.with_entry(raw, &names)
            });

        let listings = config
            .listings
            .unwrap_or_default()
            .iter()
            .fold(ListingIndex::new(), |index, (exchange, symbols)| index.with_exchange(exchange, symbols));

        let links = config
            .link_templates
            .unwrap_or_default()
            .iter()
            .map(|(exchange, template)| {
                ExchangeLink::new(exchange, template).with_context(|| format!("link template for '{exchange}'"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Settings {
            logging,
            poll,
            push,
            refresh_interval: Duration::from_millis(config.refresh_interval_ms.unwrap_or(1000).max(50)),
            storage,
            board,
            viewport_width: config.viewport_width.unwrap_or(1280.0),
            filters,
            toggle_favorite: config.toggle_favorite.filter(|s| !s.trim().is_empty()),
            sectors,
            listings,
            links,
        })
    }
}

fn parse_level(level: &str) -> Result<LevelFilter> {
    level
        .trim()
        .parse::<LevelFilter>()
        .with_context(|| format!("unknown log level '{level}'"))
}

fn secs_or(value: Option<u64>, fallback: Duration) -> Duration {
    value.map_or(fallback, Duration::from_secs)
}

/// Reads a JSON config file. A missing file is not an error.
fn read_config_file(path: &Path) -> Option<Config> {
    if !path.exists() {
        log::info!("Config file not found at {}. Using defaults and environment/CLI variables.", path.display());
        return None;
    }
    match fs::read_to_string(path) {
        Ok(text) => match serde_json::from_str::<Config>(&text) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to parse config file {}: {}. Falling back to other sources.", path.display(), e);
                None
            }
        },
        Err(e) => {
            log::warn!("Failed to read config file {}: {}. Falling back to other sources.", path.display(), e);
            None
        }
    }
}

/// Built-in defaults < config file < environment / CLI.
pub fn load_config() -> Config {
    // CLI args already include env vars; parse once and reuse for both the
    // config path lookup and the final override.
    let cli = Config::parse();

    let config_file_path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let from_file = read_config_file(&config_file_path).unwrap_or_default();
    from_file.merge(cli)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn cli_overrides_file_overrides_defaults() {
        let file = Config {
            poll_url: Some("https://file.example/ticker".into()),
            poll_interval_seconds: Some(15),
            page_size: Some(50),
            ..Default::default()
        };
        let cli = Config {
            poll_interval_seconds: Some(5),
            ..Default::default()
        };

        let settings = file.merge(cli).resolve().unwrap();
        let poll = settings.poll.unwrap();
        assert_eq!(poll.url, "https://file.example/ticker");
        assert_eq!(poll.interval, Duration::from_secs(5));
        assert_eq!(poll.request_timeout, defaults::REQUEST_TIMEOUT);
        assert_eq!(settings.board.page_size, 50);
        assert!(settings.push.is_none());
    }

    #[test]
    fn zero_idle_timeout_disables_watchdog() {
        let settings = Config {
            push_url: Some("https://stream.example/sse".into()),
            idle_timeout_seconds: Some(0),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        assert_eq!(settings.push.unwrap().idle_timeout, None);
    }

    #[test]
    fn filters_are_parsed() {
        let settings = Config {
            sort: Some("price".into()),
            sort_direction: Some("asc".into()),
            price_range: Some("under10000".into()),
            favorites_only: Some(true),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        assert_eq!(settings.filters.sort, SortSpec::new(SortKey::Price, SortDirection::Ascending));
        assert_eq!(settings.filters.price_range, PriceBucket::Under10k);
        assert!(settings.filters.favorites_only);

        let bad = Config {
            price_range: Some("cheap".into()),
            ..Default::default()
        };
        assert!(bad.resolve().is_err());
    }

    #[test]
    fn reads_camel_case_file_with_lookup_tables() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "pushUrl": "https://stream.example/sse",
                "reconnectDelayMs": 250,
                "listings": {{"binance": ["BTC", "ETH"]}},
                "linkTemplates": {{"binance": "https://www.binance.com/en/trade/{{symbol}}_USDT"}},
                "sectorOverrides": {{"meme": ["Meme"]}}
            }}"#
        )
        .unwrap();

        let settings = read_config_file(file.path()).unwrap().resolve().unwrap();
        assert_eq!(settings.push.unwrap().reconnect_delay, Duration::from_millis(250));
        assert_eq!(settings.listings.exchanges_for("eth").collect::<Vec<_>>(), vec!["binance"]);
        assert_eq!(settings.links[0].url_for("btc").unwrap().as_str(), "https://www.binance.com/en/trade/BTC_USDT");
        assert_eq!(settings.sectors.canonical("Meme"), vec!["Meme"]);
    }

    #[test]
    fn log_settings_from_file_and_defaults() {
        let settings = Config::default().resolve().unwrap();
        assert_eq!(settings.logging.level, LevelFilter::Info);
        assert_eq!(settings.logging.keep, 1);
        assert!(settings.logging.targets.contains(&("reqwest".to_string(), LevelFilter::Warn)));

        let settings = Config {
            log_level: Some("DEBUG".into()),
            log_keep: Some(5),
            log_targets: Some(BTreeMap::from([("lib_board".to_string(), "trace".to_string())])),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        assert_eq!(settings.logging.level, LevelFilter::Debug);
        assert_eq!(settings.logging.keep, 5);
        assert_eq!(settings.logging.targets, vec![("lib_board".to_string(), LevelFilter::Trace)]);

        let bad = Config {
            log_level: Some("loud".into()),
            ..Default::default()
        };
        assert!(bad.resolve().is_err());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_config_file(&dir.path().join("absent.conf")).is_none());
    }
}
