//! Text rendering of a `BoardFrame` into log lines.

use lib_board::core::windowing::PageToken;
use lib_board::markets::{ExchangeLink, ListingIndex};
use lib_board::{BoardFrame, PriceRecord};

pub fn log_frame(frame: &BoardFrame, listings: &ListingIndex, links: &[ExchangeLink]) {
    if let Some(banner) = &frame.banner {
        log::warn!("{}", banner);
    }
    if frame.empty {
        log::info!("Waiting for market data...");
        return;
    }

    log::info!("{}", summary_line(frame));
    for row in listings.annotate(frame.rows.clone()) {
        log::info!("{}", row_line(&row));
        for link in links.iter().filter(|l| row.is_listed_on(&l.exchange)) {
            match link.url_for(&row.symbol) {
                Ok(url) => log::debug!("  {} -> {}", link.exchange, url),
                Err(e) => log::debug!("  {}: {}", link.exchange, e),
            }
        }
    }
}

fn summary_line(frame: &BoardFrame) -> String {
    let mut line = format!(
        "{:?} feed | {} of {} symbols",
        frame.source, frame.filtered_records, frame.total_records
    );
    if let Some(pages) = &frame.pages {
        line.push_str(&format!(
            " | page {}/{} [{}]",
            pages.current_page,
            pages.total_pages,
            page_bar(&pages.tokens)
        ));
    }
    if let Some(window) = &frame.window {
        line.push_str(&format!(" | rows {}..{}", window.range.start, window.range.end));
    }
    line
}

pub fn page_bar(tokens: &[PageToken]) -> String {
    tokens
        .iter()
        .map(|t| match t {
            PageToken::Page(n) => n.to_string(),
            PageToken::Ellipsis => "...".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn row_line(row: &PriceRecord) -> String {
    let arrow = if row.is_positive() { '▲' } else { '▼' };
    let mut line = format!(
        "{:<8} {:<16} {:>16.2} {} {:+.2}% ({:+.2})  vol {:.0}",
        row.symbol,
        row.display_name(),
        row.current_price,
        arrow,
        row.change_rate,
        row.change_amount,
        row.volume
    );
    if !row.cross_listings.is_empty() {
        let exchanges: Vec<&str> = row.cross_listings.iter().map(String::as_str).collect();
        line.push_str(&format!("  [{}]", exchanges.join(", ")));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bar_text() {
        let tokens = [PageToken::Page(1), PageToken::Ellipsis, PageToken::Page(5), PageToken::Page(9)];
        assert_eq!(page_bar(&tokens), "1 ... 5 9");
    }

    #[test]
    fn row_shows_direction_and_listings() {
        let mut row = PriceRecord {
            symbol: "ETH".into(),
            english_name: "Ethereum".into(),
            current_price: 4000.0,
            change_rate: -1.5,
            change_amount: -60.0,
            ..Default::default()
        };
        row.cross_listings.insert("binance".into());

        let line = row_line(&row);
        assert!(line.starts_with("ETH"));
        assert!(line.contains("Ethereum"));
        assert!(line.contains('▼'));
        assert!(line.contains("-1.50%"));
        assert!(line.ends_with("[binance]"));
    }
}
