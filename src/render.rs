//! Plain-text presentation of the pages, written to stdout by the CLI.

use std::fmt::{self, Write};

use crate::chart::CandleStats;
use crate::detail::{AnalysisValue, CandleChart, FigureSource, StockDetailView, Trend};
use crate::parser::{format_date, Tab};
use crate::state::{Phase, Severity, SortKey, StatusMessage, StockListState};
use crate::strategy::{detail_route, Catalogue};
use crate::types::{StockSummary, StrategyDetail, StrategyImage, StrategyInfo};
use crate::utils::{format_magnitude, format_percent};

const TITLE: &str = "WealthBehave Stock Scanner";
const RULE: &str = "------------------------------------------------------------";

fn or_na(v: Option<&str>) -> &str {
    v.filter(|s| !s.is_empty()).unwrap_or("NA")
}

fn price(v: Option<f64>) -> String {
    v.map(|p| format!("${p}")).unwrap_or_else(|| "NA".to_string())
}

pub fn status_line(msg: &StatusMessage) -> String {
    let tag = match msg.severity {
        Severity::Success => "OK",
        Severity::Warning => "WARN",
        Severity::Error => "ERROR",
    };
    format!("[{tag}] {}", msg.message)
}

// ---------- Stock list ----------

fn write_stock_card(out: &mut String, s: &StockSummary) -> fmt::Result {
    let change = s.close_change_percentage.unwrap_or(0.0);
    let arrow = if change >= 0.0 { "up" } else { "down" };
    writeln!(out, "{:<8} {}", s.symbol, s.today_date)?;
    writeln!(out, "  {}", or_na(s.name.as_deref()))?;
    writeln!(
        out,
        "  Price {}  Change % {} ({})",
        price(s.day_close),
        format_percent(change),
        arrow
    )?;
    writeln!(
        out,
        "  Range {} - {}  Prev Close {}",
        price(s.day_low),
        price(s.day_high),
        price(s.yesterday_close)
    )?;
    writeln!(
        out,
        "  Sector {}  Float Risk {}{}",
        or_na(s.sector.as_deref()),
        or_na(s.float_risk.as_deref()),
        if s.short_signal { "  [short signal]" } else { "" }
    )?;
    writeln!(out, "  -> /stock/{}", s.symbol)
}

fn write_list(out: &mut String, state: &StockListState, href: &str) -> fmt::Result {
    writeln!(out, "{TITLE}")?;
    let tabs: Vec<String> = [Tab::Stocks, Tab::Strategy]
        .iter()
        .map(|t| {
            if *t == state.tab {
                format!("[{}]", t.label())
            } else {
                t.label().to_string()
            }
        })
        .collect();
    writeln!(out, "{}    {}", tabs.join(" | "), href)?;

    if state.tab == Tab::Strategy {
        return Ok(());
    }

    let date = state.date.map(format_date);
    writeln!(
        out,
        "Date: {}   Sort: {}",
        date.as_deref().unwrap_or("latest"),
        state.sort.label()
    )?;
    let known = state.available_dates().count();
    if known > 0 {
        writeln!(out, "{known} trading days available")?;
    }
    writeln!(out, "{RULE}")?;

    match &state.phase {
        Phase::Idle | Phase::Loading => writeln!(out, "Loading stock data..."),
        Phase::Error(msg) if state.stocks.is_empty() => {
            writeln!(out, "[ERROR] {msg}")?;
            writeln!(out, "Try again with `list --retries 1`, or pick another date with `--date`.")
        }
        _ if state.stocks.is_empty() => writeln!(
            out,
            "No stock data available for {}.",
            date.as_deref().unwrap_or("the selected date")
        ),
        _ => {
            for s in state.sorted() {
                write_stock_card(out, s)?;
            }
            writeln!(out, "{RULE}")?;
            writeln!(out, "{} stocks", state.stocks.len())
        }
    }
}

pub fn list_page(state: &StockListState, href: &str) -> String {
    let mut out = String::new();
    let _ = write_list(&mut out, state, href);
    out
}

// ---------- Stock detail ----------

fn write_candles(out: &mut String, chart: &CandleChart, tail: usize) -> fmt::Result {
    writeln!(out, "{}", chart.title)?;
    let Some(stats) = CandleStats::of(&chart.points) else {
        return writeln!(out, "  No chart data.");
    };
    writeln!(
        out,
        "  {} candles {} .. {}  low {}  high {}  last close {}",
        stats.count,
        stats.first.format("%Y-%m-%d %H:%M"),
        stats.last.format("%Y-%m-%d %H:%M"),
        stats.low,
        stats.high,
        stats.last_close
    )?;
    let skip = chart.points.len().saturating_sub(tail);
    for p in &chart.points[skip..] {
        writeln!(
            out,
            "  {}  O {}  H {}  L {}  C {}",
            p.time.format("%Y-%m-%d %H:%M"),
            p.open,
            p.high,
            p.low,
            p.close
        )?;
    }
    Ok(())
}

fn write_view(out: &mut String, v: &StockDetailView, chart_tail: usize) -> fmt::Result {
    writeln!(out, "{}", v.header.title)?;
    writeln!(out, "Data as of {}", v.header.as_of)?;
    writeln!(out, "{RULE}")?;

    for tile in v.metrics.tiles() {
        let mark = match tile.trend {
            Some(Trend::Up) => " (up)",
            Some(Trend::Down) => " (down)",
            None => "",
        };
        writeln!(out, "{:<12} {}{}", tile.title, tile.value, mark)?;
    }

    let levels = v.price.levels();
    writeln!(out, "\nPrice Levels ({})", v.price.symbol)?;
    for (label, value) in levels.movement() {
        writeln!(out, "  {label:<16} {value}")?;
    }
    writeln!(
        out,
        "  Market Open High {}  Low {}",
        levels.market_open_high, levels.market_open_low
    )?;
    if !levels.key_levels.is_empty() {
        let keys: Vec<String> = levels.key_levels.iter().map(|k| k.to_string()).collect();
        writeln!(out, "  Key levels {}", keys.join(", "))?;
    }
    let (lo, hi) = levels.y_range();
    writeln!(out, "  Range {lo:.2} .. {hi:.2}")?;

    writeln!(out)?;
    write_candles(out, &v.daily, chart_tail)?;
    write_candles(out, &v.one_minute, chart_tail)?;
    write_candles(out, &v.five_minute, chart_tail)?;

    let c = &v.company;
    writeln!(out, "\nCompany Info")?;
    writeln!(out, "  Symbol {}  Name {}", c.symbol, c.name)?;
    writeln!(out, "  Sector {}  Industry {}", c.sector, c.industry)?;
    writeln!(out, "  Country {}  Type {}  ISIN {}", c.country_domicile, c.security_type, c.isin)?;

    writeln!(out, "\nCash vs Debt")?;
    let sources = [v.cash_debt.cash_source, v.cash_debt.debt_source];
    for ((label, amount), source) in v.cash_debt.bars().into_iter().zip(sources) {
        let from = match source {
            FigureSource::Analysis => "SEC analysis",
            FigureSource::Statement => "statement",
        };
        writeln!(out, "  {label:<5} ${}  ({from})", format_magnitude(amount, 2))?;
    }

    let sec = &v.sec_filing;
    writeln!(out, "\nSEC Filing")?;
    writeln!(out, "  Summary: {}", sec.summary)?;
    for entry in &sec.analysis {
        match &entry.value {
            AnalysisValue::Text(t) => writeln!(out, "  {}: {}", entry.key, t)?,
            AnalysisValue::List(items) => {
                writeln!(out, "  {}:", entry.key)?;
                for it in items {
                    writeln!(out, "    - {it}")?;
                }
            }
        }
    }
    writeln!(out, "  Details: {}", sec.details)?;
    writeln!(out, "  Recommendation: {}", sec.recommendation)?;
    writeln!(out, "  Filing: {}", sec.filing)?;

    writeln!(out, "\nSuggestion\n  {}", v.suggestion.text)?;

    writeln!(out, "\nStored News Articles ({})", v.news.symbol)?;
    if v.news.items.is_empty() {
        writeln!(out, "  No news articles stored.")?;
    }
    for n in &v.news.items {
        writeln!(out, "  [{}] {}  ({})", n.uuid, n.summary, n.timestamp)?;
    }
    if v.news.document_id.is_none() {
        writeln!(out, "  (document id missing: adding or deleting news is unavailable)")?;
    }
    Ok(())
}

pub fn detail_page(
    symbol: &str,
    phase: &Phase,
    view: Option<&StockDetailView>,
    status: Option<&StatusMessage>,
    chart_tail: usize,
) -> String {
    let mut out = String::new();
    if let Some(msg) = status {
        out.push_str(&status_line(msg));
        out.push('\n');
    }
    let _ = match (phase, view) {
        (Phase::Error(msg), _) => writeln!(out, "Error: {msg}"),
        (_, Some(v)) => write_view(&mut out, v, chart_tail),
        (Phase::Idle | Phase::Loading, None) => writeln!(out, "Loading..."),
        _ => writeln!(out, "No data available for {symbol}."),
    };
    out
}

// ---------- Strategies ----------

fn write_strategy_group(out: &mut String, title: &str, items: &[StrategyInfo]) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(out, "\n{title}")?;
    for s in items {
        writeln!(out, "  {}  {}", s.name, detail_route(&s.name))?;
        if !s.description.is_empty() {
            writeln!(out, "    {}", s.description)?;
        }
    }
    Ok(())
}

pub fn strategy_list(phase: &Phase, catalogue: &Catalogue) -> String {
    let mut out = String::from("日內多空策略\n");
    let _ = match phase {
        Phase::Idle | Phase::Loading => writeln!(out, "Loading strategies..."),
        Phase::Error(msg) => writeln!(out, "Error fetching strategies: {msg}"),
        Phase::Loaded if catalogue.is_empty() => writeln!(out, "No strategies found."),
        Phase::Loaded => write_strategy_group(&mut out, "空頭策略", &catalogue.short)
            .and_then(|_| write_strategy_group(&mut out, "多頭策略", &catalogue.long)),
    };
    out
}

fn write_strategy(
    out: &mut String,
    phase: &Phase,
    strategy: Option<&StrategyDetail>,
    image_path: &str,
    embedded: Option<&StrategyImage>,
) -> fmt::Result {
    let s = match (phase, strategy) {
        (_, Some(s)) => s,
        (Phase::Error(msg), None) => return writeln!(out, "Error: {msg}"),
        _ => return writeln!(out, "Loading..."),
    };
    writeln!(out, "{}", s.name)?;
    match embedded {
        Some(img) => writeln!(
            out,
            "Image: embedded {} ({} base64 chars)",
            img.format,
            img.data.len()
        )?,
        None => writeln!(out, "Image: {image_path}")?,
    }
    for (title, body) in s.sections() {
        writeln!(out, "\n{title}\n  {body}")?;
    }
    Ok(())
}

pub fn strategy_detail(
    phase: &Phase,
    strategy: Option<&StrategyDetail>,
    image_path: &str,
    embedded: Option<&StrategyImage>,
    back: &str,
) -> String {
    let mut out = format!("Back to Strategies: {back}\n");
    let _ = write_strategy(&mut out, phase, strategy, image_path, embedded);
    out
}

/// Sort options offered by the list page, for `--help` style listings.
pub fn sort_options() -> String {
    [
        SortKey::Symbol,
        SortKey::Name,
        SortKey::CloseChange,
        SortKey::HighChange,
        SortKey::DayClose,
    ]
    .iter()
    .map(|k| format!("{} ({})", k.as_str(), k.label()))
    .collect::<Vec<_>>()
    .join(", ")
}
