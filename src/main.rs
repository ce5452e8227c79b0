//! Entry point. Wires CLI -> Config -> ApiClient -> page controllers -> text render.

mod api_client;
mod chart;
mod config;
mod detail;
mod detail_page;
mod error;
mod list_page;
mod location;
mod news;
mod parser;
mod render;
mod state;
mod strategy;
#[cfg(test)]
mod testing;
mod types;
mod utils;

use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use crate::api_client::ApiClient;
use crate::config::{news_password_from_env, AppConfig};
use crate::detail_page::StockDetailPage;
use crate::list_page::StockListPage;
use crate::location::MemoryHistory;
use crate::news::NewsForm;
use crate::parser::{format_date, parse_date, Tab};
use crate::state::{SortKey, StatusMessage};
use crate::strategy::{name_from_route, StrategyDetailPage, StrategyListPage};

#[derive(Parser, Debug)]
#[command(name = "wealthbehave-scanner", version, about = "WealthBehave stock scanner dashboard")]
struct Cli {
    /// Config file (default: ./config.yaml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Daily stock list
    List {
        /// Raw query string, e.g. "date=2024-05-01&tab=0"
        #[arg(long)]
        query: Option<String>,
        /// Trading day (YYYY-MM-DD); latest day when omitted
        #[arg(long)]
        date: Option<String>,
        /// 0 = stocks, 1 = strategies
        #[arg(long)]
        tab: Option<String>,
        /// symbol, name, close_change_percentage, high_change_percentage, day_close
        #[arg(long)]
        sort: Option<String>,
        /// Extra attempts after a failed load
        #[arg(long, default_value_t = 0)]
        retries: u32,
    },
    /// Detail view for one symbol
    Stock { symbol: String },
    /// Attach a news article to a symbol
    AddNews {
        symbol: String,
        #[arg(long)]
        text: String,
        /// Falls back to SCANNER_NEWS_PASSWORD
        #[arg(long)]
        password: Option<String>,
    },
    /// Remove a stored news article
    DeleteNews {
        symbol: String,
        uuid: String,
        /// Falls back to SCANNER_NEWS_PASSWORD
        #[arg(long)]
        password: Option<String>,
    },
    /// Strategy catalogue
    Strategies,
    /// One strategy, by name or by its `/strategy/<name>` route
    Strategy { name: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = AppConfig::resolve(cli.config.as_deref())?;
    let api = ApiClient::new(&cfg.api)?;
    info!("API base: {}", cfg.api.base_url);

    match cli.command {
        Command::List {
            query,
            date,
            tab,
            sort,
            retries,
        } => {
            let sort = match sort {
                Some(s) => s
                    .parse::<SortKey>()
                    .map_err(|e| anyhow!("{e}; expected one of: {}", render::sort_options()))?,
                None => cfg.default_sort()?,
            };

            let mut page = StockListPage::new(
                api.clone(),
                MemoryHistory::new("/", query.as_deref().unwrap_or("")),
                cfg.api.list_limit,
            );
            page.load_available_dates().await;

            if let Some(raw) = tab.as_deref() {
                match Tab::from_param(raw) {
                    Some(t) => page.change_tab(t),
                    None => warn!("ignoring tab {:?}; expected 0 or 1", raw),
                }
            }
            let mut notices = Vec::new();
            match date.as_deref().map(|raw| (raw, parse_date(raw))) {
                Some((_, Some(day))) => {
                    if !page.state.is_date_selectable(day) {
                        warn!("{} is not among the available dates", day);
                        notices.push(StatusMessage::warning(format!(
                            "{} is not an available trading day.",
                            format_date(day)
                        )));
                    }
                    page.change_date(day).await;
                }
                Some((raw, None)) => {
                    warn!("ignoring date {:?}; expected YYYY-MM-DD", raw);
                    page.sync().await;
                }
                None => page.sync().await,
            }
            for attempt in 1..=retries {
                let Some(msg) = page.state.phase.error() else {
                    break;
                };
                info!("Retrying list load ({}/{}) after: {}", attempt, retries, msg);
                page.retry().await;
            }
            page.set_sort(sort);

            for n in &notices {
                println!("{}", render::status_line(n));
            }
            print!("{}", render::list_page(&page.state, &page.navigator().href()));

            if page.state.tab == Tab::Strategy {
                let mut strategies = StrategyListPage::new(api);
                strategies.load().await;
                print!(
                    "{}",
                    render::strategy_list(&strategies.phase, &strategies.catalogue)
                );
            }
        }
        Command::Stock { symbol } => {
            let mut page = StockDetailPage::new(api, &symbol);
            page.load().await;
            print_detail(&page, cfg.display.chart_tail);
        }
        Command::AddNews {
            symbol,
            text,
            password,
        } => {
            let mut page = StockDetailPage::new(api, &symbol);
            page.load().await;
            let password = password.or_else(news_password_from_env).unwrap_or_default();
            page.form = NewsForm::new(password, text);
            page.submit_news().await;
            if let Some(w) = &page.form.warning {
                println!("{}", render::status_line(&StatusMessage::warning(w.as_str())));
            }
            if let Some(s) = &page.form.success {
                println!("{}", render::status_line(&StatusMessage::success(s.as_str())));
            }
            print_detail(&page, cfg.display.chart_tail);
        }
        Command::DeleteNews {
            symbol,
            uuid,
            password,
        } => {
            let mut page = StockDetailPage::new(api, &symbol);
            page.load().await;
            let summary = page
                .detail()
                .and_then(|d| d.raw_news.iter().find(|n| n.uuid == uuid))
                .map(|n| n.summary.clone())
                .unwrap_or_default();
            page.dialog.open(&uuid, &summary);
            page.dialog.password = password.or_else(news_password_from_env).unwrap_or_default();
            let deleted = page.delete_news().await;
            if !deleted && page.status.is_none() {
                page.status = Some(StatusMessage::warning("Password is required."));
                page.dialog.cancel();
            }
            print_detail(&page, cfg.display.chart_tail);
        }
        Command::Strategies => {
            let mut page = StrategyListPage::new(api);
            page.load().await;
            print!("{}", render::strategy_list(&page.phase, &page.catalogue));
        }
        Command::Strategy { name } => {
            let name = name_from_route(&name).unwrap_or(name);
            let mut page = StrategyDetailPage::new(api, &name);
            page.load().await;
            if let Some(root) = &cfg.display.assets_dir {
                page.images
                    .resolve(|path| root.join(path.trim_start_matches('/')).is_file());
            }
            print!(
                "{}",
                render::strategy_detail(
                    &page.phase,
                    page.strategy(),
                    page.images.current(),
                    page.image.as_ref(),
                    page.back_route(),
                )
            );
        }
    }
    Ok(())
}

fn print_detail(page: &StockDetailPage<ApiClient>, chart_tail: usize) {
    print!(
        "{}",
        render::detail_page(
            page.symbol(),
            &page.phase,
            page.view().as_ref(),
            page.status.as_ref(),
            chart_tail,
        )
    );
}
