use serde_json::json;

use boampscan::config::{parse_flag, PortalConfig};
use boampscan::domain::catalog::{CPV_CATALOG, IDF_DEPARTMENTS};
use boampscan::domain::models::FilterSet;
use boampscan::error::{AppError, Result};
use boampscan::export;
use boampscan::lifecycle;
use boampscan::pagination::Paginator;
use boampscan::service::SearchService;

const USAGE: &str = "\
boampscan — search BOAMP procurement notices

USAGE:
    boampscan [OPTIONS] [key=value ...] [keywords ...]

Search parameters (same names as the query-string API):
    q, cpvPrefix, buyer, deptCodes, nature, dateFrom, dateTo,
    useDate, useTraining, sort, page, pageSize, selectedBucket
    Bare words are appended to q.

OPTIONS:
    --pages N          Fetch up to N consecutive pages (append mode)
    --csv              Output an Excel-compatible CSV instead of JSON
    --ics              Output an ICS deadline calendar instead of JSON
    --refresh-schema   Re-fetch the dataset field catalog first
    --depts            List the curated department codes and exit
    --cpv-list         List the training CPV catalog and exit
    -h, --help         Show this help

ENVIRONMENT:
    ODS_BASE, DATASET_ID, ODS_APIKEY, ALLOW_INSECURE_SSL, RUST_LOG
";

#[derive(Clone, Copy)]
enum Output {
    Json,
    Csv,
    Ics,
}

#[tokio::main]
async fn main() {
    lifecycle::init_logging();
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(err) = run(&args).await {
        eprintln!("{}", describe_failure(&err));
        std::process::exit(1);
    }
}

/// Short status line for the operator; provider rejections carry their
/// HTTP status, everything else is a network/local failure.
fn describe_failure(err: &AppError) -> String {
    match err {
        AppError::HttpStatus { status, message } => {
            format!("The portal rejected the request (HTTP {status}): {message}")
        }
        other => format!("Search failed: {other}"),
    }
}

async fn run(args: &[String]) -> Result<()> {
    let mut output = Output::Json;
    let mut max_pages: u32 = 1;
    let mut refresh_schema = false;
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut free_words: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print!("{USAGE}");
                return Ok(());
            }
            "--depts" => {
                for (code, name) in IDF_DEPARTMENTS {
                    println!("{code}  {name}");
                }
                return Ok(());
            }
            "--cpv-list" => {
                for (code, domain, description) in CPV_CATALOG {
                    println!("{code}  {domain} — {description}");
                }
                return Ok(());
            }
            "--csv" => output = Output::Csv,
            "--ics" => output = Output::Ics,
            "--refresh-schema" => refresh_schema = true,
            "--pages" => {
                i += 1;
                let value = args.get(i).ok_or_else(|| {
                    AppError::Other(anyhow::anyhow!("--pages needs a number"))
                })?;
                max_pages = value.parse().map_err(|_| {
                    AppError::Other(anyhow::anyhow!("--pages needs a number, got {value}"))
                })?;
            }
            flag if flag.starts_with("--") => {
                return Err(AppError::Other(anyhow::anyhow!(
                    "unknown option {flag}; see --help"
                )));
            }
            arg => match arg.split_once('=') {
                Some((key, value)) => pairs.push((key.to_string(), value.to_string())),
                None => free_words.push(arg.to_string()),
            },
        }
        i += 1;
    }

    if !free_words.is_empty() {
        let extra = free_words.join(" ");
        match pairs.iter_mut().find(|(k, _)| k == "q") {
            Some((_, q)) => *q = format!("{q} {extra}"),
            None => pairs.push(("q".to_string(), extra)),
        }
    }
    if pairs.iter().any(|(k, v)| k == "refreshSchema" && parse_flag(v)) {
        refresh_schema = true;
    }

    let filters = FilterSet::from_query_pairs(&pairs);
    let config = PortalConfig::from_env()?;
    log::debug!("Portal {} dataset {}", config.base_str(), config.dataset);
    let service = SearchService::new(config)?;

    if refresh_schema {
        service.refresh_schema().await?;
    }

    let mut pager = Paginator::new(filters.page_size, true);
    let mut page = filters.page;
    let mut last_page = None;
    for fetched in 0..max_pages.max(1) {
        let started = if fetched == 0 {
            pager.begin(page)
        } else {
            match pager.begin_next() {
                Some(next) => {
                    page = next;
                    true
                }
                None => false,
            }
        };
        if !started {
            break;
        }
        let result = service
            .search(&FilterSet { page, ..filters.clone() })
            .await?;
        pager.accept(page, &result);
        last_page = Some(result);
    }

    let last = last_page.expect("at least one page is always fetched");
    match output {
        Output::Json => {
            let body = json!({
                "items": pager.items(),
                "total": last.total,
                "totalPages": pager.total_pages(),
                "page": pager.current_page(),
                "pageSize": pager.page_size(),
                "dialect": last.dialect.as_str(),
                "url": last.url.as_str(),
            });
            let rendered = serde_json::to_string_pretty(&body)
                .map_err(|e| AppError::Other(e.into()))?;
            println!("{rendered}");
        }
        Output::Csv => print!("{}", export::to_csv(pager.items())),
        Output::Ics => println!("{}", export::to_ics(pager.items())),
    }
    Ok(())
}
