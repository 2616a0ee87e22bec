use anyhow::Context;
use clap::Parser;
use domain_mirror::utils::error::{ErrorSeverity, MirrorError};
use domain_mirror::utils::logger;
use domain_mirror::{CliConfig, DomainMirrorGraph, MirrorCache, MirrorEngine, StaticCatalog};
use std::collections::BTreeMap;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = cli
        .load_config()
        .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

    // 初始化日誌
    if config.logging.json {
        logger::init_json_logger(config.logging.verbose);
    } else {
        logger::init_cli_logger(config.logging.verbose);
    }

    tracing::info!("Starting domain-mirror CLI");
    tracing::debug!("CLI config: {:?}", cli);

    let catalog = StaticCatalog::from_file(&cli.catalog, config.markers.clone())
        .with_context(|| format!("failed to read type catalog {}", cli.catalog.display()))?;
    tracing::info!("📂 Loaded {} type descriptor(s)", catalog.len());

    let engine = MirrorEngine::new(Arc::new(catalog), config);

    match engine.refresh(MirrorCache::global()).await {
        Ok(graph) => {
            print_summary(&graph);
            Ok(())
        }
        Err(e) => {
            report_failure(&e);

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }
    }
}

fn print_summary(graph: &DomainMirrorGraph) {
    let mut per_kind: BTreeMap<String, usize> = BTreeMap::new();
    for mirror in graph.iter() {
        *per_kind.entry(mirror.kind().to_string()).or_default() += 1;
    }

    println!("✅ Domain mirror built ({} types)", graph.len());
    for (kind, count) in &per_kind {
        println!("   {:<20} {}", kind, count);
    }
    if !graph.diagnostics().is_empty() {
        println!("⚠️  {} member(s)/type(s) dropped:", graph.diagnostics().len());
        for diagnostic in graph.diagnostics() {
            match &diagnostic.member {
                Some(member) => println!(
                    "   {}.{}: {}",
                    diagnostic.type_name, member, diagnostic.message
                ),
                None => println!("   {}: {}", diagnostic.type_name, diagnostic.message),
            }
        }
    }
}

fn report_failure(e: &MirrorError) {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Mirror build failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    if let MirrorError::IncompleteModelError(report) = e {
        for violation in &report.violations {
            eprintln!(
                "   {} ← {}",
                violation.missing_type,
                violation.referenced_from.join(", ")
            );
        }
    }
    eprintln!("💡 建議: {}", e.recovery_suggestion());
}
