use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use seller_dashboard::config::load_config;
use seller_dashboard::views::PageView;
use seller_dashboard::{DashboardState, DatasetCache, Page};

/// `seller-dashboard [CONFIG] [PAGE]`
///
/// Loads the configured sales export, applies the configured filters and
/// prints the selected page's data as JSON on stdout.
fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let config_path = args.next().map(PathBuf::from);
    let page_override = args
        .next()
        .map(|p| p.parse::<Page>())
        .transpose()?;

    let config = load_config(config_path.as_deref())?;

    let mut rng = match config.synthesis.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut cache = DatasetCache::new();
    // A load failure halts here: nothing is aggregated without a table.
    let dataset = cache
        .get_or_load(&config.source.path, &mut rng)
        .with_context(|| format!("{} could not be loaded", config.source.path.display()))?;

    for advisory in dataset.advisories() {
        eprintln!("warning: {advisory}");
    }

    let mut state = DashboardState::new(dataset);
    state.criteria = config.dashboard.criteria_for(&state.dataset);
    state.refilter();
    state.set_page(page_override.unwrap_or(config.dashboard.page));

    info!(
        "{}: {} of {} rows selected",
        state.page,
        state.visible_indices.len(),
        state.dataset.len()
    );

    let view = state.render();
    match &view {
        PageView::Overview { kpis } => {
            for (title, value) in kpis.cards() {
                info!("{title}: {value}");
            }
        }
        PageView::Finance { summary } => {
            for (title, value) in summary.metrics() {
                info!("{title}: {value}");
            }
        }
        _ => {}
    }
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
