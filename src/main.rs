// Bus stop countdown client
// Polls an agency real-time feed for one route/direction/stop and renders
// the next arrival as a live MM:SS countdown.

use std::env;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};
use chrono_tz::Tz;

mod config;
mod countdown;
mod transit_feed;

use config::Config;
use countdown::{ConsoleDisplay, CountdownDisplay};
use transit_feed::{ArrivalState, CycleStats, HttpFeed, resolve_next_arrival};

fn format_local_time(timestamp: i64, tz: Tz) -> String {
    match Utc.timestamp_opt(timestamp, 0).single() {
        Some(dt) => dt.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("Invalid timestamp: {}", timestamp),
    }
}

fn print_cycle_status(state: &ArrivalState, stats: &CycleStats, tz: Tz) {
    let stamp = format_local_time(Utc::now().timestamp(), tz);

    if state.available {
        println!(
            "\n✓ [{}] Next bus in {} minute(s), epoch {} ({} trips listed, {} qualified, {} detail fetches skipped)",
            stamp,
            state.eta_minutes,
            state.eta_epoch,
            stats.trips_listed,
            stats.trips_qualified,
            stats.details_skipped
        );
    } else {
        println!(
            "\nℹ️  [{}] No upcoming buses / data unavailable ({} trips listed, {} qualified, {} detail fetches skipped)",
            stamp, stats.trips_listed, stats.trips_qualified, stats.details_skipped
        );
    }
}

fn print_banner(config: &Config) {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║   🚌 Bus Stop Countdown                                    ║");
    println!("╚════════════════════════════════════════════════════════════╝\n");
    println!("📡 Feed: {}", config.base_url);
    println!(
        "🚏 Watching route {} direction {} at stop {}",
        config.route_id, config.direction_id, config.stop_id
    );
    println!(
        "🔄 Fetching every {}s, request timeout {}s, timezone {}\n",
        config.fetch_interval_secs, config.request_timeout_secs, config.timezone
    );
}

/// Cooperative scheduler: one thread, two deadlines, fetch before render.
/// Network calls block the loop, so the countdown can stall for up to the
/// request timeout during a slow cycle; the next render catches it back up.
fn run_loop(config: &Config) -> ! {
    let tz = config.tz();
    let feed = HttpFeed::new(config);
    let mut display = ConsoleDisplay::new();
    let mut state = ArrivalState::unavailable();

    let fetch_interval = Duration::from_secs(config.fetch_interval_secs);
    let render_interval = Duration::from_secs(Config::RENDER_INTERVAL_SECS);

    let mut next_fetch = Instant::now();
    let mut next_render = Instant::now();

    loop {
        let tick = Instant::now();

        if tick >= next_fetch {
            let now = Utc::now().timestamp();
            let (new_state, stats) = resolve_next_arrival(&feed, config, now);
            // Whole-record overwrite: the renderer only ever sees a
            // completed cycle's result.
            state = new_state;
            print_cycle_status(&state, &stats, tz);
            next_fetch = tick + fetch_interval;
        } else if tick >= next_render {
            let text = countdown::format_countdown(&state, Utc::now().timestamp());
            display.draw(&text);
            next_render = tick + render_interval;
        } else {
            thread::sleep(Duration::from_millis(50));
        }
    }
}

fn main() {
    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| Config::DEFAULT_PATH.to_string());

    let config = match Config::load(Path::new(&config_path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("\n💡 Troubleshooting:");
            eprintln!("   1. Pass a config path: buswatch <path/to/buswatch.json>");
            eprintln!("   2. Required fields: base_url, route_id, direction_id, stop_id");
            eprintln!("   3. Optional fields: api_key, fetch_interval_secs, request_timeout_secs, timezone\n");
            std::process::exit(1);
        }
    };

    print_banner(&config);
    run_loop(&config);
}
