use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use reserva::clock::{run_ticker, Clock};
use reserva::config::Config;
use reserva::engine::Coordinator;
use reserva::notify::NotifyHub;
use reserva::scenario::{render, Scenario};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    reserva::observability::init(config.metrics_port);

    let scenario = match &config.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::builtin(),
    };
    let compounds = scenario.compounds()?;

    info!("reserva starting");
    info!("  tick: {:?}", config.tick);
    info!("  run_until: {}", config.run_until);
    info!(
        "  scenario: {}",
        config
            .scenario
            .as_ref()
            .map_or("built-in".to_string(), |p| p.display().to_string())
    );
    info!(
        "  metrics: {}",
        config
            .metrics_port
            .map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics"))
    );

    let clock = Clock::new();
    tokio::spawn(run_ticker(clock.clone(), config.tick));

    let notify = Arc::new(NotifyHub::new());
    let coordinator = Coordinator::spawn(scenario.facilities.clone(), clock.clone(), notify.clone())?;

    // Presentation: one consumer per user inbox.
    for user in &scenario.users {
        let mut inbox = notify.register(user);
        tokio::spawn(async move {
            while let Some(n) = inbox.recv().await {
                info!(
                    user = n.booking.owner.id,
                    outcome = n.outcome.label(),
                    "{}",
                    render(&n)
                );
            }
        });
    }

    // Bookers: each compound goes in after its delay, without waiting for the verdict.
    for (delay_ms, compound) in compounds {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            if let Err(e) = coordinator.submit(compound) {
                warn!("submission refused: {e}");
            }
        });
    }

    // Run until the logical clock reaches run_until, or SIGTERM/ctrl-c.
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to register SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
        }
    };
    tokio::pin!(shutdown);

    let mut poll = tokio::time::interval(config.tick.min(Duration::from_millis(100)));
    loop {
        tokio::select! {
            _ = poll.tick() => {
                if clock.now() >= config.run_until {
                    info!("clock reached {}, stopping", config.run_until);
                    break;
                }
            }
            _ = &mut shutdown => {
                info!("shutdown signal received, stopping");
                break;
            }
        }
    }

    for facility in coordinator.facilities().await? {
        info!(
            facility = %facility.id,
            capacity = facility.capacity,
            bookings = facility.bookings.len(),
            "final occupancy"
        );
        for b in &facility.bookings {
            info!("  user {} ({}) [{}, {})", b.user, b.priority, b.start, b.end);
        }
    }

    info!("reserva stopped");
    Ok(())
}
