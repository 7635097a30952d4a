//! # protectbridged — `UniFi` Protect to MQTT bridge daemon
//!
//! Composition root that wires the controller session, the bridge core and
//! the MQTT publisher together.
//!
//! ## Responsibilities
//! - Initialise logging and load configuration (file + env vars)
//! - Log into the controller and fetch the first device catalog (both fatal)
//! - Refresh the catalog in the background
//! - Connect to the MQTT broker and expose the health endpoint
//! - Feed the realtime update stream through the bridge until ctrl-c
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no translation logic belongs here.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use protectbridge_adapter_mqtt::{MqttPublisher, command_topic};
use protectbridge_adapter_protect::ProtectSession;
use protectbridge_app::bridge::Bridge;
use protectbridge_app::catalog::{Catalog, CatalogRefresher};
use protectbridge_app::health::HealthFlag;
use protectbridge_app::ports::ControllerSession;
use protectbridged::config::Config;
use protectbridged::health;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let filter = config
        .as_ref()
        .map_or("protectbridged=info,protectbridge=info", |config| {
            config.logging.filter.as_str()
        });
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match config {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "invalid configuration, not starting");
            return Err(err.into());
        }
    };

    let prefixes = config.prefixes();
    tracing::info!(
        controller = %config.protect.host(),
        camera_prefix = %prefixes.camera,
        sensor_prefix = %prefixes.sensor,
        "starting protectbridged"
    );

    // Controller
    let session =
        ProtectSession::new(config.protect.clone()).context("failed to build controller client")?;
    if let Err(err) = session.login().await {
        tracing::error!(%err, "invalid login credentials, not starting");
        return Err(err.into());
    }
    let catalog = match Catalog::bootstrap(&session).await {
        Ok(catalog) => catalog,
        Err(err) => {
            tracing::error!(%err, "unable to bootstrap the controller, not starting");
            return Err(err.into());
        }
    };
    let refresher =
        CatalogRefresher::start(session.clone(), catalog.clone(), config.refresh_interval());

    // Bus
    let health_flag = HealthFlag::new();
    let (publisher, mqtt_driver) = MqttPublisher::connect(
        &config.mqtt,
        command_topic(&prefixes.camera),
        health_flag.clone(),
    );

    let health_server = config.health.enabled.then(|| {
        let addr = config.health_bind_addr();
        let health_flag = health_flag.clone();
        tokio::spawn(async move {
            if let Err(err) = health::serve(&addr, health_flag).await {
                tracing::warn!(%err, %addr, "health endpoint stopped");
            }
        })
    });

    // Bridge
    let updates = session
        .subscribe()
        .await
        .context("failed to subscribe to controller updates")?;
    let bridge = Bridge::new(
        catalog.reader(),
        prefixes,
        config.publish_options(),
        publisher.clone(),
        config.bridge.pulse_policy,
    );

    tokio::select! {
        () = bridge.run(updates) => {
            tracing::warn!("controller update stream ended, shutting down");
        }
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                tracing::warn!(%err, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down");
        }
    }

    refresher.abort();
    if let Some(server) = health_server {
        server.abort();
    }
    publisher.disconnect();
    mqtt_driver.abort();

    Ok(())
}
