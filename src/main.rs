use std::net::SocketAddr;

use dotenvy::dotenv;
use tracing::info;

use gymdesk::infra::{
    app::create_app,
    setup::{init_app_state, init_tracing},
    workers::{run_reminder_loop, run_snapshot_audit_loop},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let app_state = init_app_state().await?;

    // Read config before moving app_state
    let bind_addr = app_state.config.bind_addr;

    if let Some(reminders) = app_state.reminder_use_cases.clone() {
        tokio::spawn(run_reminder_loop(
            reminders,
            app_state.config.reminder_poll_secs,
        ));
    }
    tokio::spawn(run_snapshot_audit_loop(
        app_state.client_use_cases.clone(),
        app_state.config.snapshot_audit_secs,
    ));

    let app = create_app(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Backend listening at {}", &listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
