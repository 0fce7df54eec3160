use natgas_dash::{
    dashboard_config_from_env, dashboard_router, init_logging, log_app_bind, log_app_start,
    log_config_loaded, logging_config_from_env, DashboardState, EpiasClient,
};

const COMPONENT: &str = "dashboard_server";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_cfg = logging_config_from_env();
    init_logging(&logging_cfg)?;
    log_app_start(COMPONENT, &logging_cfg);

    let cfg = dashboard_config_from_env()?;
    log_config_loaded(COMPONENT, &cfg);

    // The blocking HTTP client owns its own runtime and must be created and
    // dropped outside the async server runtime.
    let client = EpiasClient::new(cfg.epias.base_url.clone(), cfg.epias.cas_url.clone())?;
    let state = DashboardState::new(client.clone()).with_ticket_prefill(cfg.epias.ticket.clone());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(cfg.bind_addr).await?;
        log_app_bind(COMPONENT, listener.local_addr()?);
        axum::serve(listener, dashboard_router(state)).await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    drop(runtime);
    drop(client);
    Ok(())
}
