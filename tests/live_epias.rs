#![cfg(feature = "live-epias-tests")]

use natgas_dash::{
    epias_config_from_env, market_today, plan_query, resolve, ClientError, EpiasClient, Ticket,
};

fn live_client() -> (EpiasClient, Ticket) {
    let cfg = epias_config_from_env();
    let client = EpiasClient::new(cfg.base_url.clone(), cfg.cas_url.clone())
        .expect("HTTP client should build");
    let ticket = match (&cfg.ticket, cfg.credentials()) {
        (Some(raw), _) => Ticket::parse(raw).expect("EPIAS_TGT should be a TGT- ticket"),
        (None, Some((username, password))) => client
            .fetch_ticket(username, password)
            .expect("CAS should issue a ticket"),
        (None, None) => panic!("live tests need EPIAS_TGT or EPIAS_USERNAME/EPIAS_PASSWORD"),
    };
    (client, ticket)
}

#[test]
fn live_sgp_price_returns_sorted_gas_days() {
    let (client, ticket) = live_client();
    let dataset = resolve("SGP Price").expect("dataset exists");
    let params = plan_query(dataset, None, None, None, market_today()).expect("default range");

    let table = client
        .execute(dataset, &ticket, &params)
        .expect("live query should succeed");
    assert!(!table.is_empty());

    let idx = table
        .column_index(table.first_date_column().expect("a date column"))
        .expect("column index");
    let days: Vec<_> = table.column_cells(idx).filter_map(|cell| cell.as_date()).collect();
    assert!(days.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn live_market_participants_need_no_dates() {
    let (client, ticket) = live_client();
    let dataset = resolve("market-participant").expect("dataset exists");
    let params = plan_query(dataset, None, None, None, market_today()).expect("no-param plan");

    let table = client
        .execute(dataset, &ticket, &params)
        .expect("live query should succeed");
    assert!(table.len() > 10);
}

#[test]
fn live_invalid_ticket_is_rejected_with_status() {
    let (client, _) = live_client();
    let bogus = Ticket::parse("TGT-0-not-a-real-ticket").expect("prefix is valid");
    let dataset = resolve("SGP Price").expect("dataset exists");
    let params = plan_query(dataset, None, None, None, market_today()).expect("default range");

    let err = client
        .execute(dataset, &bogus, &params)
        .expect_err("bogus ticket should fail");
    assert!(matches!(err, ClientError::Status { .. }), "{err}");
}
