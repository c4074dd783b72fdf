use campuscard_http::CampusCardClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = CampusCardClient::from_env()
        .map_err(anyhow::Error::msg)?
        .with_notifier(|message| eprintln!("!! {message}"));

    client.start_heartbeat();

    let pong = client.ping().await?;
    println!("service alive (t={})", pong.timestamp);

    let outcome = client.query_lost_card("20230101").await?;
    println!("{:?}: {}", outcome.status, outcome.message);
    for card in &outcome.unmatched_cards {
        println!(
            "  notice #{}: {} found at {} ({})",
            card.card_id,
            card.masked_info,
            card.found_location.as_deref().unwrap_or("unknown"),
            card.handler_text,
        );
    }

    let hot = client.hot_locations().await?;
    for entry in &hot.locations {
        println!("{}: {} cards ({}%)", entry.location, entry.count, entry.percentage);
    }

    client.stop_heartbeat();
    Ok(())
}
