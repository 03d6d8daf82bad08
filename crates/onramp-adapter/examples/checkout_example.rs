/*
[INPUT]:  CDP key pair from the environment, destination wallet address
[OUTPUT]: One-time hosted checkout URL printed to stdout
[POS]:    Examples - session token + checkout URL demonstration
[UPDATE]: When the session or checkout flow changes
*/

use onramp_adapter::*;

/// Example: session token and checkout URL
///
/// 1. Load CDP credentials (CDP_API_KEY_ID / CDP_API_KEY_SECRET)
/// 2. Request a session token for one address
/// 3. Build the hosted checkout URL
#[tokio::main]
async fn main() {
    println!("=== Onramp Checkout Example ===\n");

    let credentials = match CdpCredentials::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load credentials: {}", e);
            return;
        }
    };

    let client = match OnrampClient::new(&credentials) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };
    println!("✓ HTTP client created");

    let address = std::env::var("ONRAMP_WALLET_ADDRESS")
        .unwrap_or_else(|_| "0x0000000000000000000000000000000000000000".to_string());
    let request = SessionTokenRequest::new(vec![Address::new(address, ["base"])]).with_assets(["USDC"]);

    let session = match client.create_session_token(&request).await {
        Ok(token) => token,
        Err(e) => {
            eprintln!("Session token request failed: {}", e);
            return;
        }
    };
    println!("✓ Session token issued (expires {})", session.expires_at());

    let tracking = TrackingId::generate("example");
    let options = CheckoutOptions {
        default_network: Some("base".to_string()),
        default_asset: Some("USDC".to_string()),
        fiat_currency: Some("USD".to_string()),
        ..CheckoutOptions::default()
    }
    .with_tracking_id(&tracking);

    match build_checkout_url(session, &options) {
        Ok(url) => {
            println!("✓ Tracking id: {}", tracking);
            println!("\n{}", url);
        }
        Err(e) => eprintln!("Failed to build checkout URL: {}", e),
    }
}
