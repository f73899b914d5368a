/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use mail_auth_check::{Authenticator, ErrorResponse};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// cargo run --example check_email -- billing@example.org bounces@example.org
#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mail_auth_check=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let from = args.next().unwrap_or_default();
    let return_path = args.next().unwrap_or_default();

    // Create an authenticator using Cloudflare DNS
    let authenticator = Authenticator::new_cloudflare_tls().unwrap();

    match authenticator.check_email(&from, &return_path).await {
        Ok(verdict) => println!("{}", serde_json::to_string_pretty(&verdict).unwrap()),
        Err(err) => {
            eprintln!(
                "{} {}",
                err.status_code(),
                serde_json::to_string(&ErrorResponse::from(&err)).unwrap()
            );
            std::process::exit(1);
        }
    }
}
