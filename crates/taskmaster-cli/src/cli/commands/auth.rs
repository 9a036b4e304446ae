//! Login, registration and session commands.

use anyhow::Result;
use taskmaster_core::auth::AuthGateway;
use taskmaster_core::http::HttpClient;

use super::{report, report_credentials};

pub async fn login(client: HttpClient, email: &str, password: &str) -> Result<()> {
    let session = AuthGateway::new(client)
        .login(email, password)
        .await
        .map_err(report_credentials)?;
    println!("Logged in as {}", session.user.display_name());
    Ok(())
}

pub async fn register(client: HttpClient, email: &str, password: &str, name: &str) -> Result<()> {
    let session = AuthGateway::new(client)
        .register(email, password, name)
        .await
        .map_err(report_credentials)?;
    println!(
        "Registered and logged in as {}",
        session.user.display_name()
    );
    Ok(())
}

pub fn logout(client: HttpClient) -> Result<()> {
    AuthGateway::new(client).logout().map_err(report)?;
    println!("Logged out");
    Ok(())
}

pub fn whoami(client: &HttpClient) {
    match client.store().get() {
        Some(session) => println!(
            "{} <{}> (id {})",
            session.user.display_name(),
            session.user.email,
            session.user.id
        ),
        None => println!("Not logged in."),
    }
}
