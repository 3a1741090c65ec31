//! Command implementations.

pub mod chantiers;
pub mod health;
pub mod login;
pub mod whoami;

use std::time::Duration;

use chantier_hub::{
    AuthSession, HubClient,
    auth::{Credentials, CurrentUser},
    client::ClientError,
};

use crate::cli::{CredentialArgs, ServerArgs};

/// Builds a client from the shared connection settings.
fn build_client(server: &ServerArgs) -> Result<HubClient, ClientError> {
    HubClient::builder(&server.url)
        .timeout(Duration::from_secs(server.timeout))
        .build()
}

/// Runs `operation` inside a one-shot session: log in, run, log out.
///
/// Invalid credentials are reported on stderr and terminate the process.
async fn with_session<T, Fut>(
    server: &ServerArgs,
    credentials: &CredentialArgs,
    operation: impl FnOnce(HubClient, CurrentUser) -> Fut,
) -> Result<T, Box<dyn std::error::Error>>
where
    Fut: Future<Output = Result<T, chantier_hub::Error>>,
{
    let client = build_client(server)?;
    let session = AuthSession::new(client.clone());
    let user = match session
        .login(&Credentials::new(&credentials.email, &credentials.password))
        .await
    {
        Ok(user) => user,
        Err(e) if e.is_invalid_credentials() => {
            eprintln!("login failed: invalid credentials for {}", credentials.email);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let result = operation(client, user).await;
    session.logout().await;
    Ok(result?)
}
