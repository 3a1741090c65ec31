//! Whoami command - asks the server who the session cookie belongs to.

use chantier_hub::{AuthSession, auth::AuthError};

use crate::cli::{CredentialArgs, ServerArgs};
use crate::commands::with_session;
use crate::output;

/// Run the whoami command
///
/// Unlike `login`, this round-trips the freshly issued session cookie
/// through `/api/auth/me`, so it also verifies cookie handling.
pub async fn run(
    server: &ServerArgs,
    args: &CredentialArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = with_session(server, args, |client, _user| async move {
        let probe = AuthSession::new(client);
        match probe.bootstrap().await? {
            Some(user) => Ok(user),
            None => Err(AuthError::NotAuthenticated.into()),
        }
    })
    .await?;
    output::print_user(&user);
    Ok(())
}
