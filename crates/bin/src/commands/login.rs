//! Credential check command.

use crate::cli::{CredentialArgs, ServerArgs};
use crate::commands::with_session;
use crate::output;

/// Run the login command
pub async fn run(
    server: &ServerArgs,
    args: &CredentialArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = with_session(server, args, |_client, user| async move { Ok(user) }).await?;
    output::print_user(&user);
    Ok(())
}
