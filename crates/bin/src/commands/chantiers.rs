//! Chantier inspection commands.

use chantier_hub::client::ChantierFilter;

use crate::cli::{ChantiersArgs, ChantiersCommand, ServerArgs};
use crate::commands::with_session;
use crate::output;

/// Run a chantiers subcommand
pub async fn run(
    server: &ServerArgs,
    args: &ChantiersArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    match &args.command {
        ChantiersCommand::List(list) => {
            let filter = ChantierFilter {
                statut: list.statut,
                page: list.page,
                per_page: list.per_page,
            };
            let page = with_session(server, &args.credentials, |client, _user| async move {
                Ok(client.list_chantiers(&filter).await?)
            })
            .await?;

            output::print_chantier_table(&page.items);
            if page.total > page.items.len() as u64 {
                println!("({} sur {} chantiers)", page.items.len(), page.total);
            }
            Ok(())
        }
        ChantiersCommand::Show(show) => {
            let id = show.id;
            let chantier = with_session(server, &args.credentials, |client, _user| async move {
                Ok(client.get_chantier(id).await?)
            })
            .await?;

            output::print_chantier_detail(&chantier);
            Ok(())
        }
    }
}
