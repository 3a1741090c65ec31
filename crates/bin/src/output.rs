//! Terminal output formatting.

use chantier_hub::{
    auth::{CurrentUser, UserRole},
    client::Chantier,
};
use chrono::NaiveDate;

/// Print one user as `prenom nom <email> (role)`.
pub fn print_user(user: &CurrentUser) {
    println!(
        "{} {} <{}> ({})",
        user.prenom,
        user.nom,
        user.email,
        role_label(user.role)
    );
}

/// Print chantiers as an aligned table.
pub fn print_chantier_table(chantiers: &[Chantier]) {
    if chantiers.is_empty() {
        println!("aucun chantier");
        return;
    }

    let mut nom_width = "NOM".len();
    let mut statut_width = "STATUT".len();
    for chantier in chantiers {
        nom_width = nom_width.max(chantier.nom.len());
        statut_width = statut_width.max(chantier.statut.as_str().len());
    }

    println!(
        "{:<36}  {:<nom_width$}  {:<statut_width$}  {:<10}  ADRESSE",
        "ID", "NOM", "STATUT", "DEBUT",
    );
    for chantier in chantiers {
        println!(
            "{:<36}  {:<nom_width$}  {:<statut_width$}  {:<10}  {}",
            chantier.id,
            chantier.nom,
            chantier.statut.as_str(),
            chantier.date_debut,
            chantier.adresse,
        );
    }
}

/// Print every field of one chantier, one per line.
pub fn print_chantier_detail(chantier: &Chantier) {
    println!("id:         {}", chantier.id);
    println!("nom:        {}", chantier.nom);
    println!("adresse:    {}", chantier.adresse);
    println!("statut:     {}", chantier.statut);
    println!("debut:      {}", chantier.date_debut);
    println!("fin:        {}", format_date(chantier.date_fin));
    println!(
        "conducteur: {}",
        chantier
            .conducteur_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

fn role_label(role: UserRole) -> &'static str {
    match role {
        UserRole::Admin => "admin",
        UserRole::ConducteurTravaux => "conducteur de travaux",
        UserRole::ChefChantier => "chef de chantier",
        UserRole::Compagnon => "compagnon",
    }
}
