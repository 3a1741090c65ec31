//! Typed operations for the chantier resource.
//!
//! Wire form follows the API's conventions: camelCase field names,
//! snake_case status values, ISO dates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{HubClient, error::ClientError};

/// Collection endpoint for chantiers.
pub const CHANTIERS_PATH: &str = "/api/chantiers";

/// Lifecycle state of a chantier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChantierStatut {
    EnPreparation,
    EnCours,
    Receptionne,
    Archive,
}

impl ChantierStatut {
    /// Wire form of the status, as used in query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChantierStatut::EnPreparation => "en_preparation",
            ChantierStatut::EnCours => "en_cours",
            ChantierStatut::Receptionne => "receptionne",
            ChantierStatut::Archive => "archive",
        }
    }
}

impl std::fmt::Display for ChantierStatut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A construction site as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chantier {
    pub id: Uuid,
    pub nom: String,
    pub adresse: String,
    pub statut: ChantierStatut,
    pub date_debut: NaiveDate,
    pub date_fin: Option<NaiveDate>,
    /// Conducteur de travaux responsible for the site, if assigned.
    pub conducteur_id: Option<Uuid>,
}

/// Payload for creating a chantier.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChantier {
    pub nom: String,
    pub adresse: String,
    pub statut: ChantierStatut,
    pub date_debut: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_fin: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conducteur_id: Option<Uuid>,
}

/// Partial update; absent fields are left unchanged by the server.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChantierUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adresse: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statut: Option<ChantierStatut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_fin: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conducteur_id: Option<Uuid>,
}

/// Listing filter; unset fields are left to server defaults.
#[derive(Debug, Clone, Default)]
pub struct ChantierFilter {
    pub statut: Option<ChantierStatut>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ChantierFilter {
    /// Query-string form, empty when nothing is set.
    fn query(&self) -> String {
        let mut pairs = Vec::new();
        if let Some(statut) = self.statut {
            pairs.push(format!("statut={statut}"));
        }
        if let Some(page) = self.page {
            pairs.push(format!("page={page}"));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(format!("perPage={per_page}"));
        }
        if pairs.is_empty() {
            String::new()
        } else {
            format!("?{}", pairs.join("&"))
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

impl HubClient {
    /// Lists chantiers matching `filter`.
    pub async fn list_chantiers(
        &self,
        filter: &ChantierFilter,
    ) -> Result<Page<Chantier>, ClientError> {
        let path = format!("{CHANTIERS_PATH}{}", filter.query());
        self.get_json(&path).await
    }

    /// Fetches one chantier by id.
    pub async fn get_chantier(&self, id: Uuid) -> Result<Chantier, ClientError> {
        self.get_json(&format!("{CHANTIERS_PATH}/{id}")).await
    }

    /// Creates a chantier.
    pub async fn create_chantier(&self, chantier: &NewChantier) -> Result<Chantier, ClientError> {
        self.post_json(CHANTIERS_PATH, chantier).await
    }

    /// Applies a partial update to a chantier.
    pub async fn update_chantier(
        &self,
        id: Uuid,
        update: &ChantierUpdate,
    ) -> Result<Chantier, ClientError> {
        self.put_json(&format!("{CHANTIERS_PATH}/{id}"), update).await
    }

    /// Deletes a chantier.
    pub async fn delete_chantier(&self, id: Uuid) -> Result<(), ClientError> {
        self.delete(&format!("{CHANTIERS_PATH}/{id}")).await
    }
}
