use serde::{Deserialize, Serialize};

/// The authenticated user's identity record, as returned by the backend
/// under `utilisateur` and persisted alongside the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(rename = "nom", default)]
    pub name: String,
    #[serde(rename = "prenom", default)]
    pub surname: String,
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(rename = "entite_id", default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<u64>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl User {
    /// "Prenom Nom", or whichever half is present.
    pub fn full_name(&self) -> String {
        match (self.surname.is_empty(), self.name.is_empty()) {
            (false, false) => format!("{} {}", self.surname, self.name),
            (false, true) => self.surname.clone(),
            (true, false) => self.name.clone(),
            (true, true) => self.email.clone(),
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}
