//! Pet models.

use serde::{Deserialize, Serialize};

/// A pet belonging to a pet owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pet {
    /// Unique pet ID
    pub id: String,
    /// Owning profile ID
    pub owner_id: String,
    pub name: String,
    /// Species (e.g., "dog", "cat")
    pub species: String,
    pub breed: Option<String>,
    pub age_years: Option<u32>,
    pub weight_kg: Option<f64>,
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Pet {
    /// Create a new pet with required fields.
    pub fn new(owner_id: String, name: String, species: String) -> Self {
        let now = super::now_timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id,
            name,
            species,
            breed: None,
            age_years: None,
            weight_kg: None,
            notes: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
