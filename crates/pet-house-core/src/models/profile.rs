//! User profiles and roles.

use serde::{Deserialize, Serialize};

/// The sole authorization dimension of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    PetOwner,
    Vet,
    Staff,
}

impl Role {
    /// Database string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::PetOwner => "pet_owner",
            Role::Vet => "vet",
            Role::Staff => "staff",
        }
    }

    /// Parse from database string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "pet_owner" => Some(Role::PetOwner),
            "vet" => Some(Role::Vet),
            "staff" => Some(Role::Staff),
            _ => None,
        }
    }

    /// Staff and admins run the front desk and the boarding floor.
    pub fn is_staff_or_admin(self) -> bool {
        matches!(self, Role::Staff | Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user profile row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    /// Auth service user id
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl UserProfile {
    /// Create a profile for a freshly signed-up auth user.
    pub fn new(id: String, email: String, full_name: String, role: Role) -> Self {
        let now = super::now_timestamp();
        Self {
            id,
            email,
            full_name,
            role,
            phone: None,
            address: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Profile counts shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCounts {
    pub admins: usize,
    pub staff: usize,
    pub vets: usize,
    pub pet_owners: usize,
}

impl RoleCounts {
    /// Tally roles over a profile list.
    pub fn tally<'a>(profiles: impl IntoIterator<Item = &'a UserProfile>) -> Self {
        let mut counts = Self::default();
        for profile in profiles {
            match profile.role {
                Role::Admin => counts.admins += 1,
                Role::Staff => counts.staff += 1,
                Role::Vet => counts.vets += 1,
                Role::PetOwner => counts.pet_owners += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.admins + self.staff + self.vets + self.pet_owners
    }
}
