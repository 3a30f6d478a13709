//! Users, roles and profile updates

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{Collection, LinkMap, impl_linked, timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "DIRIGENTE")]
    Leader,
    #[serde(rename = "ACAMPANTE")]
    Camper,
    #[serde(rename = "PADRE")]
    Parent,
}

impl Role {
    /// Wire name, as used in paths like `/api/usuarios/{id}/roles/{rol}`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Leader => "DIRIGENTE",
            Self::Camper => "ACAMPANTE",
            Self::Parent => "PADRE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserStatus {
    #[serde(rename = "ACTIVO")]
    Active,
    #[serde(rename = "INACTIVO")]
    Inactive,
    #[serde(rename = "PENDIENTE")]
    Pending,
    #[serde(rename = "SUSPENDIDO")]
    Suspended,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(rename = "firebaseUid", default, skip_serializing_if = "Option::is_none")]
    pub identity_uid: Option<String>,
    pub email: String,
    #[serde(rename = "nombreMostrar", default)]
    pub display_name: String,
    #[serde(rename = "urlFoto", default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(rename = "emailVerificado", default)]
    pub email_verified: bool,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(rename = "estado")]
    pub status: UserStatus,
    #[serde(
        rename = "fechaCreacion",
        default,
        deserialize_with = "timestamp::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<NaiveDateTime>,
    #[serde(
        rename = "ultimoLogin",
        default,
        deserialize_with = "timestamp::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_login: Option<NaiveDateTime>,
    #[serde(rename = "telefono", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dni: Option<String>,
    #[serde(rename = "fechaNacimiento", default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "direccion", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "localidad", default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(rename = "grupoSanguineo", default, skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,
    #[serde(rename = "factorRh", default, skip_serializing_if = "Option::is_none")]
    pub rh_factor: Option<String>,
    #[serde(rename = "perfilCompleto", default)]
    pub profile_complete: bool,
    #[serde(rename = "_links", default, skip_serializing_if = "HashMap::is_empty")]
    pub links: LinkMap,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// First word of the display name, for greetings.
    pub fn first_name(&self) -> &str {
        self.display_name
            .split_whitespace()
            .next()
            .unwrap_or("Usuario")
    }
}

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(rename = "nombreMostrar", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "telefono", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dni: Option<String>,
    #[serde(rename = "fechaNacimiento", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "direccion", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "localidad", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(rename = "grupoSanguineo", skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,
    #[serde(rename = "factorRh", skip_serializing_if = "Option::is_none")]
    pub rh_factor: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct StatusUpdate {
    #[serde(rename = "estado")]
    pub status: UserStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStatistics {
    #[serde(rename = "totalUsuarios")]
    pub total: u64,
    #[serde(rename = "totalActivos")]
    pub active: u64,
    #[serde(rename = "totalInactivos")]
    pub inactive: u64,
    #[serde(rename = "totalPendientes")]
    pub pending: u64,
    #[serde(rename = "totalAdmins")]
    pub admins: u64,
    #[serde(rename = "totalDirigentes")]
    pub leaders: u64,
    #[serde(rename = "totalAcampantes")]
    pub campers: u64,
    #[serde(rename = "totalPadres")]
    pub parents: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleInfo {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "_links", default, skip_serializing_if = "HashMap::is_empty")]
    pub links: LinkMap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DeviceTokenRequest {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl_linked!(User, RoleInfo);

pub type UserCollection = Collection<User>;
pub type RoleCollection = Collection<RoleInfo>;
