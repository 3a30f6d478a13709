//! Users service: profiles, administration and roles.
//!
//! Listing endpoints prefer the href discovered on the API root (the backend
//! only publishes them to roles allowed to call them) and fall back to the
//! well-known path.

use serde::de::IgnoredAny;

use crate::discovery::HateoasClient;
use crate::models::users::{
    ProfileUpdate, Role, RoleCollection, RoleInfo, StatusUpdate, User, UserCollection,
    UserStatistics, UserStatus,
};
use crate::transport::{ApiResult, RequestOptions};

const USERS_PATH: &str = "/api/usuarios";
const ROLES_PATH: &str = "/api/roles";

#[derive(Debug, Clone)]
pub struct UsersService {
    api: HateoasClient,
}

impl UsersService {
    pub fn new(api: HateoasClient) -> Self {
        Self { api }
    }

    fn discovered_or(&self, rel: &str, fallback: &str) -> String {
        self.api
            .get_link(rel)
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Profile of the signed-in user.
    pub async fn me(&self) -> ApiResult<User> {
        self.api
            .transport()
            .get(&format!("{USERS_PATH}/me"), RequestOptions::default())
            .await
    }

    pub async fn update_my_profile(&self, update: &ProfileUpdate) -> ApiResult<()> {
        let response = self
            .api
            .transport()
            .post::<IgnoredAny, _>(
                &format!("{USERS_PATH}/onboarding"),
                update,
                RequestOptions::default(),
            )
            .await?;
        Ok(response.discard())
    }

    pub async fn list_all(&self) -> ApiResult<UserCollection> {
        let url = self.discovered_or("usuarios", USERS_PATH);
        self.api.transport().get(&url, RequestOptions::default()).await
    }

    pub async fn get_by_id(&self, id: u64) -> ApiResult<User> {
        self.api
            .transport()
            .get(&format!("{USERS_PATH}/{id}"), RequestOptions::default())
            .await
    }

    /// Search by name or email.
    pub async fn search(&self, query: &str) -> ApiResult<UserCollection> {
        let url = format!("{USERS_PATH}/busqueda?q={}", urlencoding::encode(query));
        self.api.transport().get(&url, RequestOptions::default()).await
    }

    pub async fn list_leaders(&self) -> ApiResult<UserCollection> {
        let url = self.discovered_or("dirigentes", "/api/usuarios/dirigentes");
        self.api.transport().get(&url, RequestOptions::default()).await
    }

    pub async fn list_campers(&self) -> ApiResult<UserCollection> {
        let url = self.discovered_or("acampantes", "/api/usuarios/acampantes");
        self.api.transport().get(&url, RequestOptions::default()).await
    }

    pub async fn list_by_role(&self, role: Role) -> ApiResult<UserCollection> {
        let url = format!("{USERS_PATH}/por-rol/{}", role.as_str());
        self.api.transport().get(&url, RequestOptions::default()).await
    }

    pub async fn statistics(&self) -> ApiResult<UserStatistics> {
        let url = self.discovered_or("estadisticas-usuarios", "/api/usuarios/estadisticas");
        self.api.transport().get(&url, RequestOptions::default()).await
    }

    pub async fn assign_role(&self, user_id: u64, role: Role) -> ApiResult<User> {
        let url = format!("{USERS_PATH}/{user_id}/roles/{}", role.as_str());
        self.api
            .transport()
            .request(reqwest::Method::POST, &url, None, RequestOptions::default())
            .await
    }

    pub async fn remove_role(&self, user_id: u64, role: Role) -> ApiResult<()> {
        let url = format!("{USERS_PATH}/{user_id}/roles/{}", role.as_str());
        let response = self
            .api
            .transport()
            .delete::<IgnoredAny>(&url, RequestOptions::default())
            .await?;
        Ok(response.discard())
    }

    pub async fn update_status(&self, user_id: u64, status: UserStatus) -> ApiResult<User> {
        self.api
            .transport()
            .patch(
                &format!("{USERS_PATH}/{user_id}/estado"),
                &StatusUpdate { status },
                RequestOptions::default(),
            )
            .await
    }

    pub async fn update_user(&self, user_id: u64, update: &ProfileUpdate) -> ApiResult<User> {
        self.api
            .transport()
            .patch(
                &format!("{USERS_PATH}/{user_id}"),
                update,
                RequestOptions::default(),
            )
            .await
    }

    pub async fn list_roles(&self) -> ApiResult<RoleCollection> {
        let url = self.discovered_or("roles", ROLES_PATH);
        self.api.transport().get(&url, RequestOptions::default()).await
    }

    pub async fn get_role(&self, role: Role) -> ApiResult<RoleInfo> {
        self.api
            .transport()
            .get(&format!("{ROLES_PATH}/{}", role.as_str()), RequestOptions::default())
            .await
    }

    pub fn extract_users(collection: &UserCollection) -> Vec<User> {
        collection.items().to_vec()
    }

    pub fn extract_roles(collection: &RoleCollection) -> Vec<RoleInfo> {
        collection.items().to_vec()
    }
}
