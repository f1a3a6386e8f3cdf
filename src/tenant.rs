// tenant.rs
// Tenant scope and language extractors. The gateway in front of this service
// authenticates the caller and forwards the owning admin id in `X-Admin-Id`.

use std::{str::FromStr, sync::Arc};

use axum::{
    extract::FromRequestParts,
    http::{header::ACCEPT_LANGUAGE, request::Parts},
};
use mongodb::bson::{Document, doc, oid::ObjectId};

use crate::{error::AppError, messages::Lang, state::AppState};

pub const TENANT_HEADER: &str = "x-admin-id";

/// The admin account whose data a request may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantScope(ObjectId);

impl TenantScope {
    pub fn new(admin_id: ObjectId) -> Self {
        TenantScope(admin_id)
    }

    pub fn admin_id(&self) -> ObjectId {
        self.0
    }

    /// `extra` narrowed to this tenant.
    pub fn filter(&self, extra: Document) -> Document {
        let mut filter = doc! { "adminId": self.0 };
        filter.extend(extra);
        filter
    }
}

impl<S> FromRequestParts<S> for TenantScope
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(AppError::Unauthorized)?;

        ObjectId::from_str(raw)
            .map(TenantScope)
            .map_err(|_| AppError::BadRequest(format!("invalid {TENANT_HEADER} header")))
    }
}

/// Response language, from `Accept-Language` or the configured default.
#[derive(Debug, Clone, Copy)]
pub struct Language(pub Lang);

impl FromRequestParts<Arc<AppState>> for Language {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let lang = parts
            .headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .and_then(Lang::from_accept_language)
            .unwrap_or(state.default_language);
        Ok(Language(lang))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_always_carries_admin_id() {
        let admin = ObjectId::new();
        let scope = TenantScope::new(admin);
        let filter = scope.filter(doc! { "isActive": true });
        assert_eq!(filter.get_object_id("adminId").unwrap(), admin);
        assert!(filter.get_bool("isActive").unwrap());
    }
}
