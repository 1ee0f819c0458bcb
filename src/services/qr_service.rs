use std::path::PathBuf;
use std::sync::Arc;

use qrcode::render::svg;
use qrcode::QrCode;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::TokenService;
use crate::database::models::QrCodeRegistry;
use crate::database::{Statement, Store};

use super::session_service::{Session, SessionService};
use super::ServiceError;

/// Subdirectory of the public directory holding rendered codes.
pub const QR_DIR: &str = "qr";

#[derive(Debug, Clone, Serialize)]
pub struct QrTicket {
    pub xid: String,
    pub link: String,
}

pub struct QrService {
    store: Arc<dyn Store>,
    tokens: Arc<TokenService>,
    public_base_url: String,
    public_dir: PathBuf,
}

impl QrService {
    pub fn new(
        store: Arc<dyn Store>,
        tokens: Arc<TokenService>,
        public_base_url: impl Into<String>,
        public_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            tokens,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            public_dir: public_dir.into(),
        }
    }

    pub fn login_url(&self, xid: &str) -> String {
        format!("{}/api/login/with-qr/{}", self.public_base_url, xid)
    }

    /// Registers a one-time ticket for `user_id` and renders it as an SVG
    /// served under `/api/public/qr/`.
    pub async fn generate(&self, user_id: i64) -> Result<QrTicket, ServiceError> {
        let xid = Uuid::new_v4().simple().to_string();

        let image = QrCode::new(self.login_url(&xid).as_bytes())
            .map_err(|e| ServiceError::Internal(format!("QR encoding failed: {}", e)))?
            .render::<svg::Color>()
            .min_dimensions(256, 256)
            .build();

        let dir = self.public_dir.join(QR_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ServiceError::Internal(format!("cannot create {}: {}", dir.display(), e)))?;
        let file = dir.join(format!("{}.svg", xid));
        tokio::fs::write(&file, image)
            .await
            .map_err(|e| ServiceError::Internal(format!("cannot write {}: {}", file.display(), e)))?;

        let registry = QrCodeRegistry {
            user_id,
            xid: xid.clone(),
            is_used: false,
            ..Default::default()
        };
        if let Err(e) = self.store.insert_entity(&registry).await {
            // No registry row means no way to redeem; drop the image too
            if let Err(io) = tokio::fs::remove_file(&file).await {
                warn!("Could not remove orphan QR image {}: {}", file.display(), io);
            }
            return Err(e.into());
        }
        info!("Generated QR ticket {} for user {}", xid, user_id);

        Ok(QrTicket {
            link: format!("{}/api/public/{}/{}.svg", self.public_base_url, QR_DIR, xid),
            xid,
        })
    }

    /// Flips the ticket to used and signs a session for its owner. Only one
    /// caller can win the flip; every other attempt gets `AlreadyUsed`.
    pub async fn redeem(&self, xid: &str) -> Result<Session, ServiceError> {
        let stmt = Statement::new(
            "SELECT * FROM \"qr_code_registry\" WHERE \"xid\" = $1 AND \"deleted_at\" IS NULL LIMIT 1",
        )
        .bind(xid);
        let registry = self
            .store
            .fetch_optional_as::<QrCodeRegistry>(stmt)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Unknown QR code".to_string()))?;

        if registry.is_used {
            return Err(ServiceError::AlreadyUsed("QR code".to_string()));
        }

        let claim = Statement::new(
            "UPDATE \"qr_code_registry\" SET \"is_used\" = TRUE WHERE \"id\" = $1 AND \"is_used\" = FALSE",
        )
        .bind(registry.id);
        if self.store.execute(claim).await? == 0 {
            warn!("QR ticket {} lost a concurrent redemption", xid);
            return Err(ServiceError::AlreadyUsed("QR code".to_string()));
        }

        info!("QR ticket {} redeemed for user {}", xid, registry.user_id);
        SessionService::new(self.store.clone(), self.tokens.clone())
            .issue_for(registry.user_id)
            .await
    }
}
