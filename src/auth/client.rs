//! Auth sub-client: authorize the session, read the account profile.

use crate::auth::{Account, AuthorizeResponse};
use crate::client::DerivClient;
use crate::error::{DerivError, WsError};
use crate::ws::MessageOut;

/// Sub-client for authentication operations.
pub struct Auth<'a> {
    pub(crate) client: &'a DerivClient,
}

impl<'a> Auth<'a> {
    /// Send `authorize` with the client's token and store the returned account.
    ///
    /// Called once by `DerivClientBuilder::connect()`. The WS layer remembers
    /// the request and replays it on every reconnect, so callers only need
    /// this again to refresh the cached [`Account`].
    ///
    /// On failure the cached account is cleared.
    pub async fn authorize(&self) -> Result<Account, DerivError> {
        match self.request_account().await {
            Ok(account) => {
                tracing::info!(
                    loginid = %account.loginid,
                    is_virtual = account.is_virtual,
                    "Authorized"
                );
                *self.client.account.write().await = Some(account.clone());
                Ok(account)
            }
            Err(e) => {
                tracing::error!("Authorization failed: {}", e);
                *self.client.account.write().await = None;
                Err(e)
            }
        }
    }

    async fn request_account(&self) -> Result<Account, DerivError> {
        let msg = MessageOut::authorize(self.client.credentials.token());
        let response = self.client.ws.request(msg).await?.into_result()?;
        if response.msg_type != "authorize" {
            return Err(WsError::ProtocolError(format!(
                "expected authorize response, got '{}'",
                response.msg_type
            ))
            .into());
        }
        let body: AuthorizeResponse = response.decode()?;
        Ok(body.authorize)
    }

    /// The account returned by the last successful `authorize`.
    pub async fn account(&self) -> Option<Account> {
        self.client.account.read().await.clone()
    }

    /// Whether the last `authorize` succeeded.
    pub async fn is_authorized(&self) -> bool {
        self.client.account.read().await.is_some()
    }
}
