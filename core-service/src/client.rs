//! The income-registration client façade.

use crate::error::{CoreError, Result};
use core_auth::{AuthApi, AuthError, CredentialStore, DeviceId, Profile};
use core_income::{IncomeApi, IncomeError, IncomePayload, IncomeRequest, Receipt};
use core_runtime::config::ClientConfig;
use core_runtime::logging::redact_if_sensitive;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

struct ClientInner {
    config: Arc<ClientConfig>,
    credentials: CredentialStore,
    auth_api: AuthApi,
    income_api: IncomeApi,
    /// Profile of the authenticated user. Never held across another await.
    profile: RwLock<Option<Profile>>,
    /// Serializes login and sign-out so the profile always matches the tokens
    session_gate: Mutex<()>,
}

/// Authenticated client for registering incomes.
///
/// Cheap to clone; clones share the same credentials, so any number of
/// tasks can submit concurrently through one login.
///
/// # Example
///
/// ```ignore
/// use core_income::{IncomeItem, IncomeRequest};
/// use core_runtime::ClientConfig;
/// use core_service::AuthClient;
///
/// let client = AuthClient::new(ClientConfig::builder().zone_offset("+03:00").build()?)?;
/// let profile = client.authenticate("79001234567", "password").await?;
///
/// let receipt = client
///     .submit(&IncomeRequest::new().with_item(IncomeItem::new("Consulting", 1, 1000.0)))
///     .await?;
/// println!("{}", receipt.print_url);
/// ```
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<ClientInner>,
}

impl AuthClient {
    /// Create an unauthenticated client with a freshly generated device id.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Config`] if the configuration is invalid
    /// - [`CoreError::Auth`] with [`AuthError::InvalidArgument`] if the device
    ///   id prefix is too long
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let device_id = DeviceId::generate(&config.device_id_prefix)?;
        let credentials =
            CredentialStore::new(config.clock.clone(), config.token_refresh_leeway)?;
        let config = Arc::new(config);

        debug!(device_id = %device_id, api_path = %config.api_path, "Client created");

        Ok(Self {
            inner: Arc::new(ClientInner {
                auth_api: AuthApi::new(config.clone(), device_id),
                income_api: IncomeApi::new(config.clone()),
                credentials,
                config,
                profile: RwLock::new(None),
                session_gate: Mutex::new(()),
            }),
        })
    }

    /// Identifier of this client instance, sent with every login and refresh
    pub fn device_id(&self) -> &DeviceId {
        self.inner.auth_api.device_id()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.credentials.is_authenticated().await
    }

    /// Profile returned by the last successful [`authenticate`](Self::authenticate)
    pub async fn profile(&self) -> Option<Profile> {
        self.inner.profile.read().await.clone()
    }

    /// Log in and keep the issued tokens for later submissions.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidState`] if the client is already authenticated;
    ///   call [`sign_out`](Self::sign_out) first
    /// - [`AuthError::AuthenticationFailed`] if the service rejected the login
    /// - [`AuthError::Transport`] if no response was received
    #[instrument(skip(self, username, password), fields(username = %redact_if_sensitive("username", username)))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Profile> {
        let _session = self.inner.session_gate.lock().await;
        if self.inner.credentials.is_authenticated().await {
            return Err(AuthError::InvalidState.into());
        }

        let session = self.inner.auth_api.login(username, password).await?;
        let profile = session.profile;

        // Published before the tokens so a submission never sees tokens without a tax id
        let previous = self
            .inner
            .profile
            .write()
            .await
            .replace(profile.clone());

        if let Err(err) = self.inner.credentials.initialize(session.credentials).await {
            *self.inner.profile.write().await = previous;
            return Err(err.into());
        }

        info!("Client authenticated");
        Ok(profile)
    }

    /// Forget the current tokens. In-flight submissions and logins finish first.
    pub async fn sign_out(&self) {
        let _session = self.inner.session_gate.lock().await;
        self.inner.credentials.reset().await;
        self.inner.profile.write().await.take();
        info!("Client signed out");
    }

    /// Register an income and return its receipt.
    ///
    /// An expired access token is refreshed first; concurrent submissions
    /// share that single refresh. The token stays leased until the service
    /// has answered, so it cannot be replaced mid-request.
    ///
    /// # Errors
    ///
    /// - [`IncomeError::InvalidRequest`] for an empty request or an amount
    ///   that cannot be represented (no network call is made)
    /// - [`AuthError::NotAuthenticated`] before [`authenticate`](Self::authenticate)
    /// - [`IncomeError::MissingTaxId`] if the login profile has no tax id
    ///   (checked before any refresh)
    /// - the refresh failure, if the token had expired and could not be renewed
    /// - [`IncomeError::RequestFailed`] / [`IncomeError::Transport`] from the
    ///   submission itself
    #[instrument(skip(self, request), fields(items = request.items().len()))]
    pub async fn submit(&self, request: &IncomeRequest) -> Result<Receipt> {
        let inner = &self.inner;
        let payload =
            IncomePayload::build(request, inner.config.clock.now(), inner.config.zone_offset)?;

        // The profile is published before the tokens and cleared after them
        let tax_id = match inner.profile.read().await.as_ref() {
            None => return Err(AuthError::NotAuthenticated.into()),
            Some(profile) => profile.tax_id().map(str::to_owned),
        }
        .ok_or(IncomeError::MissingTaxId)?;

        let lease = inner.credentials.get_valid_token(&inner.auth_api).await?;

        let receipt = inner
            .income_api
            .register(lease.access_token(), &payload, &tax_id)
            .await;
        drop(lease);

        Ok(receipt?)
    }

    /// Run [`submit`](Self::submit) on the ambient Tokio runtime.
    ///
    /// The returned handle resolves to the same result `submit` would have
    /// produced. Dropping the handle does not cancel the submission; call
    /// [`SubmitHandle::abort`] for that.
    ///
    /// # Errors
    ///
    /// [`CoreError::TaskFailed`] when called outside a Tokio runtime.
    pub fn submit_async(&self, request: IncomeRequest) -> Result<SubmitHandle> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| CoreError::TaskFailed(format!("no Tokio runtime available: {}", e)))?;

        let client = self.clone();
        let task = runtime.spawn(async move { client.submit(&request).await });
        Ok(SubmitHandle { task })
    }
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("device_id", self.device_id())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Pending result of [`AuthClient::submit_async`].
#[derive(Debug)]
pub struct SubmitHandle {
    task: JoinHandle<Result<Receipt>>,
}

impl SubmitHandle {
    /// Cancel the submission. The client's credentials stay consistent; the
    /// handle then resolves to [`CoreError::TaskFailed`].
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Future for SubmitHandle {
    type Output = Result<Receipt>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.task).poll(cx).map(|joined| match joined {
            Ok(outcome) => outcome,
            Err(err) if err.is_cancelled() => {
                Err(CoreError::TaskFailed("submission was cancelled".to_string()))
            }
            Err(err) => Err(CoreError::TaskFailed(err.to_string())),
        })
    }
}
