use crate::classify::{classify, denial_in_success_body, rejection_in_success_body};
use async_trait::async_trait;
use autoliq_core::risk::entity::{Account, AccountId, RiskSettings, RiskSettingsUpdate, UpdateReply};
use autoliq_core::risk::error::DownstreamError;
use autoliq_core::risk::port::{AutoLiqApi, ClientFactory};
use autoliq_core::store::port::DelegatedCredential;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// 所有者视角的风控参数
pub const OWNER_ITEM_PATH: &str = "userAccountAutoLiq/item";
/// 授权方视角的风控参数
pub const PERMISSIONED_ITEM_PATH: &str = "permissionedAccountAutoLiq/item";
/// 新建或更新风控参数
pub const UPDATE_PATH: &str = "userAccountAutoLiq/createOrUpdate";
/// 账户列表
pub const ACCOUNT_LIST_PATH: &str = "account/list";

/// # Summary
/// 基于共享连接池的授权客户端工厂。
///
/// # Invariants
/// - 内部 `reqwest::Client` 跨请求复用；凭据只存在于每次 `connect` 产出的客户端中。
#[derive(Clone)]
pub struct HttpClientFactory {
    http: Client,
}

impl HttpClientFactory {
    /// # Summary
    /// 创建工厂并初始化 HTTP 客户端。
    ///
    /// # Logic
    /// 1. 安装 rustls 的 ring 加密后端 (已安装则忽略)。
    /// 2. 按需设置请求超时；未配置时沿用 reqwest 默认行为。
    ///
    /// # Arguments
    /// * `timeout`: 可选的单次请求超时。
    ///
    /// # Returns
    /// 初始化后的工厂，或 `Transport` 错误。
    pub fn new(timeout: Option<Duration>) -> Result<Self, DownstreamError> {
        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            debug!("rustls crypto provider already installed");
        }

        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let http = builder
            .build()
            .map_err(|e| DownstreamError::Transport(e.to_string()))?;
        Ok(Self { http })
    }
}

impl ClientFactory for HttpClientFactory {
    fn connect(&self, credential: DelegatedCredential) -> Arc<dyn AutoLiqApi> {
        Arc::new(AuthorizedClient::new(self.http.clone(), credential))
    }
}

/// # Summary
/// 绑定单个委托凭据的下游 API 客户端。
///
/// # Invariants
/// - 每个请求一个实例，不跨请求共享、不缓存。
/// - 每次调用要么返回解析后的载荷，要么返回 `DownstreamError`；不重试。
pub struct AuthorizedClient {
    http: Client,
    credential: DelegatedCredential,
}

/// 2xx 响应体中 `errorText` 的解释方式
#[derive(Clone, Copy)]
enum BodyCheck {
    /// 读接口：任何错误文本都视为失败
    Strict,
    /// 写接口：只有拒绝文案视为失败，其余交给调用方
    DenialOnly,
}

/// 写入接口请求体
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBody<'a> {
    account_id: AccountId,
    #[serde(flatten)]
    fields: &'a RiskSettingsUpdate,
}

impl AuthorizedClient {
    pub fn new(http: Client, credential: DelegatedCredential) -> Self {
        Self { http, credential }
    }

    pub fn base_url(&self) -> &str {
        &self.credential.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.credential.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// # Summary
    /// 以委托凭据发起 GET 请求。
    ///
    /// # Arguments
    /// * `path`: 相对基础地址的路径。
    /// * `query`: 查询参数。
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, DownstreamError> {
        let req = self.http.get(self.url(path)).query(query);
        self.execute(path, req, BodyCheck::Strict).await
    }

    /// # Summary
    /// 以委托凭据发起 POST 请求，请求体按 JSON 编码。
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, DownstreamError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.http.post(self.url(path)).json(body);
        self.execute(path, req, BodyCheck::DenialOnly).await
    }

    /// # Summary
    /// 发送请求并把一切结果收敛为载荷或 `DownstreamError`。
    ///
    /// # Logic
    /// 1. 附加 Bearer 凭据并发送；传输失败 -> `Transport`。
    /// 2. 读取完整响应体；非 2xx 交给 `classify`。
    /// 3. 2xx 但带 `errorText`：读接口一律失败 (拒绝文案 -> `Unauthorized`，其余 -> `Upstream`)，
    ///    写接口只拦截拒绝文案。
    /// 4. 空响应体按 JSON `null` 解析；解析失败 -> `Decode`。
    async fn execute<T: DeserializeOwned>(
        &self,
        path: &str,
        req: RequestBuilder,
        check: BodyCheck,
    ) -> Result<T, DownstreamError> {
        let resp = req
            .bearer_auth(&self.credential.token)
            .send()
            .await
            .map_err(|e| {
                warn!("Downstream transport failure on {}: {}", path, e);
                DownstreamError::Transport(e.to_string())
            })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| DownstreamError::Transport(e.to_string()))?;

        if !status.is_success() {
            let err = classify(status.as_u16(), &body);
            debug!("Downstream {} returned {}: {}", path, status, err);
            return Err(err);
        }

        let rejected = match check {
            BodyCheck::Strict => rejection_in_success_body(status.as_u16(), &body),
            BodyCheck::DenialOnly => denial_in_success_body(&body),
        };
        if let Some(err) = rejected {
            debug!("Downstream {} rejected in body: {}", path, err);
            return Err(err);
        }

        let payload = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(payload).map_err(|e| DownstreamError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AutoLiqApi for AuthorizedClient {
    async fn owner_settings(
        &self,
        account_id: AccountId,
    ) -> Result<Option<RiskSettings>, DownstreamError> {
        self.get(OWNER_ITEM_PATH, &[("id", account_id.to_string())])
            .await
    }

    async fn permissioned_settings(
        &self,
        account_id: AccountId,
    ) -> Result<Option<RiskSettings>, DownstreamError> {
        self.get(PERMISSIONED_ITEM_PATH, &[("id", account_id.to_string())])
            .await
    }

    async fn update_settings(
        &self,
        account_id: AccountId,
        update: &RiskSettingsUpdate,
    ) -> Result<UpdateReply, DownstreamError> {
        let body = UpdateBody {
            account_id,
            fields: update,
        };
        // 下游偶尔返回空响应体，按 "未返回记录" 处理
        let reply: Option<UpdateReply> = self.post(UPDATE_PATH, &body).await?;
        Ok(reply.unwrap_or_default())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, DownstreamError> {
        let accounts: Option<Vec<Account>> = self.get(ACCOUNT_LIST_PATH, &[]).await?;
        Ok(accounts.unwrap_or_default())
    }
}
